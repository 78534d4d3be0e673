// ============================================================================
// framescope-core/src/frame.rs
// ============================================================================
//
// FRAME METRICS: Per-frame Blur, Exposure, Entropy and Motion
//
// A `Frame` owns one decoded color image and the metric values computed from
// it. All pixel work goes through an `ImageOps` backend; the histogram-based
// formulas are exposed as pure functions so they can be checked without any
// image at all.
//
// KEY COMPONENTS:
// - Frame: Decoded image plus its sequence number and metric values
// - BlurSample: (gradient variance, pixel variance) for one patch
// - exposure_from_histogram / entropy_from_histogram: Histogram heuristics
// - displacement_energy: Squared L2 norm of tracked point displacement
//
// Motion is the only metric that can fail softly: tracking errors are logged
// and the frame keeps whatever motion value it already had.

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};
use crate::geometry::{PatchGrid, Roi};
use crate::image_ops::{HsvChannel, ImageOps, Point2};

/// Sharpness measurement of one patch.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlurSample {
    /// Variance of the Laplacian-filtered patch; lower means blurrier
    pub gradient_variance: f64,
    /// Variance of the unfiltered patch, used as a contrast reference
    pub pixel_variance: f64,
}

/// One decoded frame and its metric values.
///
/// Placeholder frames carry no image and no sequence number; they pre-fill the
/// frame history so it always holds a fixed number of slots.
#[derive(Debug, Clone)]
pub struct Frame<I> {
    sequence: Option<u64>,
    image: Option<I>,
    blur_level: Vec<BlurSample>,
    exposure_level: f64,
    entropy_level: f64,
    motion: f64,
}

impl<I> Frame<I> {
    /// Empty slot with no image (sequence number -1).
    pub fn placeholder() -> Self {
        Self {
            sequence: None,
            image: None,
            blur_level: Vec::new(),
            exposure_level: 0.0,
            entropy_level: 0.0,
            motion: 0.0,
        }
    }

    /// Wraps a decoded image with its position in the stream.
    pub fn new(image: I, sequence: u64) -> Self {
        Self {
            sequence: Some(sequence),
            image: Some(image),
            ..Self::placeholder()
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.sequence.is_none()
    }

    /// Position of the frame in the stream, `None` for placeholders.
    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    /// Sequence counter with the conventional `-1` for placeholders.
    pub fn count(&self) -> i64 {
        self.sequence
            .and_then(|sequence| i64::try_from(sequence).ok())
            .unwrap_or(-1)
    }

    pub fn image(&self) -> Option<&I> {
        self.image.as_ref()
    }

    pub fn blur_level(&self) -> &[BlurSample] {
        &self.blur_level
    }

    pub fn exposure_level(&self) -> f64 {
        self.exposure_level
    }

    pub fn entropy_level(&self) -> f64 {
        self.entropy_level
    }

    pub fn motion(&self) -> f64 {
        self.motion
    }

    fn require_image(&self) -> CoreResult<&I> {
        self.image
            .as_ref()
            .ok_or_else(|| CoreError::Image("placeholder frame has no image".to_string()))
    }

    /// Measures sharpness of every patch of `grid` inside `roi`.
    ///
    /// Patches are visited row-major (y outer, x inner). Any previous blur
    /// values are replaced, so the result always holds one sample per patch.
    pub fn compute_blur<O>(&mut self, ops: &O, roi: &Roi, grid: &PatchGrid) -> CoreResult<()>
    where
        O: ImageOps<Image = I>,
    {
        let gray = ops.to_gray(self.require_image()?)?;
        let region = ops.crop(&gray, roi)?;

        let mut samples = Vec::with_capacity(grid.patch_count());
        for patch in grid.patches() {
            let tile = ops.crop(&region, &patch)?;
            let (_, pixel_std) = ops.mean_std_dev(&tile)?;
            let filtered = ops.laplacian(&tile)?;
            let (_, gradient_std) = ops.mean_std_dev(&filtered)?;
            samples.push(BlurSample {
                gradient_variance: gradient_std * gradient_std,
                pixel_variance: pixel_std * pixel_std,
            });
        }

        self.blur_level = samples;
        Ok(())
    }

    /// Histogram of one HSV channel with `bins` even bins over `[0, 256)`.
    pub fn compute_histogram<O>(&self, ops: &O, channel: HsvChannel, bins: usize) -> CoreResult<Vec<u32>>
    where
        O: ImageOps<Image = I>,
    {
        let planes = ops.hsv_planes(self.require_image()?)?;
        ops.histogram_even(&planes[channel.index()], bins, 0, 256)
    }

    /// Computes the exposure skew from a `bins`-bin histogram normalized by `area`.
    pub fn compute_exposure<O>(
        &mut self,
        ops: &O,
        channel: HsvChannel,
        bins: usize,
        area: f64,
    ) -> CoreResult<()>
    where
        O: ImageOps<Image = I>,
    {
        let histogram = self.compute_histogram(ops, channel, bins)?;
        self.exposure_level = exposure_from_histogram(&histogram, area);
        Ok(())
    }

    /// Computes the Shannon entropy of a `bins`-bin histogram normalized by `area`.
    pub fn compute_entropy<O>(
        &mut self,
        ops: &O,
        channel: HsvChannel,
        bins: usize,
        floor: f64,
        area: f64,
    ) -> CoreResult<()>
    where
        O: ImageOps<Image = I>,
    {
        let histogram = self.compute_histogram(ops, channel, bins)?;
        self.entropy_level = entropy_from_histogram(&histogram, area, floor);
        Ok(())
    }

    /// Estimates motion between `previous` and this frame.
    ///
    /// A placeholder predecessor yields 0. When detection or tracking fails
    /// the error is logged and the current motion value is kept as is.
    pub fn compute_motion<O>(&mut self, previous: &Frame<I>, ops: &O)
    where
        O: ImageOps<Image = I>,
    {
        if previous.is_placeholder() {
            self.motion = 0.0;
            return;
        }

        match self.tracked_energy(previous, ops) {
            Ok(energy) => self.motion = energy,
            Err(err) => log::error!(
                "Motion estimation failed for frame {}: {err}; keeping {}",
                self.count(),
                self.motion
            ),
        }
    }

    fn tracked_energy<O>(&self, previous: &Frame<I>, ops: &O) -> CoreResult<f64>
    where
        O: ImageOps<Image = I>,
    {
        let prev_gray = ops.to_gray(previous.require_image()?)?;
        let next_gray = ops.to_gray(self.require_image()?)?;

        let corners = ops.detect_corners(&prev_gray)?;
        let flow = ops.track_points(&prev_gray, &next_gray, &corners)?;
        displacement_energy(&corners, &flow.points)
    }
}

/// Exposure skew of a histogram normalized by `area`.
///
/// With `lo`, `hi` and `mid` the first, last and middle bins, the result is
/// `(hi - lo) * |1 - mid - min(lo, hi)|`. It lies in `[-1, 1]` when `area` is
/// the total pixel count; negative values mean dark pixels dominate.
pub fn exposure_from_histogram(histogram: &[u32], area: f64) -> f64 {
    let (Some(first), Some(last)) = (histogram.first(), histogram.last()) else {
        return 0.0;
    };
    if area <= 0.0 {
        return 0.0;
    }

    let lo = f64::from(*first) / area;
    let hi = f64::from(*last) / area;
    let mid = f64::from(histogram[(histogram.len() - 1) / 2]) / area;
    let min_of = lo.min(hi);

    (hi - lo) * (1.0 - mid - min_of).abs()
}

/// Shannon entropy (natural log) of a histogram normalized by `area`, with
/// `floor` added to every bin.
pub fn entropy_from_histogram(histogram: &[u32], area: f64, floor: f64) -> f64 {
    if area <= 0.0 {
        return 0.0;
    }

    // Folding from +0.0 keeps a zero entropy from printing as `-0`.
    histogram
        .iter()
        .map(|count| f64::from(*count) / area + floor)
        .filter(|p| *p > 0.0)
        .fold(0.0, |entropy, p| entropy - p * p.ln())
}

/// Squared L2 norm of the displacement between matching point sets.
pub fn displacement_energy(before: &[Point2], after: &[Point2]) -> CoreResult<f64> {
    if before.len() != after.len() {
        return Err(CoreError::Image(format!(
            "cannot compare {} tracked points with {} starting points",
            after.len(),
            before.len()
        )));
    }

    // An empty point set sums to +0.0, never `-0`.
    Ok(before
        .iter()
        .zip(after)
        .map(|(a, b)| {
            let dx = f64::from(b.x - a.x);
            let dy = f64::from(b.y - a.y);
            dx * dx + dy * dy
        })
        .fold(0.0, |energy, squared| energy + squared))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_identity() {
        let frame: Frame<()> = Frame::placeholder();
        assert!(frame.is_placeholder());
        assert_eq!(frame.count(), -1);
        assert!(frame.image().is_none());

        let frame = Frame::new((), 7);
        assert_eq!(frame.count(), 7);
        assert_eq!(frame.sequence(), Some(7));
    }

    #[test]
    fn test_exposure_formula() {
        // lo = 0.1, mid = 0.2, hi = 0.4
        let value = exposure_from_histogram(&[10, 10, 20, 20, 40], 100.0);
        assert!((value - 0.3 * 0.7).abs() < 1e-12);
        assert_eq!(exposure_from_histogram(&[], 100.0), 0.0);
    }

    #[test]
    fn test_entropy_single_bin_without_floor() {
        let single = entropy_from_histogram(&[100], 100.0, 0.0);
        assert_eq!(single.to_bits(), 0f64.to_bits());
        let uniform = entropy_from_histogram(&[25, 25, 25, 25], 100.0, 0.0);
        assert!((uniform - 4f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_displacement_energy() {
        let before = [Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)];
        let after = [Point2::new(3.0, 4.0), Point2::new(1.0, 2.0)];
        assert_eq!(displacement_energy(&before, &after).unwrap(), 26.0);
        assert!(displacement_energy(&before, &after[..1]).is_err());
        assert_eq!(displacement_energy(&[], &[]).unwrap().to_bits(), 0f64.to_bits());
    }
}
