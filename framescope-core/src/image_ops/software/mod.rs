// ============================================================================
// framescope-core/src/image_ops/software/mod.rs
// ============================================================================
//
// SOFTWARE BACKEND: Host-memory Implementation of ImageOps
//
// This module implements every image primitive of the metric engine on plain
// `image` buffers. It follows the 8-bit conventions of common vision
// libraries so metric values are comparable across backends:
//
// - Intensity uses the fixed-point BT.601 weights (4899, 9617, 1868) >> 14
// - HSV uses H in [0, 180), S and V in [0, 255]
// - The Laplacian is the 3x3 aperture kernel [2 0 2; 0 -8 0; 2 0 2] with
//   saturated 8-bit output and reflect-101 borders
//
// KEY COMPONENTS:
// - SoftwareOps: ImageOps implementation over RgbaImage / GrayImage
// - corners: Shi-Tomasi corner detection
// - flow: Pyramidal Lucas-Kanade sparse optical flow
//
// Row-wise kernels run on the rayon pool; every call still returns only after
// the whole image has been processed.

mod corners;
mod flow;

// ---- External crate imports ----
use image::{GrayImage, RgbImage, RgbaImage};
use rayon::prelude::*;

// ---- Internal crate imports ----
use super::{FlowResult, ImageOps, Point2};
use crate::error::{CoreError, CoreResult};
use crate::geometry::Roi;

pub use corners::CornerParams;
pub use flow::FlowParams;

/// Fixed-point intensity weights (sum = 1 << 14).
const R2Y: u32 = 4899;
const G2Y: u32 = 9617;
const B2Y: u32 = 1868;
const GRAY_SHIFT: u32 = 14;

/// Fixed-point precision of the HSV division tables.
const HSV_SHIFT: i32 = 12;

/// Host-memory implementation of [`ImageOps`].
#[derive(Debug, Clone, Default)]
pub struct SoftwareOps {
    /// Corner detector settings used by `detect_corners`
    pub corners: CornerParams,
    /// Tracker settings used by `track_points`
    pub flow: FlowParams,
}

impl SoftwareOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_corner_params(mut self, corners: CornerParams) -> Self {
        self.corners = corners;
        self
    }

    pub fn with_flow_params(mut self, flow: FlowParams) -> Self {
        self.flow = flow;
        self
    }
}

/// Maps an out-of-range index back into `0..len` by mirroring around the edge
/// pixel without repeating it (`gfedcb|abcdefgh|gfedcba`).
pub(crate) fn reflect101(index: i64, len: usize) -> usize {
    let len = len as i64;
    if len == 1 {
        return 0;
    }
    let mut index = index;
    loop {
        if index < 0 {
            index = -index;
        } else if index >= len {
            index = 2 * len - 2 - index;
        } else {
            return index as usize;
        }
    }
}

fn ensure_not_empty(width: u32, height: u32, what: &str) -> CoreResult<()> {
    if width == 0 || height == 0 {
        return Err(CoreError::Image(format!("{what} on an empty image")));
    }
    Ok(())
}

fn gray_from_raw(width: u32, height: u32, data: Vec<u8>) -> CoreResult<GrayImage> {
    GrayImage::from_raw(width, height, data)
        .ok_or_else(|| CoreError::Image(format!("buffer does not match {width}x{height}")))
}

/// Drops the alpha channel; HSV conversion starts from three channels.
fn drop_alpha(image: &RgbaImage) -> CoreResult<RgbImage> {
    let (width, height) = image.dimensions();
    let data: Vec<u8> = image
        .as_raw()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    RgbImage::from_raw(width, height, data)
        .ok_or_else(|| CoreError::Image(format!("buffer does not match {width}x{height}")))
}

/// Converts one RGB pixel to 8-bit `(h, s, v)`.
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let v = r.max(g).max(b);
    let diff = v - r.min(g).min(b);

    let round = 1 << (HSV_SHIFT - 1);

    let s = if v == 0 {
        0
    } else {
        let sdiv = ((255 << HSV_SHIFT) as f64 / f64::from(v)).round() as i32;
        (diff * sdiv + round) >> HSV_SHIFT
    };

    let h = if diff == 0 {
        0
    } else {
        let raw = if v == r {
            g - b
        } else if v == g {
            b - r + 2 * diff
        } else {
            r - g + 4 * diff
        };
        let hdiv = ((180 << HSV_SHIFT) as f64 / (6.0 * f64::from(diff))).round() as i32;
        let mut h = (raw * hdiv + round) >> HSV_SHIFT;
        if h < 0 {
            h += 180;
        }
        h
    };

    (h.clamp(0, 179) as u8, s.clamp(0, 255) as u8, v as u8)
}

impl ImageOps for SoftwareOps {
    type Image = RgbaImage;
    type Gray = GrayImage;

    fn dimensions(&self, image: &RgbaImage) -> (u32, u32) {
        image.dimensions()
    }

    fn to_gray(&self, image: &RgbaImage) -> CoreResult<GrayImage> {
        let (width, height) = image.dimensions();
        ensure_not_empty(width, height, "grayscale conversion")?;

        let row_len = width as usize;
        let mut data = vec![0u8; row_len * height as usize];
        data.par_chunks_mut(row_len)
            .zip(image.as_raw().par_chunks(row_len * 4))
            .for_each(|(dst, src)| {
                for (out, px) in dst.iter_mut().zip(src.chunks_exact(4)) {
                    let weighted = u32::from(px[0]) * R2Y
                        + u32::from(px[1]) * G2Y
                        + u32::from(px[2]) * B2Y;
                    *out = ((weighted + (1 << (GRAY_SHIFT - 1))) >> GRAY_SHIFT) as u8;
                }
            });

        gray_from_raw(width, height, data)
    }

    fn crop(&self, gray: &GrayImage, rect: &Roi) -> CoreResult<GrayImage> {
        let (width, height) = gray.dimensions();
        if rect.width == 0 || rect.height == 0 || !rect.fits_within(width, height) {
            return Err(CoreError::Image(format!(
                "crop {rect} outside of {width}x{height} image"
            )));
        }

        let src = gray.as_raw();
        let mut data = Vec::with_capacity(rect.area() as usize);
        for row in rect.y..rect.y + rect.height {
            let start = row as usize * width as usize + rect.x as usize;
            data.extend_from_slice(&src[start..start + rect.width as usize]);
        }

        gray_from_raw(rect.width, rect.height, data)
    }

    fn mean_std_dev(&self, gray: &GrayImage) -> CoreResult<(f64, f64)> {
        let (width, height) = gray.dimensions();
        ensure_not_empty(width, height, "mean/std-dev")?;

        let (sum, sum_sq) = gray
            .as_raw()
            .iter()
            .fold((0u64, 0u64), |(sum, sum_sq), px| {
                let value = u64::from(*px);
                (sum + value, sum_sq + value * value)
            });

        let count = (u64::from(width) * u64::from(height)) as f64;
        let mean = sum as f64 / count;
        let variance = (sum_sq as f64 / count - mean * mean).max(0.0);
        Ok((mean, variance.sqrt()))
    }

    fn laplacian(&self, gray: &GrayImage) -> CoreResult<GrayImage> {
        let (width, height) = gray.dimensions();
        ensure_not_empty(width, height, "Laplacian filter")?;

        let (w, h) = (width as usize, height as usize);
        let src = gray.as_raw();
        let at = |x: i64, y: i64| -> i32 { i32::from(src[reflect101(y, h) * w + reflect101(x, w)]) };

        let mut data = vec![0u8; w * h];
        data.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
            let y = y as i64;
            for (x, out) in row.iter_mut().enumerate() {
                let x = x as i64;
                let corners = at(x - 1, y - 1) + at(x + 1, y - 1) + at(x - 1, y + 1) + at(x + 1, y + 1);
                let response = 2 * corners - 8 * at(x, y);
                *out = response.clamp(0, 255) as u8;
            }
        });

        gray_from_raw(width, height, data)
    }

    fn hsv_planes(&self, image: &RgbaImage) -> CoreResult<[GrayImage; 3]> {
        let (width, height) = image.dimensions();
        ensure_not_empty(width, height, "HSV conversion")?;

        let rgb = drop_alpha(image)?;
        let pixel_count = width as usize * height as usize;
        let mut hue = Vec::with_capacity(pixel_count);
        let mut saturation = Vec::with_capacity(pixel_count);
        let mut value = Vec::with_capacity(pixel_count);

        for px in rgb.as_raw().chunks_exact(3) {
            let (h, s, v) = rgb_to_hsv(px[0], px[1], px[2]);
            hue.push(h);
            saturation.push(s);
            value.push(v);
        }

        Ok([
            gray_from_raw(width, height, hue)?,
            gray_from_raw(width, height, saturation)?,
            gray_from_raw(width, height, value)?,
        ])
    }

    fn histogram_even(
        &self,
        plane: &GrayImage,
        bins: usize,
        lower: u32,
        upper: u32,
    ) -> CoreResult<Vec<u32>> {
        if bins == 0 || upper <= lower {
            return Err(CoreError::Image(format!(
                "invalid histogram: {bins} bins over [{lower}, {upper})"
            )));
        }

        let span = u64::from(upper - lower);
        let mut histogram = vec![0u32; bins];
        for px in plane.as_raw() {
            let value = u32::from(*px);
            if value < lower || value >= upper {
                continue;
            }
            let bin = (u64::from(value - lower) * bins as u64 / span) as usize;
            histogram[bin] += 1;
        }
        Ok(histogram)
    }

    fn detect_corners(&self, gray: &GrayImage) -> CoreResult<Vec<Point2>> {
        let (width, height) = gray.dimensions();
        ensure_not_empty(width, height, "corner detection")?;
        Ok(corners::good_features_to_track(gray, &self.corners))
    }

    fn track_points(
        &self,
        prev: &GrayImage,
        next: &GrayImage,
        points: &[Point2],
    ) -> CoreResult<FlowResult> {
        if prev.dimensions() != next.dimensions() {
            return Err(CoreError::Image(format!(
                "optical flow between {:?} and {:?} images",
                prev.dimensions(),
                next.dimensions()
            )));
        }
        let (width, height) = prev.dimensions();
        ensure_not_empty(width, height, "optical flow")?;
        Ok(flow::track(prev, next, points, &self.flow))
    }
}
