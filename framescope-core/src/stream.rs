// ============================================================================
// framescope-core/src/stream.rs
// ============================================================================
//
// STREAM PROCESSING: Decode, Buffer, Measure, Emit
//
// The `StreamProcessor` drives one run over a video stream. For every index
// from 0 to the stream's frame count it pulls an image from the source, wraps
// it in a `Frame`, pushes it into the `FrameHistory`, computes the enabled
// metrics and forwards their values to the sinks.
//
// KEY COMPONENTS:
// - StreamProcessor: Geometry, history and metric dispatch for one run
// - ProcessingSummary: Counters describing how a run ended
//
// WORKFLOW:
// 1. Resolve the ROI and patch grid against the stream dimensions
// 2. Loop over frame indices; indices without a frame are skipped
// 3. Present each frame to the display sink when `show` is enabled
// 4. Finish all sinks, also when the run stops early
//
// Processing is strictly sequential. Every `ImageOps` call returns before the
// next one starts.

// ---- Standard library imports ----
use std::fmt;
use std::time::{Duration, Instant};

// ---- Internal crate imports ----
use crate::config::{AnalysisParams, Metric, StreamConfig};
use crate::error::{CoreError, CoreResult};
use crate::frame::Frame;
use crate::geometry::{PatchGrid, Roi, resolve_patch_grid, resolve_roi};
use crate::history::FrameHistory;
use crate::image_ops::ImageOps;
use crate::sink::{DisplayControl, DisplaySink, MetricSinks};
use crate::source::{FrameSource, StreamProperties};
use crate::utils::format_duration;

/// Callback receiving `(indices handled so far, total indices)`.
pub type ProgressCallback = Box<dyn FnMut(u64, u64)>;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessingSummary {
    /// Frames that were decoded and measured
    pub frames_processed: u64,
    /// Indices for which the source delivered no frame
    pub frames_skipped: u64,
    /// Whether the display sink stopped the run
    pub aborted: bool,
    /// Wall time of the run
    pub elapsed: Duration,
}

impl fmt::Display for ProcessingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames processed, {} skipped in {}{}",
            self.frames_processed,
            self.frames_skipped,
            format_duration(self.elapsed.as_secs_f64()),
            if self.aborted { " (aborted)" } else { "" }
        )
    }
}

/// Per-run orchestration of decoding, buffering and metric computation.
pub struct StreamProcessor<O: ImageOps> {
    config: StreamConfig,
    params: AnalysisParams,
    ops: O,
    properties: StreamProperties,
    roi: Roi,
    grid: PatchGrid,
    history: FrameHistory<O::Image>,
    progress: Option<ProgressCallback>,
}

impl<O: ImageOps> StreamProcessor<O> {
    /// Validates the parameters and resolves the geometry for a stream with
    /// the given properties.
    ///
    /// # Arguments
    ///
    /// * `config` - What to measure, including the raw ROI and patch grid
    /// * `params` - Numeric tunables (history size, bin counts, entropy floor)
    /// * `ops` - Backend for the image primitives
    /// * `properties` - Dimensions and frame count of the stream to process
    ///
    /// # Returns
    ///
    /// * `Err(CoreError::Geometry)` - If the ROI or patch grid cannot be applied
    /// * `Err(CoreError::Config)` - If the parameters are out of range
    pub fn new(
        config: StreamConfig,
        params: AnalysisParams,
        ops: O,
        properties: StreamProperties,
    ) -> CoreResult<Self> {
        params.validate()?;

        if properties.width == 0 || properties.height == 0 {
            return Err(CoreError::Config(format!(
                "stream has no pixels ({}x{})",
                properties.width, properties.height
            )));
        }

        let roi = resolve_roi(config.blur_roi, properties.width, properties.height)?;
        let grid = resolve_patch_grid(config.patch_grid, &roi, &params.patch_reject_values)?;
        let history = FrameHistory::new(params.batch_size)?;

        log::debug!(
            "Stream {}x{}, {} frames; ROI {roi}, patch grid {grid}, metrics {:?}",
            properties.width,
            properties.height,
            properties.total_frames,
            config.metrics.enabled()
        );

        Ok(Self {
            config,
            params,
            ops,
            properties,
            roi,
            grid,
            history,
            progress: None,
        })
    }

    /// Registers a callback invoked once per frame index.
    pub fn with_progress(mut self, callback: impl FnMut(u64, u64) + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn roi(&self) -> &Roi {
        &self.roi
    }

    pub fn patch_grid(&self) -> &PatchGrid {
        &self.grid
    }

    pub fn properties(&self) -> &StreamProperties {
        &self.properties
    }

    pub fn history(&self) -> &FrameHistory<O::Image> {
        &self.history
    }

    /// Processes every frame index of the stream.
    ///
    /// Sinks are finished before returning, whether the loop completed, was
    /// aborted by the display, or stopped on an error.
    pub fn run<S, D>(
        &mut self,
        source: &mut S,
        sinks: &mut MetricSinks,
        display: &mut D,
    ) -> CoreResult<ProcessingSummary>
    where
        S: FrameSource<Image = O::Image>,
        D: DisplaySink<O::Image> + ?Sized,
    {
        let start = Instant::now();
        log::info!("Processing {} frames", self.properties.total_frames);

        let mut summary = ProcessingSummary::default();
        let outcome = self.process_frames(source, sinks, display, &mut summary);
        let finished = sinks.finish_all();
        summary.elapsed = start.elapsed();

        outcome?;
        finished?;

        log::info!("Done: {summary}");
        Ok(summary)
    }

    fn process_frames<S, D>(
        &mut self,
        source: &mut S,
        sinks: &mut MetricSinks,
        display: &mut D,
        summary: &mut ProcessingSummary,
    ) -> CoreResult<()>
    where
        S: FrameSource<Image = O::Image>,
        D: DisplaySink<O::Image> + ?Sized,
    {
        let total = self.properties.total_frames;

        for count in 0..total {
            let Some(image) = source.next_frame()? else {
                log::debug!("No frame delivered for index {count}, skipping");
                summary.frames_skipped += 1;
                self.report_progress(count + 1, total);
                continue;
            };

            let (width, height) = self.ops.dimensions(&image);
            if (width, height) != (self.properties.width, self.properties.height) {
                return Err(CoreError::Decode(format!(
                    "frame {count} is {width}x{height}, expected {}x{}",
                    self.properties.width, self.properties.height
                )));
            }
            let area = f64::from(width) * f64::from(height);

            self.history.push(Frame::new(image, count));
            self.compute_metrics(count, area, sinks)?;
            summary.frames_processed += 1;

            if self.config.show && self.present_latest(count, display)? == DisplayControl::Abort {
                log::info!("Display requested abort after frame {count}");
                summary.aborted = true;
                self.report_progress(count + 1, total);
                break;
            }

            self.report_progress(count + 1, total);
        }

        Ok(())
    }

    /// Runs every enabled metric on the latest frame and emits the values.
    fn compute_metrics(&mut self, count: u64, area: f64, sinks: &mut MetricSinks) -> CoreResult<()> {
        let metrics = self.config.metrics;
        let (previous, frame) = self
            .history
            .previous_and_latest_mut()
            .ok_or_else(|| CoreError::Config("frame history is too short".to_string()))?;

        if metrics.blur {
            frame.compute_blur(&self.ops, &self.roi, &self.grid)?;
            let values: Vec<f64> = frame
                .blur_level()
                .iter()
                .flat_map(|sample| [sample.gradient_variance, sample.pixel_variance])
                .collect();
            sinks.append(Metric::Blur, count, &values)?;
        }

        if metrics.exposure {
            frame.compute_exposure(
                &self.ops,
                self.params.histogram_channel,
                self.params.exposure_bins,
                area,
            )?;
            sinks.append(Metric::Exposure, count, &[frame.exposure_level()])?;
        }

        if metrics.entropy {
            frame.compute_entropy(
                &self.ops,
                self.params.histogram_channel,
                self.params.entropy_bins,
                self.params.entropy_floor,
                area,
            )?;
            sinks.append(Metric::Entropy, count, &[frame.entropy_level()])?;
        }

        if metrics.motion {
            frame.compute_motion(previous, &self.ops);
            sinks.append(Metric::Motion, count, &[frame.motion()])?;
        }

        Ok(())
    }

    fn present_latest<D>(&self, count: u64, display: &mut D) -> CoreResult<DisplayControl>
    where
        D: DisplaySink<O::Image> + ?Sized,
    {
        match self.history.latest().and_then(Frame::image) {
            Some(image) => display.present(count, image),
            None => Ok(DisplayControl::Continue),
        }
    }

    fn report_progress(&mut self, done: u64, total: u64) {
        if let Some(callback) = self.progress.as_mut() {
            callback(done, total);
        }
    }
}
