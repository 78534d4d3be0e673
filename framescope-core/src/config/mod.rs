//! Configuration structures and constants for the framescope-core library.
//!
//! `StreamConfig` describes one run: which video to read, which metrics to
//! compute, and the raw ROI / patch grid arrays exactly as the user wrote them.
//! `AnalysisParams` carries the numeric tunables of the metric engine so they
//! are passed explicitly into the components instead of living in globals.

mod builder;
mod settings;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::image_ops::HsvChannel;

pub use builder::StreamConfigBuilder;
pub use settings::{load_settings, parse_settings};

// Default constants

/// Number of frames kept in the sliding history.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Histogram bins used by the exposure metric.
pub const MIN_BIN_NUMBER: usize = 5;

/// Histogram bins used by the entropy metric (one bin per 8-bit level).
pub const MAX_BIN_NUMBER: usize = 256;

/// Additive floor applied to every normalized histogram bin before `ln`.
pub const DEFAULT_ENTROPY_FLOOR: f64 = 1e-4;

/// Patch grid requests made of one of these values on both axes mean "no grid".
pub const DEFAULT_PATCH_REJECT_VALUES: [i32; 2] = [0, 1];

/// Height in pixels of the scaled preview image.
pub const DEFAULT_PREVIEW_HEIGHT: u32 = 360;

/// Raw ROI used when the settings do not provide one (all equal, so no ROI).
pub const NO_ROI: [i32; 4] = [-1, -1, -1, -1];

/// Raw patch grid used when the settings do not provide one (single patch).
pub const NO_PATCH_GRID: [i32; 2] = [-1, -1];

/// One of the four per-frame metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Blur,
    Exposure,
    Entropy,
    Motion,
}

impl Metric {
    /// All metrics in output order.
    pub const ALL: [Metric; 4] = [Metric::Blur, Metric::Exposure, Metric::Entropy, Metric::Motion];

    /// Name used for the CSV file and the value column.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Blur => "blur",
            Metric::Exposure => "exposure",
            Metric::Entropy => "entropy",
            Metric::Motion => "motion",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Independent on/off switches for each metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricSelection {
    pub blur: bool,
    pub exposure: bool,
    pub entropy: bool,
    pub motion: bool,
}

impl MetricSelection {
    /// Every metric enabled.
    pub fn all() -> Self {
        Self {
            blur: true,
            exposure: true,
            entropy: true,
            motion: true,
        }
    }

    pub fn is_enabled(&self, metric: Metric) -> bool {
        match metric {
            Metric::Blur => self.blur,
            Metric::Exposure => self.exposure,
            Metric::Entropy => self.entropy,
            Metric::Motion => self.motion,
        }
    }

    /// Enabled metrics in output order.
    pub fn enabled(&self) -> Vec<Metric> {
        Metric::ALL
            .into_iter()
            .filter(|metric| self.is_enabled(*metric))
            .collect()
    }

    pub fn any(&self) -> bool {
        self.blur || self.exposure || self.entropy || self.motion
    }
}

/// Configuration for one stream processing run.
///
/// Created once per run, either from a settings document
/// ([`StreamConfig::from_settings_file`]) or with [`StreamConfigBuilder`],
/// and passed by value into the stream processor.
///
/// # Examples
///
/// ```rust
/// use framescope_core::config::StreamConfigBuilder;
///
/// let config = StreamConfigBuilder::new()
///     .video_path("/videos/clip.mp4")
///     .blur(true)
///     .motion(true)
///     .blur_roi([0, 0, 640, 360])
///     .patch_grid([4, 3])
///     .build()
///     .unwrap();
/// assert!(config.metrics.blur);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Video file to analyse
    pub video_path: PathBuf,

    /// Which metrics to compute
    pub metrics: MetricSelection,

    /// Emit debug diagnostics (geometry, stream properties)
    pub debug: bool,

    /// Present every decoded frame to the display sink
    pub show: bool,

    /// Raw ROI as `[x, y, width, height]`; four equal values mean "no ROI"
    pub blur_roi: [i32; 4],

    /// Raw patch grid as `[count_x, count_y]`
    pub patch_grid: [i32; 2],
}

impl StreamConfig {
    /// Loads and validates a JSON settings document.
    pub fn from_settings_file(path: &Path) -> CoreResult<Self> {
        load_settings(path)
    }
}

/// Numeric tunables of the metric engine.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisParams {
    /// Capacity of the frame history
    pub batch_size: usize,

    /// Histogram bins for the exposure metric
    pub exposure_bins: usize,

    /// Histogram bins for the entropy metric
    pub entropy_bins: usize,

    /// HSV channel the exposure and entropy histograms are built on
    pub histogram_channel: HsvChannel,

    /// Floor added to each normalized entropy bin
    pub entropy_floor: f64,

    /// Values that, requested on both grid axes, collapse the grid to one patch
    pub patch_reject_values: Vec<i32>,

    /// Height of the scaled preview written when `show` is enabled
    pub preview_height: u32,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            exposure_bins: MIN_BIN_NUMBER,
            entropy_bins: MAX_BIN_NUMBER,
            histogram_channel: HsvChannel::Value,
            entropy_floor: DEFAULT_ENTROPY_FLOOR,
            patch_reject_values: DEFAULT_PATCH_REJECT_VALUES.to_vec(),
            preview_height: DEFAULT_PREVIEW_HEIGHT,
        }
    }
}

impl AnalysisParams {
    /// Rejects parameter combinations the engine cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.batch_size < 2 {
            return Err(CoreError::Config(format!(
                "batch size must be at least 2 to compare consecutive frames, got {}",
                self.batch_size
            )));
        }
        if self.exposure_bins == 0 || self.entropy_bins == 0 {
            return Err(CoreError::Config(
                "histogram bin counts must be positive".to_string(),
            ));
        }
        if !(self.entropy_floor > 0.0 && self.entropy_floor.is_finite()) {
            return Err(CoreError::Config(format!(
                "entropy floor must be a positive finite number, got {}",
                self.entropy_floor
            )));
        }
        if self.preview_height == 0 {
            return Err(CoreError::Config("preview height must be positive".to_string()));
        }
        Ok(())
    }
}
