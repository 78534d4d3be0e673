//! Core library for per-frame video quality metrics.
//!
//! This crate decodes a video stream frame by frame and computes, for every
//! frame, the sharpness of a grid of patches (blur), the brightness skew of
//! its histogram (exposure), the Shannon entropy of its value channel and the
//! motion relative to the previous frame. Each requested metric is written as
//! its own time series.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use framescope_core::{AnalysisParams, StreamConfig, analyze_video};
//! use std::path::Path;
//!
//! let config = StreamConfig::from_settings_file(Path::new("settings.json")).unwrap();
//! let report = analyze_video(config, AnalysisParams::default(), None, None).unwrap();
//! println!("metrics written to {}", report.meta_dir.display());
//! ```
//!
//! Library consumers that bring their own decoder or output can drive
//! [`StreamProcessor`] directly with any [`FrameSource`], [`MetricSink`] and
//! [`ImageOps`] implementation.

pub mod analysis;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod history;
pub mod image_ops;
pub mod sink;
pub mod source;
pub mod stream;
pub mod utils;

// Re-exports for public API
pub use analysis::{AnalysisReport, analyze_video, output_meta_dir};
pub use config::{AnalysisParams, Metric, MetricSelection, StreamConfig, StreamConfigBuilder};
pub use error::{CoreError, CoreResult};
pub use frame::{BlurSample, Frame};
pub use geometry::{PatchGrid, Roi, resolve_patch_grid, resolve_roi};
pub use history::FrameHistory;
pub use image_ops::{HsvChannel, ImageOps, SoftwareOps};
pub use sink::{
    CsvSink, DisplayControl, DisplaySink, MemorySink, MetricSink, MetricSinks, NullDisplay,
    PreviewWriter,
};
pub use source::{FfmpegSource, FrameSource, MemorySource, StreamProperties, probe_stream};
pub use stream::{ProcessingSummary, StreamProcessor};
pub use utils::format_duration;
