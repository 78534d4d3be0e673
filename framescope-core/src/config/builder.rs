// ============================================================================
// framescope-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for StreamConfig
//
// This module implements the builder pattern for the StreamConfig structure,
// providing a fluent API for library consumers that do not go through a JSON
// settings document.
//
// KEY COMPONENTS:
// - StreamConfigBuilder: Builder struct for creating StreamConfig instances
// - Defaults matching a settings document with only `video_path` set

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::{MetricSelection, NO_PATCH_GRID, NO_ROI, StreamConfig};
use crate::error::{CoreError, CoreResult};

/// Builder for creating StreamConfig instances.
///
/// All metrics start disabled, no ROI is applied and the patch grid is a
/// single patch. Only the video path is required.
///
/// # Examples
///
/// ```rust
/// use framescope_core::config::StreamConfigBuilder;
///
/// let config = StreamConfigBuilder::new()
///     .video_path("clip.mp4")
///     .entropy(true)
///     .build()
///     .unwrap();
/// assert!(config.metrics.entropy);
/// assert!(!config.metrics.blur);
/// ```
#[derive(Debug, Clone)]
pub struct StreamConfigBuilder {
    // Required fields
    video_path: Option<PathBuf>,

    // Optional fields with defaults
    metrics: MetricSelection,
    debug: bool,
    show: bool,
    blur_roi: [i32; 4],
    patch_grid: [i32; 2],
}

impl Default for StreamConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamConfigBuilder {
    /// Creates a new StreamConfigBuilder with default values.
    pub fn new() -> Self {
        Self {
            video_path: None,
            metrics: MetricSelection::default(),
            debug: false,
            show: false,
            blur_roi: NO_ROI,
            patch_grid: NO_PATCH_GRID,
        }
    }

    /// Sets the video file to analyse.
    ///
    /// # Arguments
    ///
    /// * `video_path` - Path of the input video
    ///
    /// # Returns
    ///
    /// * Self for method chaining
    pub fn video_path(mut self, video_path: impl Into<PathBuf>) -> Self {
        self.video_path = Some(video_path.into());
        self
    }

    /// Replaces the whole metric selection.
    pub fn metrics(mut self, metrics: MetricSelection) -> Self {
        self.metrics = metrics;
        self
    }

    /// Enables or disables the blur metric.
    pub fn blur(mut self, enabled: bool) -> Self {
        self.metrics.blur = enabled;
        self
    }

    /// Enables or disables the exposure metric.
    pub fn exposure(mut self, enabled: bool) -> Self {
        self.metrics.exposure = enabled;
        self
    }

    /// Enables or disables the entropy metric.
    pub fn entropy(mut self, enabled: bool) -> Self {
        self.metrics.entropy = enabled;
        self
    }

    /// Enables or disables the motion metric.
    pub fn motion(mut self, enabled: bool) -> Self {
        self.metrics.motion = enabled;
        self
    }

    /// Enables debug diagnostics.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Enables presenting decoded frames to the display sink.
    pub fn show(mut self, enabled: bool) -> Self {
        self.show = enabled;
        self
    }

    /// Sets the raw ROI.
    ///
    /// # Arguments
    ///
    /// * `roi` - `[x, y, width, height]`; four equal values disable the ROI
    ///
    /// # Returns
    ///
    /// * Self for method chaining
    pub fn blur_roi(mut self, roi: [i32; 4]) -> Self {
        self.blur_roi = roi;
        self
    }

    /// Sets the raw patch grid as `[count_x, count_y]`.
    pub fn patch_grid(mut self, grid: [i32; 2]) -> Self {
        self.patch_grid = grid;
        self
    }

    /// Builds the StreamConfig.
    ///
    /// # Returns
    ///
    /// * `Ok(StreamConfig)` - When a video path was provided
    /// * `Err(CoreError::Config)` - When the video path is missing
    pub fn build(self) -> CoreResult<StreamConfig> {
        let video_path = self
            .video_path
            .ok_or_else(|| CoreError::Config("video_path is required".to_string()))?;

        Ok(StreamConfig {
            video_path,
            metrics: self.metrics,
            debug: self.debug,
            show: self.show,
            blur_roi: self.blur_roi,
            patch_grid: self.patch_grid,
        })
    }
}
