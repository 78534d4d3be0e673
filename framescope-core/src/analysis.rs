//! One-call analysis of a video file.
//!
//! Wires the default collaborators together: ffmpeg decoding, the software
//! image backend, CSV sinks in the video's meta directory and, when `show` is
//! set, a scaled PNG preview next to them.

use std::path::{Path, PathBuf};

use crate::config::{AnalysisParams, StreamConfig};
use crate::error::CoreResult;
use crate::geometry::{PatchGrid, Roi};
use crate::image_ops::SoftwareOps;
use crate::sink::{NullDisplay, PreviewWriter, csv_sinks};
use crate::source::{FfmpegSource, FrameSource, StreamProperties};
use crate::stream::{ProcessingSummary, ProgressCallback, StreamProcessor};
use crate::utils::meta_dir_for;

/// File name of the preview image inside the meta directory.
pub const PREVIEW_FILE_NAME: &str = "preview.png";

/// Everything a finished analysis reports back.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Directory holding the CSV files
    pub meta_dir: PathBuf,
    /// Properties of the decoded stream
    pub properties: StreamProperties,
    /// Resolved region of interest
    pub roi: Roi,
    /// Resolved patch grid
    pub patch_grid: PatchGrid,
    pub summary: ProcessingSummary,
}

/// Directory the metric files of `video_path` are written to.
///
/// By default this is `<video dir>/<video stem>_meta`; with `output_dir` the
/// `<video stem>_meta` directory is created there instead.
pub fn output_meta_dir(video_path: &Path, output_dir: Option<&Path>) -> CoreResult<PathBuf> {
    let meta_dir = meta_dir_for(video_path)?;
    Ok(match (output_dir, meta_dir.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => meta_dir,
    })
}

/// Decodes `config.video_path` and writes one CSV per enabled metric.
///
/// # Arguments
///
/// * `config` - Run configuration, usually loaded from a settings file
/// * `params` - Numeric tunables of the metric engine
/// * `output_dir` - Optional parent for the meta directory
/// * `progress` - Optional callback invoked once per frame index
pub fn analyze_video(
    config: StreamConfig,
    params: AnalysisParams,
    output_dir: Option<&Path>,
    progress: Option<ProgressCallback>,
) -> CoreResult<AnalysisReport> {
    let meta_dir = output_meta_dir(&config.video_path, output_dir)?;
    let mut source = FfmpegSource::open(&config.video_path)?;
    let properties = source.properties();

    let metrics = config.metrics;
    let show = config.show;
    let preview_height = params.preview_height;

    let mut processor = StreamProcessor::new(config, params, SoftwareOps::new(), properties)?;
    if let Some(callback) = progress {
        processor = processor.with_progress(callback);
    }

    let mut sinks = csv_sinks(&meta_dir, &metrics, processor.patch_grid())?;
    log::info!("Writing metrics to {}", meta_dir.display());

    let summary = if show {
        // Refresh the preview about once per second of video.
        let interval = properties.fps.round().max(1.0) as u64;
        let mut preview =
            PreviewWriter::new(meta_dir.join(PREVIEW_FILE_NAME), preview_height).every(interval);
        processor.run(&mut source, &mut sinks, &mut preview)?
    } else {
        processor.run(&mut source, &mut sinks, &mut NullDisplay)?
    };

    Ok(AnalysisReport {
        meta_dir,
        properties,
        roi: *processor.roi(),
        patch_grid: *processor.patch_grid(),
        summary,
    })
}
