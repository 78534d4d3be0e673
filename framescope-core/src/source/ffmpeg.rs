// ============================================================================
// framescope-core/src/source/ffmpeg.rs
// ============================================================================
//
// FFMPEG SOURCE: Decoding Video Files Through an ffmpeg Child Process
//
// Stream properties come from ffprobe (via the `ffprobe` crate). Frames are
// decoded by an ffmpeg child process spawned with `ffmpeg-sidecar`, writing
// raw RGBA frames to stdout, which the sidecar iterator turns into events.
//
// KEY COMPONENTS:
// - probe_stream: Width, height, frame rate, frame count and duration
// - FfmpegSource: FrameSource yielding `RgbaImage`s
//
// The child process is killed and reaped when the source is dropped, so an
// aborted run never leaves a decoder behind.

// ---- External crate imports ----
use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use ffmpeg_sidecar::iter::FfmpegIterator;
use ffprobe::{FfProbeError, ffprobe};
use image::RgbaImage;

// ---- Standard library imports ----
use std::path::Path;

// ---- Internal crate imports ----
use super::{FrameSource, StreamProperties};
use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};

/// Parses a frame rate string such as `"30000/1001"` or `"29.97"`.
pub fn parse_frame_rate(frame_rate: &str) -> Option<f64> {
    let rate = match frame_rate.split_once('/') {
        Some((numerator, denominator)) => {
            let numerator: f64 = numerator.trim().parse().ok()?;
            let denominator: f64 = denominator.trim().parse().ok()?;
            if denominator == 0.0 {
                return None;
            }
            numerator / denominator
        }
        None => frame_rate.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

fn parse_positive(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|text| text.parse::<f64>().ok())
        .filter(|parsed| parsed.is_finite() && *parsed > 0.0)
}

/// Reads the properties of the first video stream of `input_path`.
///
/// The frame count is taken from `nb_frames` when the container provides it,
/// otherwise it is estimated as duration times frame rate.
pub fn probe_stream(input_path: &Path) -> CoreResult<StreamProperties> {
    log::debug!("Running ffprobe for stream properties on: {}", input_path.display());

    let metadata = ffprobe(input_path).map_err(|err| {
        log::error!("ffprobe failed on {}: {err:?}", input_path.display());
        map_ffprobe_error(err)
    })?;

    let video_stream = metadata
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            CoreError::FfprobeParse(format!("No video stream found in {}", input_path.display()))
        })?;

    let (width, height) = match (video_stream.width, video_stream.height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => (width as u32, height as u32),
        (width, height) => {
            return Err(CoreError::FfprobeParse(format!(
                "Invalid dimensions in {}: width={width:?}, height={height:?}",
                input_path.display()
            )));
        }
    };

    let fps = parse_frame_rate(&video_stream.r_frame_rate)
        .or_else(|| parse_frame_rate(&video_stream.avg_frame_rate))
        .unwrap_or(0.0);

    let duration = parse_positive(video_stream.duration.as_deref())
        .or_else(|| parse_positive(metadata.format.duration.as_deref()))
        .unwrap_or(0.0);

    let total_frames = match video_stream
        .nb_frames
        .as_deref()
        .and_then(|frames| frames.parse::<u64>().ok())
        .filter(|frames| *frames > 0)
    {
        Some(frames) => frames,
        None if duration > 0.0 && fps > 0.0 => {
            let estimate = (duration * fps).round() as u64;
            log::debug!("nb_frames unavailable, estimated {estimate} frames from {duration}s at {fps} fps");
            estimate
        }
        None => {
            return Err(CoreError::FfprobeParse(format!(
                "Cannot determine the frame count of {}",
                input_path.display()
            )));
        }
    };

    Ok(StreamProperties {
        width,
        height,
        fps,
        total_frames,
        duration,
    })
}

fn map_ffprobe_error(err: FfProbeError) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => command_start_error("ffprobe", io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            command_failed_error("ffprobe", output.status, stderr)
        }
        FfProbeError::Deserialize(err) => {
            CoreError::FfprobeParse(format!("ffprobe output deserialization: {err}"))
        }
        _ => CoreError::FfprobeParse(format!("Unknown ffprobe error: {err:?}")),
    }
}

/// Decodes a video file into RGBA frames with an ffmpeg child process.
pub struct FfmpegSource {
    child: FfmpegChild,
    events: FfmpegIterator,
    properties: StreamProperties,
    stderr: String,
    finished: bool,
}

impl FfmpegSource {
    /// Probes `input_path` and starts decoding it.
    pub fn open(input_path: &Path) -> CoreResult<Self> {
        let properties = probe_stream(input_path)?;
        log::debug!(
            "Video {}: {}x{}, {:.3} fps, {} frames, {:.2}s",
            input_path.display(),
            properties.width,
            properties.height,
            properties.fps,
            properties.total_frames,
            properties.duration
        );

        let mut cmd = FfmpegCommand::new();
        cmd.hide_banner();
        cmd.input(input_path.to_string_lossy().as_ref());
        cmd.arg("-an"); // No audio
        cmd.arg("-sn"); // No subtitles
        cmd.args(["-f", "rawvideo", "-pix_fmt", "rgba"]);
        cmd.output("-");
        log::debug!("Running decoder command: {cmd:?}");

        let mut child = cmd
            .spawn()
            .map_err(|e| command_start_error("ffmpeg (decoder)", e))?;
        let events = match child.iter() {
            Ok(events) => events,
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CoreError::Decode(format!(
                    "Failed to read decoder output: {err}"
                )));
            }
        };

        Ok(Self {
            child,
            events,
            properties,
            stderr: String::new(),
            finished: false,
        })
    }

    /// Waits for the decoder to exit once its output is exhausted.
    fn finish(&mut self) -> CoreResult<()> {
        self.finished = true;
        let status = self
            .child
            .wait()
            .map_err(|e| CoreError::Decode(format!("Failed to wait for ffmpeg: {e}")))?;
        if !status.success() {
            return Err(command_failed_error(
                "ffmpeg (decoder)",
                status,
                std::mem::take(&mut self.stderr),
            ));
        }
        Ok(())
    }
}

impl FrameSource for FfmpegSource {
    type Image = RgbaImage;

    fn next_frame(&mut self) -> CoreResult<Option<RgbaImage>> {
        if self.finished {
            return Ok(None);
        }

        while let Some(event) = self.events.next() {
            match event {
                FfmpegEvent::OutputFrame(frame) => {
                    let (width, height) = (frame.width, frame.height);
                    let image = RgbaImage::from_raw(width, height, frame.data).ok_or_else(|| {
                        CoreError::Decode(format!(
                            "Frame {} does not hold {width}x{height} RGBA pixels",
                            frame.frame_num
                        ))
                    })?;
                    return Ok(Some(image));
                }
                FfmpegEvent::Log(LogLevel::Fatal, message) => {
                    self.finished = true;
                    return Err(CoreError::Decode(message));
                }
                FfmpegEvent::Log(LogLevel::Error, message) | FfmpegEvent::Error(message) => {
                    log::debug!("ffmpeg: {message}");
                    self.stderr.push_str(&message);
                    self.stderr.push('\n');
                }
                FfmpegEvent::Done => break,
                _ => {}
            }
        }

        self.finish()?;
        Ok(None)
    }

    fn properties(&self) -> StreamProperties {
        self.properties
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rate_parsing() {
        assert_eq!(parse_frame_rate("30"), Some(30.0));
        assert_eq!(parse_frame_rate("29.97"), Some(29.97));
        assert_eq!(parse_frame_rate("30000/1001"), Some(30000.0 / 1001.0));
        assert_eq!(parse_frame_rate("25/1"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("30/0"), None);
        assert_eq!(parse_frame_rate("invalid"), None);
    }

    #[test]
    fn test_missing_input_is_an_error() {
        assert!(probe_stream(Path::new("/nonexistent/clip.mp4")).is_err());
    }
}
