//! Frame sources: where decoded images come from.
//!
//! The stream processor only needs two things from a decoder: the next image
//! (or the information that none was delivered for this index) and the basic
//! properties of the stream. [`FfmpegSource`] decodes real video files through
//! an ffmpeg child process; [`MemorySource`] replays images held in memory.

mod ffmpeg;
mod memory;

pub use ffmpeg::{FfmpegSource, parse_frame_rate, probe_stream};
pub use memory::MemorySource;

use crate::error::CoreResult;

/// Basic properties of a video stream.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StreamProperties {
    pub width: u32,
    pub height: u32,
    /// Frames per second, 0 when unknown
    pub fps: f64,
    /// Number of frames the processing loop iterates over
    pub total_frames: u64,
    /// Duration in seconds, 0 when unknown
    pub duration: f64,
}

impl StreamProperties {
    /// Pixel count of one frame.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Decoder interface consumed by the stream processor.
pub trait FrameSource {
    /// Decoded image type.
    type Image;

    /// Returns the next decoded image.
    ///
    /// `Ok(None)` means no image was delivered for this index; the caller
    /// skips the index and keeps going. Errors are fatal for the run.
    fn next_frame(&mut self) -> CoreResult<Option<Self::Image>>;

    /// Properties of the stream being decoded.
    fn properties(&self) -> StreamProperties;
}
