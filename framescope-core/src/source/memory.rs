//! In-memory frame source.

use std::collections::VecDeque;

use super::{FrameSource, StreamProperties};
use crate::error::CoreResult;

/// Replays a fixed sequence of decoded images.
///
/// A `None` entry simulates an index the decoder did not deliver. When the
/// queue runs dry before `total_frames` indices have been read, the remaining
/// indices also yield `None`.
#[derive(Debug, Clone)]
pub struct MemorySource<I> {
    frames: VecDeque<Option<I>>,
    properties: StreamProperties,
}

impl<I> MemorySource<I> {
    /// Source over `frames`, reporting `total_frames = frames.len()`.
    pub fn new(width: u32, height: u32, frames: Vec<I>) -> Self {
        Self::with_gaps(width, height, frames.into_iter().map(Some).collect())
    }

    /// Source over `frames` where `None` entries are decoder gaps.
    pub fn with_gaps(width: u32, height: u32, frames: Vec<Option<I>>) -> Self {
        let properties = StreamProperties {
            width,
            height,
            fps: 0.0,
            total_frames: frames.len() as u64,
            duration: 0.0,
        };
        Self {
            frames: frames.into(),
            properties,
        }
    }

    /// Overrides the reported properties, e.g. to announce more frames than held.
    pub fn with_properties(mut self, properties: StreamProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Number of entries not yet consumed.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl<I> FrameSource for MemorySource<I> {
    type Image = I;

    fn next_frame(&mut self) -> CoreResult<Option<I>> {
        Ok(self.frames.pop_front().flatten())
    }

    fn properties(&self) -> StreamProperties {
        self.properties
    }
}
