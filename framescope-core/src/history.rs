//! Fixed-capacity sliding window of recent frames.
//!
//! The history is created full of placeholder frames and keeps exactly
//! `capacity` entries: every push evicts the oldest frame. Motion needs the
//! two most recent slots, so the capacity is at least 2.

use std::collections::VecDeque;

use crate::error::{CoreError, CoreResult};
use crate::frame::Frame;

/// Bounded FIFO of frames, oldest first.
#[derive(Debug)]
pub struct FrameHistory<I> {
    frames: VecDeque<Frame<I>>,
    capacity: usize,
}

impl<I> FrameHistory<I> {
    /// Creates a history pre-filled with `capacity` placeholders.
    pub fn new(capacity: usize) -> CoreResult<Self> {
        if capacity < 2 {
            return Err(CoreError::Config(format!(
                "frame history needs at least 2 slots, got {capacity}"
            )));
        }

        let frames = (0..capacity).map(|_| Frame::placeholder()).collect();
        Ok(Self { frames, capacity })
    }

    /// Evicts the oldest frame and appends `frame` as the latest one.
    pub fn push(&mut self, frame: Frame<I>) -> Option<Frame<I>> {
        let evicted = self.frames.pop_front();
        self.frames.push_back(frame);
        evicted
    }

    /// Number of slots; always equal to the capacity.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently pushed frame.
    pub fn latest(&self) -> Option<&Frame<I>> {
        self.frames.back()
    }

    pub fn latest_mut(&mut self) -> Option<&mut Frame<I>> {
        self.frames.back_mut()
    }

    /// Frame pushed just before the latest one.
    pub fn previous(&self) -> Option<&Frame<I>> {
        self.frames.len().checked_sub(2).and_then(|index| self.frames.get(index))
    }

    /// Borrows the previous frame immutably and the latest frame mutably.
    pub fn previous_and_latest_mut(&mut self) -> Option<(&Frame<I>, &mut Frame<I>)> {
        let (latest, rest) = self.frames.make_contiguous().split_last_mut()?;
        let previous = rest.last()?;
        Some((previous, latest))
    }

    /// Frames from oldest to latest.
    pub fn iter(&self) -> impl Iterator<Item = &Frame<I>> {
        self.frames.iter()
    }
}
