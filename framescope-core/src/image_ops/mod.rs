//! Image primitives used by the metric engine.
//!
//! The metric formulas in [`crate::frame`] never touch pixels directly. They
//! go through [`ImageOps`], a small capability interface covering color
//! conversion, cropping, statistics, filtering, histograms, corner detection
//! and sparse optical flow. Each call is blocking: it returns only once the
//! backend has finished the operation.
//!
//! [`software::SoftwareOps`] implements the interface on host memory and is
//! the reference the rest of the crate is tested against.

pub mod software;

use std::fmt;

use crate::error::CoreResult;
use crate::geometry::Roi;

pub use software::{CornerParams, FlowParams, SoftwareOps};

/// Channel of the HSV representation a histogram is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HsvChannel {
    Hue,
    Saturation,
    Value,
}

impl HsvChannel {
    /// Position of the channel in `[H, S, V]`.
    pub fn index(self) -> usize {
        match self {
            HsvChannel::Hue => 0,
            HsvChannel::Saturation => 1,
            HsvChannel::Value => 2,
        }
    }
}

impl fmt::Display for HsvChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HsvChannel::Hue => "hue",
            HsvChannel::Saturation => "saturation",
            HsvChannel::Value => "value",
        };
        f.write_str(name)
    }
}

/// Sub-pixel position in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Output of sparse optical flow: one position per input point.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowResult {
    /// Estimated position of each input point in the next image
    pub points: Vec<Point2>,
    /// Whether the tracker converged for the point at the same index
    pub status: Vec<bool>,
}

/// Capability interface for the image primitives the metrics need.
pub trait ImageOps {
    /// Four-channel color image as produced by the decoder.
    type Image;
    /// Single-channel 8-bit image.
    type Gray;

    /// Width and height of a color image.
    fn dimensions(&self, image: &Self::Image) -> (u32, u32);

    /// Converts a color image to intensity.
    fn to_gray(&self, image: &Self::Image) -> CoreResult<Self::Gray>;

    /// Copies the `rect` region out of `gray`.
    fn crop(&self, gray: &Self::Gray, rect: &Roi) -> CoreResult<Self::Gray>;

    /// Mean and population standard deviation of all pixels.
    fn mean_std_dev(&self, gray: &Self::Gray) -> CoreResult<(f64, f64)>;

    /// Second-derivative edge filter with 8-bit saturated output.
    fn laplacian(&self, gray: &Self::Gray) -> CoreResult<Self::Gray>;

    /// Converts a color image to HSV and returns the three planes `[H, S, V]`.
    fn hsv_planes(&self, image: &Self::Image) -> CoreResult<[Self::Gray; 3]>;

    /// Evenly spaced histogram of `plane` over `[lower, upper)`, copied to host memory.
    fn histogram_even(
        &self,
        plane: &Self::Gray,
        bins: usize,
        lower: u32,
        upper: u32,
    ) -> CoreResult<Vec<u32>>;

    /// Finds corners worth tracking.
    fn detect_corners(&self, gray: &Self::Gray) -> CoreResult<Vec<Point2>>;

    /// Tracks `points` from `prev` into `next`.
    fn track_points(
        &self,
        prev: &Self::Gray,
        next: &Self::Gray,
        points: &[Point2],
    ) -> CoreResult<FlowResult>;
}
