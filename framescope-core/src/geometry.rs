// ============================================================================
// framescope-core/src/geometry.rs
// ============================================================================
//
// GEOMETRY: Region of Interest and Patch Grid Resolution
//
// This module turns the raw `blur_roi` and `patch_grid` arrays from the
// settings into a validated rectangle and a regular grid of patches inside it.
//
// KEY COMPONENTS:
// - Roi: Rectangle fully contained in the frame, with positive extent
// - PatchGrid: Regular grid of equally sized patches inside the ROI
// - resolve_roi / resolve_patch_grid: Validation and clamping
//
// Fatal problems (an ROI starting outside the frame, an inverted ROI, a grid
// finer than the ROI) are returned as `CoreError::Geometry`. Recoverable ones
// (negative values, extents running past the frame edge) fall back to a safe
// value and log a warning.

// ---- Standard library imports ----
use std::fmt;

// ---- Internal crate imports ----
use crate::error::{CoreResult, geometry_error};

/// Axis-aligned rectangle in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering the whole frame.
    pub fn full_frame(frame_width: u32, frame_height: u32) -> Self {
        Self::new(0, 0, frame_width, frame_height)
    }

    /// Number of pixels covered.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Whether the rectangle lies inside a `frame_width` x `frame_height` frame.
    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(frame_width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(frame_height)
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} x {} from ({}, {})]", self.width, self.height, self.x, self.y)
    }
}

/// Regular grid of `count_x` x `count_y` patches of identical size.
///
/// Patch sizes are floor-divided from the ROI extent, so when the ROI is not
/// an exact multiple of the grid a strip along the right and bottom edges is
/// not covered by any patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchGrid {
    pub count_x: u32,
    pub count_y: u32,
    pub patch_width: u32,
    pub patch_height: u32,
}

impl PatchGrid {
    /// One patch spanning the whole ROI.
    pub fn single(roi: &Roi) -> Self {
        Self {
            count_x: 1,
            count_y: 1,
            patch_width: roi.width,
            patch_height: roi.height,
        }
    }

    pub fn patch_count(&self) -> usize {
        self.count_x as usize * self.count_y as usize
    }

    /// Patch rectangles relative to the ROI origin, row-major (y outer, x inner).
    pub fn patches(&self) -> impl Iterator<Item = Roi> + '_ {
        (0..self.count_y).flat_map(move |y| {
            (0..self.count_x).map(move |x| {
                Roi::new(
                    x * self.patch_width,
                    y * self.patch_height,
                    self.patch_width,
                    self.patch_height,
                )
            })
        })
    }
}

impl fmt::Display for PatchGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.count_x, self.count_y, self.patch_width, self.patch_height
        )
    }
}

/// Resolves the raw `[x, y, width, height]` ROI against the frame size.
///
/// Four identical values mean no ROI was requested and yield the full frame.
pub fn resolve_roi(raw: [i32; 4], frame_width: u32, frame_height: u32) -> CoreResult<Roi> {
    let full = Roi::full_frame(frame_width, frame_height);

    if raw.iter().all(|value| *value == raw[0]) {
        log::debug!("ROI values are all equal, no ROI applied");
        return Ok(full);
    }

    if raw.iter().any(|value| *value < 0) {
        log::warn!("Negative number in ROI {raw:?}, reverting ROI to full image");
        return Ok(full);
    }

    // All components are non-negative from here on.
    let [x, y, width, height] = raw.map(|value| value as u32);

    if x >= frame_width {
        return Err(geometry_error(format!(
            "x ({x}) must be smaller than the video width ({frame_width})"
        )));
    }
    if width > frame_width {
        return Err(geometry_error(format!(
            "width ({width}) must not exceed the video width ({frame_width})"
        )));
    }
    if y >= frame_height {
        return Err(geometry_error(format!(
            "y ({y}) must be smaller than the video height ({frame_height})"
        )));
    }
    if height > frame_height {
        return Err(geometry_error(format!(
            "height ({height}) must not exceed the video height ({frame_height})"
        )));
    }

    let width = resolve_extent("width", x, width, frame_width)?;
    let height = resolve_extent("height", y, height, frame_height)?;

    let roi = Roi::new(x, y, width, height);
    log::debug!("ROI {roi}");
    Ok(roi)
}

/// Validates one axis of the ROI and clamps it to the frame edge if needed.
fn resolve_extent(axis: &str, start: u32, extent: u32, frame_extent: u32) -> CoreResult<u32> {
    let available = frame_extent - start;

    if extent > available {
        log::warn!(
            "ROI {axis} ({extent}) runs past the frame edge, clamping to {available}"
        );
        return Ok(available);
    }

    if start >= extent {
        return Err(geometry_error(format!(
            "ROI position ({start}) must be smaller than its {axis} ({extent})"
        )));
    }

    Ok(extent)
}

/// Resolves the raw `[count_x, count_y]` grid inside `roi`.
///
/// The grid collapses to a single patch when both counts equal the same
/// reject value (e.g. `[0, 0]` or `[1, 1]`), when either count is negative,
/// or when either count is zero.
pub fn resolve_patch_grid(raw: [i32; 2], roi: &Roi, reject_values: &[i32]) -> CoreResult<PatchGrid> {
    let [count_x, count_y] = raw;

    let rejected = reject_values
        .iter()
        .any(|reject| *reject == count_x && *reject == count_y);

    if rejected || count_x < 0 || count_y < 0 {
        let grid = PatchGrid::single(roi);
        log::debug!("Patch grid {raw:?} not applied, using a single patch {grid}");
        return Ok(grid);
    }

    if count_x == 0 || count_y == 0 {
        log::warn!("Patch grid {raw:?} has an empty axis, using a single patch");
        return Ok(PatchGrid::single(roi));
    }

    let (count_x, count_y) = (count_x as u32, count_y as u32);
    let grid = PatchGrid {
        count_x,
        count_y,
        patch_width: roi.width / count_x,
        patch_height: roi.height / count_y,
    };

    if grid.patch_width == 0 || grid.patch_height == 0 {
        return Err(geometry_error(format!(
            "patch grid {count_x}x{count_y} is finer than the ROI {roi}"
        )));
    }

    log::debug!("Patch grid {grid}");
    Ok(grid)
}
