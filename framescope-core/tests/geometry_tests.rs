use framescope_core::geometry::{PatchGrid, Roi, resolve_patch_grid, resolve_roi};
use framescope_core::CoreError;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::sync::Once;

const REJECT: [i32; 2] = [0, 1];

// ---- Log capture ----
//
// Records are kept per thread, so tests running in parallel only see their
// own warnings.

thread_local! {
    static RECORDS: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.with(|records| {
            records
                .borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INIT: Once = Once::new();

/// Runs `f` and returns its result with the warnings it logged.
fn with_warnings<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    INIT.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LevelFilter::Trace);
    });
    RECORDS.with(|records| records.borrow_mut().clear());
    let result = f();
    let warnings = RECORDS.with(|records| {
        records
            .borrow()
            .iter()
            .filter(|(level, _)| *level == Level::Warn)
            .map(|(_, message)| message.clone())
            .collect()
    });
    (result, warnings)
}

#[test]
fn test_identical_values_mean_full_frame() {
    for value in [-7, -1, 0, 1, 5, 99, 100, 5000] {
        let roi = resolve_roi([value; 4], 100, 80).unwrap();
        assert_eq!(roi, Roi::full_frame(100, 80), "value {value}");
    }
}

#[test]
fn test_all_equal_roi_on_square_frame() {
    assert_eq!(resolve_roi([5, 5, 5, 5], 100, 100).unwrap(), Roi::new(0, 0, 100, 100));
}

#[test]
fn test_negative_component_falls_back_to_full_frame() {
    assert_eq!(resolve_roi([-1, 0, 50, 50], 100, 100).unwrap(), Roi::full_frame(100, 100));
    assert_eq!(resolve_roi([0, 0, 50, -3], 100, 100).unwrap(), Roi::full_frame(100, 100));
}

#[test]
fn test_extent_past_edge_is_clamped() {
    let roi = resolve_roi([90, 90, 50, 50], 100, 100).unwrap();
    assert_eq!(roi, Roi::new(90, 90, 10, 10));

    let roi = resolve_roi([10, 20, 95, 30], 100, 100).unwrap();
    assert_eq!(roi, Roi::new(10, 20, 90, 30));
}

#[test]
fn test_full_extent_is_allowed() {
    assert_eq!(resolve_roi([0, 0, 100, 50], 100, 100).unwrap(), Roi::new(0, 0, 100, 50));
}

#[test]
fn test_out_of_frame_requests_are_fatal() {
    let cases = [
        [100, 0, 50, 50], // x at the right edge
        [0, 0, 101, 50],  // wider than the frame
        [0, 100, 50, 50], // y at the bottom edge
        [0, 0, 50, 101],  // taller than the frame
    ];
    for raw in cases {
        let err = resolve_roi(raw, 100, 100).unwrap_err();
        assert!(matches!(err, CoreError::Geometry(_)), "{raw:?} gave {err:?}");
    }
}

#[test]
fn test_position_beyond_extent_is_fatal() {
    let err = resolve_roi([50, 0, 40, 60], 100, 100).unwrap_err();
    assert!(matches!(err, CoreError::Geometry(_)));

    let err = resolve_roi([0, 30, 60, 30], 100, 100).unwrap_err();
    assert!(matches!(err, CoreError::Geometry(_)));
}

#[test]
fn test_resolved_roi_is_always_contained() {
    let (frame_width, frame_height) = (64u32, 48u32);
    for x in (0..70).step_by(7) {
        for width in (1..70).step_by(6) {
            for y in (0..50).step_by(9) {
                for height in (1..50).step_by(8) {
                    let raw = [x, y, width, height];
                    if let Ok(roi) = resolve_roi(raw, frame_width, frame_height) {
                        assert!(roi.fits_within(frame_width, frame_height), "{raw:?} -> {roi}");
                        assert!(roi.width > 0 && roi.height > 0, "{raw:?} -> {roi}");
                    }
                }
            }
        }
    }
}

#[test]
fn test_reject_values_collapse_grid() {
    let roi = Roi::new(10, 10, 60, 40);
    for raw in [[0, 0], [1, 1], [-1, -1], [-2, 4], [3, -1]] {
        let grid = resolve_patch_grid(raw, &roi, &REJECT).unwrap();
        assert_eq!(grid, PatchGrid::single(&roi), "grid {raw:?}");
        assert_eq!(grid.patches().collect::<Vec<_>>(), vec![Roi::new(0, 0, 60, 40)]);
    }
}

#[test]
fn test_single_zero_count_collapses_grid() {
    let roi = Roi::new(0, 0, 60, 40);
    assert_eq!(resolve_patch_grid([0, 3], &roi, &REJECT).unwrap(), PatchGrid::single(&roi));
    assert_eq!(resolve_patch_grid([4, 0], &roi, &REJECT).unwrap(), PatchGrid::single(&roi));
}

#[test]
fn test_mixed_reject_values_are_used_as_given() {
    let roi = Roi::new(0, 0, 60, 40);
    let grid = resolve_patch_grid([1, 4], &roi, &REJECT).unwrap();
    assert_eq!((grid.count_x, grid.count_y), (1, 4));
    assert_eq!((grid.patch_width, grid.patch_height), (60, 10));
}

#[test]
fn test_floor_division_leaves_border_strip() {
    let roi = Roi::new(0, 0, 100, 100);
    let grid = resolve_patch_grid([3, 3], &roi, &REJECT).unwrap();
    assert_eq!((grid.patch_width, grid.patch_height), (33, 33));

    let last = grid.patches().last().unwrap();
    assert_eq!(last, Roi::new(66, 66, 33, 33));
    // Column 99 and row 99 belong to no patch.
    assert_eq!(last.x + last.width, 99);
    assert_eq!(grid.patch_count(), 9);
}

#[test]
fn test_grid_finer_than_roi_is_fatal() {
    let roi = Roi::new(0, 0, 100, 10);
    let err = resolve_patch_grid([2, 20], &roi, &REJECT).unwrap_err();
    assert!(matches!(err, CoreError::Geometry(_)));
}

#[test]
fn test_clamp_logs_warning() {
    let (roi, warnings) = with_warnings(|| resolve_roi([90, 90, 50, 50], 100, 100));
    assert_eq!(roi.unwrap(), Roi::new(90, 90, 10, 10));
    assert_eq!(warnings.len(), 2, "{warnings:?}");
    assert!(warnings[0].contains("width") && warnings[0].contains("clamping to 10"));
    assert!(warnings[1].contains("height") && warnings[1].contains("clamping to 10"));
}

#[test]
fn test_negative_roi_logs_warning() {
    let (roi, warnings) = with_warnings(|| resolve_roi([-1, 0, 50, 50], 100, 100));
    assert_eq!(roi.unwrap(), Roi::full_frame(100, 100));
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Negative number in ROI"));
}

#[test]
fn test_valid_roi_logs_no_warning() {
    let (roi, warnings) = with_warnings(|| resolve_roi([10, 10, 50, 50], 100, 100));
    assert_eq!(roi.unwrap(), Roi::new(10, 10, 50, 50));
    assert!(warnings.is_empty(), "{warnings:?}");
}
