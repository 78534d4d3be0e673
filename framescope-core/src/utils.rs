//! Utility functions for paths, string flags and formatting.
//!
//! This module provides general-purpose helpers used throughout the
//! framescope-core library: settings flag parsing, file checks, output
//! directory naming and duration formatting.

use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};

/// Strings accepted as `true` for settings flags (compared case-insensitively).
const TRUE_WORDS: [&str; 4] = ["true", "yes", "y", "1"];

/// Interprets a settings string as a boolean. Anything outside the accepted
/// words is `false`.
#[must_use]
pub fn str_to_bool(value: &str) -> bool {
    let lowered = value.to_lowercase();
    TRUE_WORDS.contains(&lowered.as_str())
}

/// Checks that `path` exists and is a regular file.
pub fn ensure_regular_file(path: &Path) -> CoreResult<()> {
    if !path.exists() {
        return Err(CoreError::InputNotFound(format!(
            "The specified path {} does not exist",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(CoreError::PathError(format!(
            "The specified path {} is not a file",
            path.display()
        )));
    }
    Ok(())
}

/// Directory holding the metric files for a video: `<dir>/<stem>_meta`.
pub fn meta_dir_for(video_path: &Path) -> CoreResult<PathBuf> {
    let stem = video_path.file_stem().ok_or_else(|| {
        CoreError::PathError(format!(
            "Failed to get file name for {}",
            video_path.display()
        ))
    })?;
    let parent = video_path.parent().unwrap_or_else(|| Path::new(""));

    let mut dir_name = stem.to_os_string();
    dir_name.push("_meta");
    Ok(parent.join(dir_name))
}

/// Width that keeps the aspect ratio when scaling to `new_height`, rounded up.
#[must_use]
pub fn scaled_width(width: u32, height: u32, new_height: u32) -> u32 {
    if height == 0 {
        return 0;
    }
    let scaled = (u64::from(width) * u64::from(new_height)).div_ceil(u64::from(height));
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_str_to_bool() {
        for word in ["true", "TRUE", "Yes", "y", "Y", "1"] {
            assert!(str_to_bool(word), "{word} should be true");
        }
        for word in ["false", "no", "0", "", "yess", " true"] {
            assert!(!str_to_bool(word), "{word} should be false");
        }
    }

    #[test]
    fn test_meta_dir_for() {
        assert_eq!(
            meta_dir_for(Path::new("/data/videos/clip.final.mp4")).unwrap(),
            PathBuf::from("/data/videos/clip.final_meta")
        );
        assert_eq!(
            meta_dir_for(Path::new("clip.mkv")).unwrap(),
            PathBuf::from("clip_meta")
        );
    }

    #[test]
    fn test_scaled_width() {
        assert_eq!(scaled_width(1920, 1080, 360), 640);
        assert_eq!(scaled_width(1000, 360, 360), 1000);
        assert_eq!(scaled_width(101, 100, 360), 364);
        assert_eq!(scaled_width(640, 0, 360), 0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(3725.0), "01:02:05");
        assert_eq!(format_duration(-1.0), "??:??:??");
    }
}
