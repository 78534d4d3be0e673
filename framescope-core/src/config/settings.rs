//! JSON settings document loading.
//!
//! A settings document names the video to analyse, switches metrics on and
//! off, and optionally provides the raw ROI and patch grid:
//!
//! ```json
//! {
//!     "video_path": "/videos/clip.mp4",
//!     "blur": true,
//!     "exposure": "yes",
//!     "entropy": "false",
//!     "motion": true,
//!     "debug": false,
//!     "show": "n",
//!     "blur_roi": [0, 0, 640, 360],
//!     "patch_grid": [4, 3]
//! }
//! ```
//!
//! Booleans may be JSON booleans or strings; strings are true only when they
//! are one of `true`, `yes`, `y` or `1` (case-insensitive).

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer};
use serde::Deserialize;

use super::{MetricSelection, NO_PATCH_GRID, NO_ROI, StreamConfig};
use crate::error::{CoreError, CoreResult};
use crate::utils::{ensure_regular_file, str_to_bool};

/// Settings document as written by the user, before validation.
#[derive(Debug, Deserialize)]
struct RawSettings {
    video_path: String,
    #[serde(default, deserialize_with = "flexible_bool")]
    blur: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    exposure: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    entropy: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    motion: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    debug: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    show: bool,
    #[serde(default = "default_roi")]
    blur_roi: Vec<i32>,
    #[serde(default = "default_grid")]
    patch_grid: Vec<i32>,
}

fn default_roi() -> Vec<i32> {
    NO_ROI.to_vec()
}

fn default_grid() -> Vec<i32> {
    NO_PATCH_GRID.to_vec()
}

/// Accepts a JSON boolean or a string; anything else is rejected.
fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(value) => Ok(value),
        serde_json::Value::String(text) => Ok(str_to_bool(&text)),
        other => Err(de::Error::custom(format!(
            "booleans are either bool or string, found {other}"
        ))),
    }
}

/// Converts a parsed array into a fixed-size one, reporting the field on mismatch.
fn fixed_array<const N: usize>(name: &str, values: Vec<i32>) -> CoreResult<[i32; N]> {
    let len = values.len();
    values.try_into().map_err(|_| {
        CoreError::Config(format!(
            "'{name}' must have exactly {N} elements, found {len}"
        ))
    })
}

/// Parses a settings document without touching the filesystem.
pub fn parse_settings(json: &str) -> CoreResult<StreamConfig> {
    let raw: RawSettings = serde_json::from_str(json)?;

    if raw.video_path.trim().is_empty() {
        return Err(CoreError::Config("'video_path' must not be empty".to_string()));
    }

    Ok(StreamConfig {
        video_path: PathBuf::from(raw.video_path),
        metrics: MetricSelection {
            blur: raw.blur,
            exposure: raw.exposure,
            entropy: raw.entropy,
            motion: raw.motion,
        },
        debug: raw.debug,
        show: raw.show,
        blur_roi: fixed_array("blur_roi", raw.blur_roi)?,
        patch_grid: fixed_array("patch_grid", raw.patch_grid)?,
    })
}

/// Reads a settings file, parses it and checks that the referenced video exists.
pub fn load_settings(path: &Path) -> CoreResult<StreamConfig> {
    ensure_regular_file(path)?;
    log::debug!("Reading settings from {}", path.display());

    let text = fs::read_to_string(path)?;
    let config = parse_settings(&text)?;
    ensure_regular_file(&config.video_path)?;

    Ok(config)
}
