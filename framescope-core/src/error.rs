// ============================================================================
// framescope-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Custom Error Types for framescope-core
//
// This module defines the error type used throughout the framescope-core
// library. Only conditions that terminate a run are errors; recoverable
// situations (negative ROI values, clamped extents, decoder gaps, motion
// tracking failures) are logged and processing continues.
//
// KEY COMPONENTS:
// - CoreError: Enum of all fatal error conditions
// - CoreResult: Type alias for Result with CoreError
// - Helper constructors for common error cases

// ---- External crate imports ----
use thiserror::Error;

// ---- Standard library imports ----
use std::io;
use std::process::ExitStatus;

/// Fatal error conditions raised by framescope-core.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// ROI or patch grid that cannot be applied to the stream.
    #[error("Invalid geometry: {0}")]
    Geometry(String),

    #[error("Input not found: {0}")]
    InputNotFound(String),

    #[error("Invalid path: {0}")]
    PathError(String),

    #[error("Failed to start {command}: {source}")]
    CommandStart {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("{0} failed with status {1}: {2}")]
    CommandFailed(String, ExitStatus, String),

    /// The decoder failed while producing frames.
    #[error("Decoder error: {0}")]
    Decode(String),

    #[error("Failed to parse ffprobe output: {0}")]
    FfprobeParse(String),

    /// A primitive behind `ImageOps` rejected its input.
    #[error("Image operation failed: {0}")]
    Image(String),
}

/// Result type for framescope-core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Builds a `CoreError::CommandStart` for an external command that could not be spawned.
pub fn command_start_error(command: impl Into<String>, source: io::Error) -> CoreError {
    CoreError::CommandStart {
        command: command.into(),
        source,
    }
}

/// Builds a `CoreError::CommandFailed` for an external command that exited unsuccessfully.
pub fn command_failed_error(
    command: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed(command.into(), status, stderr.into())
}

/// Builds a `CoreError::Geometry` from anything displayable.
pub(crate) fn geometry_error(message: impl std::fmt::Display) -> CoreError {
    CoreError::Geometry(message.to_string())
}
