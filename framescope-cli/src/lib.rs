// framescope-cli/src/lib.rs
//
// Library portion of the framescope CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod output;

// Re-export items needed by the binary or integration tests
pub use cli::{AnalyzeArgs, Cli, Commands};
pub use commands::analyze::run_analyze;
pub use commands::probe::run_probe;
