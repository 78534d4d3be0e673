// framescope-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "framescope: Per-frame video quality metrics",
    long_about = "Measures blur, exposure, entropy and motion for every frame of a video \
                  and writes one CSV time series per metric."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Computes the metrics requested by a JSON settings file
    Analyze(AnalyzeArgs),

    /// Prints the stream properties of a video file
    Probe {
        /// Video file to inspect
        #[arg(value_name = "VIDEO")]
        video: PathBuf,
    },
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// JSON settings document naming the video and the metrics to compute
    #[arg(required = true, value_name = "SETTINGS")]
    pub settings: PathBuf,

    /// Optional: Parent directory for the `<video>_meta` output directory
    /// (defaults to the directory of the video)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Optional: Number of frames kept in the sliding history
    #[arg(long, value_name = "FRAMES", value_parser = clap::value_parser!(u16).range(2..))]
    pub batch_size: Option<u16>,

    /// Disable the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}
