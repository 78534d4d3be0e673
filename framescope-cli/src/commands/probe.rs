// framescope-cli/src/commands/probe.rs
//
// Implements the `probe` subcommand, which prints the stream properties the
// analysis would run with.

use framescope_core::utils::ensure_regular_file;
use framescope_core::{CoreResult, format_duration, probe_stream};
use std::path::Path;

use crate::logging;
use crate::output::{print_heading, print_info};

/// Probes `video` with ffprobe and prints its properties.
pub fn run_probe(video: &Path, verbose: bool) -> CoreResult<()> {
    logging::init(verbose);
    ensure_regular_file(video)?;

    let properties = probe_stream(video)?;

    print_heading("Stream Properties");
    print_info("File", video.display());
    print_info("Resolution", format!("{}x{}", properties.width, properties.height));
    print_info("Frame rate", format!("{:.3} fps", properties.fps));
    print_info("Frames", properties.total_frames);
    print_info("Duration", format_duration(properties.duration));
    Ok(())
}
