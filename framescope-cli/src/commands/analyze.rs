// framescope-cli/src/commands/analyze.rs
//
// Implements the `analyze` subcommand: load the settings, run the metric
// engine over the referenced video and summarize the result.

use framescope_core::stream::ProgressCallback;
use framescope_core::{AnalysisParams, CoreResult, StreamConfig, analyze_video, format_duration};
use log::info;

use crate::cli::AnalyzeArgs;
use crate::logging::{self, get_timestamp};
use crate::output::{create_progress_bar, print_heading, print_info, print_section, print_success};

/// Applies command-line overrides to the default engine parameters.
pub fn analysis_params(args: &AnalyzeArgs) -> AnalysisParams {
    let mut params = AnalysisParams::default();
    if let Some(batch_size) = args.batch_size {
        params.batch_size = usize::from(batch_size);
    }
    params
}

/// Runs the analysis described by `args`.
///
/// The settings' `debug` flag raises the log level just like `--verbose`.
pub fn run_analyze(args: AnalyzeArgs, verbose: bool) -> CoreResult<()> {
    logging::init(verbose);
    let config = StreamConfig::from_settings_file(&args.settings)?;
    if config.debug {
        logging::enable_debug();
    }
    log::debug!("Settings: {config:?}");
    log::debug!("Arguments: {args:?}");

    let params = analysis_params(&args);
    info!("Analysis started at {}", get_timestamp());
    info!("Settings file: {}", args.settings.display());
    info!("Video: {}", config.video_path.display());

    let metrics = config.metrics.enabled();
    if metrics.is_empty() {
        log::warn!("No metric is enabled; only frame decoding will run");
    }

    let progress_bar = (!args.no_progress).then(create_progress_bar);
    let callback = progress_bar.clone().map(|pb| {
        Box::new(move |done: u64, total: u64| {
            if pb.length() != Some(total) {
                pb.set_length(total);
            }
            pb.set_position(done);
        }) as ProgressCallback
    });

    let result = analyze_video(config, params, args.output_dir.as_deref(), callback);
    if let Some(pb) = &progress_bar {
        pb.finish_and_clear();
    }
    let report = result?;

    print_heading("Analysis Summary");
    print_info(
        "Resolution",
        format!("{}x{}", report.properties.width, report.properties.height),
    );
    print_info("Frame rate", format!("{:.3} fps", report.properties.fps));
    print_info("Duration", format_duration(report.properties.duration));
    print_info("ROI", report.roi);
    print_info("Patch grid", report.patch_grid);
    print_info(
        "Metrics",
        metrics
            .iter()
            .map(|metric| metric.name())
            .collect::<Vec<_>>()
            .join(", "),
    );

    print_section("Result");
    print_info("Frames", report.summary);
    print_info("Output", report.meta_dir.display());

    if report.summary.aborted {
        print_success("Analysis stopped early; partial metrics were written");
    } else {
        print_success("Analysis complete");
    }
    Ok(())
}
