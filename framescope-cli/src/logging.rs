// framescope-cli/src/logging.rs
//
// Console logger setup for the framescope binary.

use chrono::Local;
use console::style;
use log::LevelFilter;
use std::io::Write;

/// Returns the current local time formatted for log lines and banners.
pub fn get_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Log level for a run: Debug when `verbose` is set, Info otherwise.
pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Initializes the global logger.
///
/// Directives in `RUST_LOG` override the level chosen from `verbose`. The
/// formatter accepts every level; the active level is the global maximum, so
/// [`enable_debug`] can raise it once the settings are known.
pub fn init(verbose: bool) {
    let level = level_for(verbose);
    let env_override = std::env::var_os(env_logger::DEFAULT_FILTER_ENV).is_some();

    env_logger::Builder::new()
        .format(|buf, record| {
            let level_str = match record.level() {
                log::Level::Error => "ERROR",
                log::Level::Warn => "WARN ",
                log::Level::Info => "INFO ",
                log::Level::Debug => "DEBUG",
                log::Level::Trace => "TRACE",
            };

            let level_styled = match record.level() {
                log::Level::Error => style(level_str).red().bright(),
                log::Level::Warn => style(level_str).yellow(),
                log::Level::Info => style(level_str).green(),
                log::Level::Debug => style(level_str).blue(),
                log::Level::Trace => style(level_str).magenta(),
            }
            .for_stderr();

            writeln!(
                buf,
                "{} {} {}",
                style(get_timestamp()).white().for_stderr(),
                level_styled,
                record.args()
            )
        })
        .filter_level(LevelFilter::Trace)
        .parse_default_env()
        .init();

    if !env_override {
        log::set_max_level(level);
    }
    log::debug!("Logger initialized with level: {}", log::max_level());
}

/// Raises the active level to Debug; a more verbose level is left alone.
pub fn enable_debug() {
    if log::max_level() < LevelFilter::Debug {
        log::set_max_level(LevelFilter::Debug);
        log::debug!("Debug logging enabled by the settings");
    }
}
