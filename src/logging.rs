//! Logging configuration for pcmdump
//!
//! Logs always go to the terminal. With `--log-file` they are also appended
//! to that file at debug level, which is useful for long batch runs.

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::OpenOptions;
use std::path::Path;

/// Terminal level for a run
pub fn terminal_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

fn log_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build()
}

/// Initialize the logging system
///
/// Sets up combined logging to:
/// - Terminal (info, or debug when verbose)
/// - File (debug, only when `log_file` is given)
pub fn init_logging(verbose: bool, log_file: Option<&Path>) {
    let config = log_config();
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        terminal_level(verbose),
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    let mut file_error = None;
    if let Some(path) = log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, file)),
            Err(e) => file_error = Some(e),
        }
    }

    if CombinedLogger::init(loggers).is_err() {
        eprintln!("Warning: Logger already initialized");
    }

    if let (Some(path), Some(e)) = (log_file, file_error) {
        log::warn!("Could not open log file {}: {}", path.display(), e);
    }
}
