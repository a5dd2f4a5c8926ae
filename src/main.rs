//! pcmdump - batch audio decoder
//!
//! Decodes a single file, or every matching file under a directory, to raw
//! little-endian 16-bit PCM. With `--format` the PCM is piped through ffmpeg
//! to produce another container instead.

mod audio;
mod conversion;
mod core;
mod logging;
mod test_fixtures;

use clap::Parser;
use std::process::ExitCode;

use crate::audio::{Decoder, SymphoniaDecoder};
use crate::conversion::{run_batch, run_task, FileTask, TaskError};
use crate::core::{CliArgs, RunConfig};

fn main() -> ExitCode {
    let args = CliArgs::parse();
    logging::init_logging(args.verbose, args.log_file.as_deref());

    let config = match RunConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(transcoder) = &config.transcoder {
        log::debug!("Using ffmpeg at {}", transcoder.display());
    }

    match run(&config, &SymphoniaDecoder) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run a validated configuration
///
/// Only a single-file run can fail; batch failures are logged per file and
/// never reach the caller.
fn run(config: &RunConfig, decoder: &dyn Decoder) -> Result<(), TaskError> {
    if config.is_batch() {
        run_batch(config, decoder);
        return Ok(());
    }

    let output = run_task(&FileTask::single(&config.input), config, decoder)?;
    log::info!("Wrote {}", output.display());
    Ok(())
}
