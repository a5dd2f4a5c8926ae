//! Per-file decode pipeline
//!
//! open -> decode -> name -> sink. Each step that can fail maps to one
//! `TaskError` variant, so every task ends in exactly one `Outcome`.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use thiserror::Error;

use super::ffmpeg::{TranscodeError, Transcoder};
use crate::audio::{DecodeError, DecodeOptions, Decoder};
use crate::core::{normalize_suffix, output_name, RunConfig, DEFAULT_SUFFIX};

/// One source file to decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub path: PathBuf,
    /// Selected by a directory walk rather than named explicitly
    pub batch: bool,
}

impl FileTask {
    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            batch: false,
        }
    }

    pub fn batch(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            batch: true,
        }
    }
}

/// Pipeline step a task failed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Open,
    Decode,
    Name,
    Write,
    Transcode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Open => "open",
            Stage::Decode => "decode",
            Stage::Name => "name",
            Stage::Write => "write",
            Stage::Transcode => "transcode",
        };
        f.write_str(s)
    }
}

/// Why a single file could not be converted
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("failed to open input file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode input file {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("cannot derive an output name for {path:?}: path is not valid UTF-8")]
    Name { path: PathBuf },

    #[error("failed to write output file {output:?} for {path:?}: {source}")]
    Write {
        path: PathBuf,
        output: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run ffmpeg for {path:?}: {source}")]
    TranscodeSpawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ffmpeg failed for {path:?} ({status})\noutput: {output}")]
    TranscodeExit {
        path: PathBuf,
        status: ExitStatus,
        output: String,
    },
}

impl TaskError {
    /// Source file the task was working on
    pub fn path(&self) -> &Path {
        match self {
            TaskError::Open { path, .. }
            | TaskError::Decode { path, .. }
            | TaskError::Name { path }
            | TaskError::Write { path, .. }
            | TaskError::TranscodeSpawn { path, .. }
            | TaskError::TranscodeExit { path, .. } => path,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            TaskError::Open { .. } => Stage::Open,
            TaskError::Decode { .. } => Stage::Decode,
            TaskError::Name { .. } => Stage::Name,
            TaskError::Write { .. } => Stage::Write,
            TaskError::TranscodeSpawn { .. } | TaskError::TranscodeExit { .. } => Stage::Transcode,
        }
    }
}

/// Result of one task: the destination written, or where it failed
pub type Outcome = Result<PathBuf, TaskError>;

/// Raw PCM produced by the decoder
struct DecodedAudio {
    pcm: Vec<u8>,
    sample_rate: u32,
}

/// Where decoded PCM ends up
enum Sink {
    /// Write the PCM bytes to the destination file
    Raw,
    /// Pipe the PCM through ffmpeg into `format`
    Transcode {
        transcoder: Transcoder,
        format: String,
    },
}

impl Sink {
    fn for_config(config: &RunConfig) -> Self {
        match (&config.format, &config.transcoder) {
            (Some(format), Some(binary)) => Sink::Transcode {
                transcoder: Transcoder::new(binary),
                format: format.clone(),
            },
            _ => Sink::Raw,
        }
    }

    fn default_suffix(&self) -> String {
        match self {
            Sink::Raw => DEFAULT_SUFFIX.to_string(),
            Sink::Transcode { format, .. } => normalize_suffix(format),
        }
    }
}

/// Decode one file and send the PCM to the configured sink
pub fn run_task(task: &FileTask, config: &RunConfig, decoder: &dyn Decoder) -> Outcome {
    let path = &task.path;

    let input = File::open(path).map_err(|source| TaskError::Open {
        path: path.clone(),
        source,
    })?;

    let options = DecodeOptions {
        sample_rate: config.sample_rate,
        extension_hint: path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase()),
    };

    // The decoder owns the handle; it is closed on return either way
    let audio = decoder
        .decode(input, &options)
        .map(|pcm| DecodedAudio {
            pcm,
            sample_rate: config.sample_rate,
        })
        .map_err(|source| TaskError::Decode {
            path: path.clone(),
            source,
        })?;

    let sink = Sink::for_config(config);
    let output = output_name(path, task.batch, &config.output, &sink.default_suffix())
        .ok_or_else(|| TaskError::Name { path: path.clone() })?;

    match sink {
        Sink::Raw => write_raw(&audio, &output).map_err(|source| TaskError::Write {
            path: path.clone(),
            output: output.clone(),
            source,
        })?,
        Sink::Transcode { transcoder, .. } => {
            if config.verbose {
                log::info!("Running: {}", transcoder.command_line(audio.sample_rate, &output));
            }
            transcoder
                .transcode(&audio.pcm, audio.sample_rate, &output)
                .map_err(|e| match e {
                    TranscodeError::Spawn(source) => TaskError::TranscodeSpawn {
                        path: path.clone(),
                        source,
                    },
                    TranscodeError::Exit {
                        status,
                        output: combined,
                    } => TaskError::TranscodeExit {
                        path: path.clone(),
                        status,
                        output: combined,
                    },
                })?;
        }
    }

    if config.verbose {
        log::info!("Generated: {}", output.display());
    }
    Ok(output)
}

/// Create or truncate `output` and write the whole buffer
///
/// Not atomic: a failed write may leave a partial file behind.
fn write_raw(audio: &DecodedAudio, output: &Path) -> std::io::Result<()> {
    let mut file = File::create(output)?;
    file.write_all(&audio.pcm)?;
    file.flush()
}
