//! Run configuration
//!
//! Contains:
//! - CliArgs: the raw command line
//! - RunConfig: the validated, immutable settings for one run
//! - ConfigError: everything that can stop a run before any file is touched

use clap::Parser;
use regex::bytes::Regex;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sample rate handed to the decoder and the transcoder when none is given
pub const DEFAULT_SAMPLE_RATE: u32 = 24000;

/// Transcoder looked up on PATH when `--ffmpeg` is not given
pub const DEFAULT_TRANSCODER: &str = "ffmpeg";

/// Command-line arguments for pcmdump
#[derive(Parser, Debug, Clone)]
#[command(name = "pcmdump")]
#[command(about = "Decode audio files to raw 16-bit PCM, optionally transcoding with ffmpeg")]
#[command(version)]
pub struct CliArgs {
    /// Input file, or input directory when --dir-pattern is given
    #[arg(short, long)]
    pub input: PathBuf,

    /// Treat --input as a directory and decode every file whose name matches
    /// this regular expression (subdirectories included)
    #[arg(short = 'd', long = "dir-pattern", value_name = "REGEX")]
    pub dir_pattern: Option<String>,

    /// Output sample rate in Hz
    #[arg(
        long,
        default_value_t = DEFAULT_SAMPLE_RATE,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub sample_rate: u32,

    /// Output file name (single file) or output suffix (batch)
    #[arg(short, long, value_name = "NAME")]
    pub output: Option<String>,

    /// Target audio format, e.g. mp3, wav, flac; requires ffmpeg
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Path to the ffmpeg binary
    #[arg(long, value_name = "PATH", env = "PCMDUMP_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,

    /// Print transcoder commands and per-file results
    #[arg(short, long)]
    pub verbose: bool,

    /// Also append debug logs to this file
    #[arg(long, value_name = "PATH", env = "PCMDUMP_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

/// Errors detected before any source file is opened
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("an input file is required (-i)")]
    MissingInput,

    #[error("cannot compile file pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("ffmpeg not found at {binary:?}; install it or pass --ffmpeg")]
    MissingTranscoder { binary: PathBuf },
}

/// Validated settings for one run
///
/// Built once in `main` and passed by reference to everything else.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Source file, or walk root in batch mode
    pub input: PathBuf,
    /// Compiled selection pattern; `Some` means batch mode
    pub pattern: Option<Regex>,
    pub sample_rate: u32,
    /// Explicit name (single file) or suffix (batch); empty when not given
    pub output: String,
    /// Target format for the transcode sink; `None` means raw PCM output
    pub format: Option<String>,
    /// Resolved transcoder binary, present whenever `format` is
    pub transcoder: Option<PathBuf>,
    pub verbose: bool,
}

impl RunConfig {
    /// Validate command-line arguments
    ///
    /// Checks run in this order: input present, transcoder resolvable (only
    /// when a format is requested), pattern compiles.
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        Self::from_args_with_path(args, std::env::var_os("PATH").as_deref())
    }

    /// Same as `from_args`, searching the given PATH value for the transcoder
    pub fn from_args_with_path(
        args: &CliArgs,
        path_var: Option<&OsStr>,
    ) -> Result<Self, ConfigError> {
        if args.input.as_os_str().is_empty() {
            return Err(ConfigError::MissingInput);
        }

        let format = args.format.clone().filter(|f| !f.is_empty());

        let transcoder = match format {
            Some(_) => {
                let binary = args
                    .ffmpeg
                    .clone()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_TRANSCODER));
                let resolved = find_transcoder(&binary, path_var)
                    .ok_or(ConfigError::MissingTranscoder { binary })?;
                Some(resolved)
            }
            None => None,
        };

        let pattern = match args.dir_pattern.as_deref() {
            Some(p) if !p.is_empty() => {
                Some(Regex::new(p).map_err(|source| ConfigError::Pattern {
                    pattern: p.to_string(),
                    source,
                })?)
            }
            _ => None,
        };

        Ok(Self {
            input: args.input.clone(),
            pattern,
            sample_rate: args.sample_rate,
            output: args.output.clone().unwrap_or_default(),
            format,
            transcoder,
            verbose: args.verbose,
        })
    }

    /// Whether files are selected by walking a directory
    pub fn is_batch(&self) -> bool {
        self.pattern.is_some()
    }
}

/// Resolve the transcoder binary
///
/// A value with a directory component must name an existing file. A bare
/// name is searched for in each directory of `path_var`.
pub fn find_transcoder(binary: &Path, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let has_dir = binary
        .parent()
        .is_some_and(|p| !p.as_os_str().is_empty());

    if has_dir {
        return is_executable(binary).then(|| binary.to_path_buf());
    }

    let path_var = path_var?;
    std::env::split_paths(path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| candidate_names(binary).map(move |name| dir.join(name)))
        .find(|candidate| is_executable(candidate))
}

fn candidate_names(binary: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    let with_exe = (!std::env::consts::EXE_SUFFIX.is_empty() && binary.extension().is_none())
        .then(|| {
            let mut name = binary.as_os_str().to_os_string();
            name.push(std::env::consts::EXE_SUFFIX);
            PathBuf::from(name)
        });
    std::iter::once(binary.to_path_buf()).chain(with_exe)
}

fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    let executable = {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    };

    #[cfg(not(unix))]
    let executable = true;

    executable
}
