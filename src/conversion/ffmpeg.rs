//! FFmpeg subprocess handling for PCM transcoding

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

/// Errors from running the transcoder
#[derive(Error, Debug)]
pub enum TranscodeError {
    /// The process could not be started or waited on
    #[error("failed to run ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),

    /// The process ran but reported failure
    #[error("ffmpeg exited with {status}\noutput: {output}")]
    Exit { status: ExitStatus, output: String },
}

/// Runs ffmpeg with raw PCM on stdin
#[derive(Debug, Clone)]
pub struct Transcoder {
    binary: PathBuf,
}

impl Transcoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Build ffmpeg arguments
    ///
    /// -y            : Overwrite output file without asking
    /// -f s16le      : Input is raw little-endian signed 16-bit PCM
    /// -ar <rate>    : Input sample rate
    /// -i -          : Read input from stdin
    /// <output>      : Output file; ffmpeg picks the format from its extension
    pub fn args(&self, sample_rate: u32, output_path: &Path) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-f".into(),
            "s16le".into(),
            "-ar".into(),
            sample_rate.to_string().into(),
            "-i".into(),
            "-".into(),
            output_path.as_os_str().to_os_string(),
        ]
    }

    /// Human-readable command line, for logging
    pub fn command_line(&self, sample_rate: u32, output_path: &Path) -> String {
        std::iter::once(self.binary.as_os_str().to_os_string())
            .chain(self.args(sample_rate, output_path))
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Feed `pcm` to ffmpeg and wait for it to write `output_path`
    ///
    /// stdin is written from a helper thread while stdout and stderr are
    /// drained here, so a chatty ffmpeg cannot fill its pipes and stall.
    pub fn transcode(
        &self,
        pcm: &[u8],
        sample_rate: u32,
        output_path: &Path,
    ) -> Result<(), TranscodeError> {
        let mut child = Command::new(&self.binary)
            .args(self.args(sample_rate, output_path))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(TranscodeError::Spawn)?;

        let stdin = child.stdin.take();
        let output = std::thread::scope(|s| {
            s.spawn(move || {
                if let Some(mut stdin) = stdin {
                    // ffmpeg may exit early and close the pipe; its status tells us why
                    if let Err(e) = stdin.write_all(pcm) {
                        log::debug!("Writing PCM to ffmpeg stopped early: {}", e);
                    }
                }
            });
            child.wait_with_output()
        })
        .map_err(TranscodeError::Spawn)?;

        if output.status.success() {
            return Ok(());
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Err(TranscodeError::Exit {
            status: output.status,
            output: combined,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let transcoder = Transcoder::new("ffmpeg");
        let args = transcoder.args(24000, Path::new("out/a.mp3"));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec!["-y", "-f", "s16le", "-ar", "24000", "-i", "-", "out/a.mp3"]
        );
    }

    #[test]
    fn test_command_line() {
        let transcoder = Transcoder::new("/usr/bin/ffmpeg");
        assert_eq!(
            transcoder.command_line(8000, Path::new("a.wav")),
            "/usr/bin/ffmpeg -y -f s16le -ar 8000 -i - a.wav"
        );
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let transcoder = Transcoder::new("/nonexistent/ffmpeg");
        let result = transcoder.transcode(&[0, 0], 24000, Path::new("unused.mp3"));
        assert!(matches!(result, Err(TranscodeError::Spawn(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_stdin_reaches_output() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let script = crate::test_fixtures::fake_ffmpeg(temp_dir.path());
        let output = temp_dir.path().join("a.wav");

        let pcm: Vec<u8> = (0..=255).cycle().take(200_000).collect();
        Transcoder::new(&script)
            .transcode(&pcm, 24000, &output)
            .unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), pcm);
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_carries_output() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let script = crate::test_fixtures::write_script(
            temp_dir.path(),
            "broken-ffmpeg",
            "echo 'to stdout'\necho 'Unknown encoder' >&2\nexit 3",
        );

        let err = Transcoder::new(&script)
            .transcode(&[1, 2, 3, 4], 24000, &temp_dir.path().join("a.mp3"))
            .unwrap_err();

        match err {
            TranscodeError::Exit { status, output } => {
                assert_eq!(status.code(), Some(3));
                assert!(output.contains("to stdout"));
                assert!(output.contains("Unknown encoder"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
