//! Test fixtures shared by the unit tests
//!
//! Provides WAV generation for decoder tests, a fake decoder for pipeline
//! tests, and shell scripts that stand in for ffmpeg.

#![cfg(test)]

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::audio::{DecodeError, DecodeOptions, Decoder};
use crate::core::config::DEFAULT_SAMPLE_RATE;
use crate::core::RunConfig;

/// Decoder that accepts files starting with `pcm:` and returns the rest
///
/// Anything else is reported as malformed.
pub struct FakeDecoder;

impl Decoder for FakeDecoder {
    fn decode(&self, mut input: File, _options: &DecodeOptions) -> Result<Vec<u8>, DecodeError> {
        let mut data = Vec::new();
        input.read_to_end(&mut data)?;
        data.strip_prefix(b"pcm:")
            .map(|rest| rest.to_vec())
            .ok_or_else(|| DecodeError::Malformed("missing pcm: header".to_string()))
    }
}

/// A raw-output, single-file configuration rooted at `input`
pub fn test_config(input: &Path) -> RunConfig {
    RunConfig {
        input: input.to_path_buf(),
        pattern: None,
        sample_rate: DEFAULT_SAMPLE_RATE,
        output: String::new(),
        format: None,
        transcoder: None,
        verbose: false,
    }
}

/// Write a 16-bit PCM WAV file and return its path
pub fn write_wav(dir: &Path, name: &str, sample_rate: u32, channels: u16, samples: &[i16]) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).expect("Failed to create WAV");
    for &s in samples {
        writer.write_sample(s).expect("Failed to write sample");
    }
    writer.finalize().expect("Failed to finalize WAV");
    path
}

/// Write an executable `/bin/sh` script and return its path
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make script executable");
    path
}

/// Stand-in for ffmpeg that copies stdin to its last argument
#[cfg(unix)]
pub fn fake_ffmpeg(dir: &Path) -> PathBuf {
    write_script(dir, "fake-ffmpeg", "for last; do :; done\ncat > \"$last\"")
}
