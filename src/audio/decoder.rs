//! Decoding source files to raw PCM
//!
//! The pipeline only sees the `Decoder` trait. `SymphoniaDecoder` is the
//! implementation used by the binary: it decodes any container symphonia recognises
//! and produces mono little-endian 16-bit PCM at the requested rate.

use std::fs::File;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

use super::resample::resample_mono;

/// Errors from the decode step
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported stream: {0}")]
    Unsupported(String),

    #[error("malformed stream: {0}")]
    Malformed(String),

    #[error("resample error: {0}")]
    Resample(String),
}

/// Parameters for one decode call
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Sample rate of the produced PCM, in Hz
    pub sample_rate: u32,
    /// File extension of the source, used to speed up format probing
    pub extension_hint: Option<String>,
}

/// Turns an opened source file into little-endian 16-bit PCM
///
/// The file is taken by value so it is closed when decoding finishes,
/// whether or not it succeeded.
pub trait Decoder {
    fn decode(&self, input: File, options: &DecodeOptions) -> Result<Vec<u8>, DecodeError>;
}

/// Decoder backed by symphonia's format probe and codec registry
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl Decoder for SymphoniaDecoder {
    fn decode(&self, input: File, options: &DecodeOptions) -> Result<Vec<u8>, DecodeError> {
        let mss = MediaSourceStream::new(Box::new(input), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = &options.extension_hint {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| DecodeError::Unsupported(e.to_string()))?;

        let mut format = probed.format;
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| DecodeError::Unsupported("no audio track".to_string()))?;

        let track_id = track.id;
        let mut native_rate = track.codec_params.sample_rate;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::Unsupported(e.to_string()))?;

        let mut mono: Vec<f32> = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(SymphoniaError::IoError(e)) => return Err(DecodeError::Io(e)),
                Err(e) => return Err(DecodeError::Malformed(e.to_string())),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    log::debug!("Skipping corrupt packet: {}", e);
                    continue;
                }
                Err(e) => return Err(DecodeError::Malformed(e.to_string())),
            };

            let spec = *decoded.spec();
            native_rate.get_or_insert(spec.rate);

            let channels = spec.channels.count();
            let needed = decoded.capacity() * channels;
            if sample_buf.as_ref().is_none_or(|b| b.capacity() < needed) {
                sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
            }

            if let Some(buf) = sample_buf.as_mut() {
                buf.copy_interleaved_ref(decoded);
                downmix_into(buf.samples(), channels, &mut mono);
            }
        }

        let native_rate = native_rate
            .ok_or_else(|| DecodeError::Malformed("sample rate not specified".to_string()))?;

        let resampled =
            resample_mono(&mono, native_rate, options.sample_rate).map_err(DecodeError::Resample)?;

        Ok(to_s16le(&resampled))
    }
}

/// Average interleaved channels into one, appending to `out`
fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}

/// Quantise to little-endian signed 16-bit
pub fn to_s16le(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|s| {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
            v.to_le_bytes()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::write_wav;
    use tempfile::TempDir;

    fn options(sample_rate: u32) -> DecodeOptions {
        DecodeOptions {
            sample_rate,
            extension_hint: Some("wav".to_string()),
        }
    }

    fn samples(pcm: &[u8]) -> Vec<i16> {
        pcm.chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect()
    }

    #[test]
    fn test_to_s16le() {
        assert_eq!(to_s16le(&[0.0]), vec![0, 0]);
        assert_eq!(to_s16le(&[1.0]), i16::MAX.to_le_bytes().to_vec());
        assert_eq!(to_s16le(&[2.0, -2.0]), [i16::MAX.to_le_bytes(), (-i16::MAX).to_le_bytes()].concat());
    }

    #[test]
    fn test_downmix_averages_channels() {
        let mut out = Vec::new();
        downmix_into(&[0.5, 0.1, -0.5, -0.1], 2, &mut out);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.3).abs() < 1e-6);
        assert!((out[1] + 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_decode_mono_wav_at_native_rate() {
        let temp_dir = TempDir::new().unwrap();
        let source: Vec<i16> = (0..2400).map(|i| ((i % 100) * 100) as i16).collect();
        let path = write_wav(temp_dir.path(), "tone.wav", 24000, 1, &source);

        let pcm = SymphoniaDecoder
            .decode(File::open(&path).unwrap(), &options(24000))
            .unwrap();

        assert_eq!(pcm.len(), source.len() * 2);
        let decoded = samples(&pcm);
        for (got, want) in decoded.iter().zip(&source) {
            assert!((got - want).abs() <= 1, "got {} want {}", got, want);
        }
    }

    #[test]
    fn test_decode_stereo_wav_is_downmixed() {
        let temp_dir = TempDir::new().unwrap();
        // Left at 8000, right at 0: mono should sit around 4000
        let source: Vec<i16> = (0..1000).flat_map(|_| [8000i16, 0]).collect();
        let path = write_wav(temp_dir.path(), "stereo.wav", 16000, 2, &source);

        let pcm = SymphoniaDecoder
            .decode(File::open(&path).unwrap(), &options(16000))
            .unwrap();

        let decoded = samples(&pcm);
        assert_eq!(decoded.len(), 1000);
        assert!(decoded.iter().all(|s| (s - 4000).abs() <= 1));
    }

    #[test]
    fn test_decode_resamples_to_requested_rate() {
        let temp_dir = TempDir::new().unwrap();
        let source: Vec<i16> = (0..4800).map(|i| ((i as f32 * 0.05).sin() * 10000.0) as i16).collect();
        let path = write_wav(temp_dir.path(), "hi.wav", 48000, 1, &source);

        let pcm = SymphoniaDecoder
            .decode(File::open(&path).unwrap(), &options(24000))
            .unwrap();

        let frames = pcm.len() / 2;
        assert!(frames.abs_diff(2400) <= 16, "got {} frames", frames);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("noise.bin");
        std::fs::write(&path, b"definitely not audio").unwrap();

        let result = SymphoniaDecoder.decode(
            File::open(&path).unwrap(),
            &DecodeOptions {
                sample_rate: 24000,
                extension_hint: None,
            },
        );
        assert!(matches!(result, Err(DecodeError::Unsupported(_))));
    }
}
