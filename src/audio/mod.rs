// Audio module - decoding source files to PCM and sample rate conversion

pub mod decoder;
pub mod resample;

pub use decoder::{DecodeError, DecodeOptions, Decoder, SymphoniaDecoder};
