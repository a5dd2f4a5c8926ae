//! Sample rate conversion using rubato

use rubato::{FastFixedIn, PolynomialDegree, Resampler};

/// Resample mono audio from `input_rate` to `output_rate`
///
/// The whole buffer is processed as a single chunk, then the resampler is
/// flushed with silence and its output delay trimmed off the front, so the
/// result holds `input.len() * output_rate / input_rate` frames (rounded).
/// Returns a copy when the rates already match.
pub fn resample_mono(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>, String> {
    if input_rate == output_rate || input.is_empty() {
        return Ok(input.to_vec());
    }

    log::debug!(
        "Resampling {} frames from {}Hz to {}Hz",
        input.len(),
        input_rate,
        output_rate
    );

    let mut resampler = FastFixedIn::<f32>::new(
        output_rate as f64 / input_rate as f64,
        1.0,
        PolynomialDegree::Septic,
        input.len(),
        1,
    )
    .map_err(|e| format!("Failed to create resampler: {}", e))?;

    let delay = resampler.output_delay();
    let expected = expected_frames(input.len(), input_rate, output_rate);

    let mut output = resampler
        .process(&[input], None)
        .map_err(|e| format!("Resampling failed: {}", e))?
        .pop()
        .unwrap_or_default();

    // Push the tail still held in the resampler's buffer
    while output.len() < delay + expected {
        let tail = resampler
            .process_partial(None::<&[&[f32]]>, None)
            .map_err(|e| format!("Resampler flush failed: {}", e))?
            .pop()
            .unwrap_or_default();
        if tail.is_empty() {
            break;
        }
        output.extend(tail);
    }

    Ok(output.into_iter().skip(delay).take(expected).collect())
}

fn expected_frames(frames: usize, input_rate: u32, output_rate: u32) -> usize {
    let scaled = frames as u64 * output_rate as u64;
    ((scaled + input_rate as u64 / 2) / input_rate as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_is_passthrough() {
        let input = vec![0.1, -0.2, 0.3];
        assert_eq!(resample_mono(&input, 24000, 24000).unwrap(), input);
    }

    #[test]
    fn test_empty_input() {
        assert!(resample_mono(&[], 48000, 24000).unwrap().is_empty());
    }

    #[test]
    fn test_downsample_halves_length() {
        let input: Vec<f32> = (0..4800).map(|i| (i as f32 * 0.01).sin() * 0.5).collect();
        let output = resample_mono(&input, 48000, 24000).unwrap();
        assert_eq!(output.len(), 2400);
    }

    #[test]
    fn test_upsample_keeps_the_tail() {
        let input: Vec<f32> = (0..8000).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
        let output = resample_mono(&input, 8000, 24000).unwrap();
        assert_eq!(output.len(), 24000);
    }

    #[test]
    fn test_non_integer_ratio_length() {
        let input = vec![0.25f32; 8000];
        let output = resample_mono(&input, 44100, 24000).unwrap();
        assert_eq!(output.len(), expected_frames(8000, 44100, 24000));
        assert_eq!(output.len(), 4354);
    }

    #[test]
    fn test_delay_is_trimmed() {
        // A constant signal stays constant once the filter's leading delay is gone
        let input = vec![0.5f32; 4800];
        let output = resample_mono(&input, 48000, 24000).unwrap();
        let middle = &output[100..2300];
        assert!(middle.iter().all(|s| (s - 0.5).abs() < 0.01));
    }

    #[test]
    fn test_very_short_input_is_flushed() {
        let output = resample_mono(&[0.1, 0.2, 0.3], 8000, 24000).unwrap();
        assert_eq!(output.len(), 9);
    }
}
