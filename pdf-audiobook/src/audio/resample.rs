//! Band-limited resampling of mono buffers using Rubato.

use anyhow::{Context, Result};
use rubato::{FftFixedIn, Resampler};

/// Input frames fed to the FFT resampler per call.
const CHUNK_SIZE: usize = 1024;

/// Resample a mono buffer from `from_rate` to `to_rate`.
///
/// The result holds exactly `ceil(len * to_rate / from_rate)` samples:
/// the filter delay is trimmed from the front and the tail is flushed.
pub fn resample(input: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == 0 || to_rate == 0 {
        anyhow::bail!("Invalid sample rate conversion {} -> {}", from_rate, to_rate);
    }

    if from_rate == to_rate || input.is_empty() {
        return Ok(input.to_vec());
    }

    let expected = (input.len() as u64 * to_rate as u64).div_ceil(from_rate as u64) as usize;

    let mut resampler =
        FftFixedIn::<f64>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, 2, 1)
            .context("Failed to initialize resampler")?;
    let delay = resampler.output_delay();

    let samples: Vec<f64> = input.iter().map(|&s| s as f64).collect();
    let mut output: Vec<f64> = Vec::with_capacity(expected + delay);
    let mut pos = 0;

    while pos + resampler.input_frames_next() <= samples.len() {
        let needed = resampler.input_frames_next();
        let frame = [&samples[pos..pos + needed]];
        let out = resampler
            .process(&frame[..], None)
            .context("Resampling failed")?;
        output.extend_from_slice(&out[0]);
        pos += needed;
    }

    if pos < samples.len() {
        let frame = [&samples[pos..]];
        let out = resampler
            .process_partial(Some(&frame[..]), None)
            .context("Resampling failed")?;
        output.extend_from_slice(&out[0]);
    }

    // Flush what is still inside the filter
    while output.len() < expected + delay {
        let out = resampler
            .process_partial::<&[f64]>(None, None)
            .context("Resampling failed")?;
        if out[0].is_empty() {
            break;
        }
        output.extend_from_slice(&out[0]);
    }

    let mut result: Vec<f32> = output
        .into_iter()
        .skip(delay)
        .take(expected)
        .map(|s| s as f32)
        .collect();
    result.resize(expected, 0.0);

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::test_support::tone;

    #[test]
    fn test_halves_sample_count() {
        let input = tone(44100, 44100);
        let output = resample(&input.samples, 44100, 22050).unwrap();
        assert_eq!(output.len(), 22050);
    }

    #[test]
    fn test_uneven_length_rounds_up() {
        let input = tone(44100, 1001);
        let output = resample(&input.samples, 44100, 22050).unwrap();
        assert_eq!(output.len(), 501);
    }

    #[test]
    fn test_upsamples() {
        let input = tone(16000, 160);
        let output = resample(&input.samples, 16000, 48000).unwrap();
        assert_eq!(output.len(), 480);
    }

    #[test]
    fn test_same_rate_is_identity() {
        let input = tone(22050, 300);
        let output = resample(&input.samples, 22050, 22050).unwrap();
        assert_eq!(output, input.samples);
    }

    #[test]
    fn test_preserves_signal_level() {
        let input = tone(44100, 44100);
        let output = resample(&input.samples, 44100, 22050).unwrap();
        let peak = output[2000..20000]
            .iter()
            .fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.4 && peak < 0.6, "unexpected peak {}", peak);
    }

    #[test]
    fn test_rejects_zero_rate() {
        assert!(resample(&[0.0; 10], 0, 22050).is_err());
    }
}
