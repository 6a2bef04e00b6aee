//! Voice reference preparation for voice cloning.
//!
//! The user's sample may be WAV or anything FFmpeg can decode. It is
//! downmixed to mono, resampled to the model rate and written as 16-bit
//! PCM; that normalized file is what the cloning model is conditioned on.

use super::resample::resample;
use super::{AudioSegment, Ffmpeg};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Sample rate the voice-cloning model expects for its reference audio.
pub const VOICE_SAMPLE_RATE: u32 = 22050;

/// A normalized mono voice sample on disk.
#[derive(Debug, Clone)]
pub struct VoiceReference {
    pub path: PathBuf,
    pub sample_rate: u32,
    pub frames: usize,
}

impl VoiceReference {
    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Decode, downmix and resample `input`, writing the result into `work_dir`.
pub fn prepare_voice_reference(
    input: &Path,
    work_dir: &Path,
    target_rate: u32,
    ffmpeg: &Ffmpeg,
) -> Result<VoiceReference> {
    let decoded = if is_wav(input) {
        AudioSegment::from_wav_file(input)?
    } else {
        let converted = work_dir.join("uploaded_voice.wav");
        ffmpeg
            .decode_to_wav(input, &converted)
            .with_context(|| format!("Could not decode {}", input.display()))?;
        AudioSegment::from_wav_file(&converted)?
    };

    if decoded.samples.is_empty() {
        anyhow::bail!("Voice sample {} contains no audio", input.display());
    }

    let mono = decoded.to_mono();
    let samples = if mono.sample_rate != target_rate {
        log::info!(
            "Resampling voice sample {} Hz -> {} Hz",
            mono.sample_rate,
            target_rate
        );
        resample(&mono.samples, mono.sample_rate, target_rate)?
    } else {
        mono.samples
    };

    let normalized = AudioSegment::new(target_rate, 1, samples);
    let path = work_dir.join("voice_reference.wav");
    normalized.write_wav(&path)?;

    Ok(VoiceReference {
        path,
        sample_rate: target_rate,
        frames: normalized.frames(),
    })
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("wav") || e.eq_ignore_ascii_case("wave"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::test_support::tone;
    use tempfile::TempDir;

    #[test]
    fn test_resamples_44100_mono_to_22050() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("me.wav");
        tone(44100, 44100).write_wav(&input).unwrap();

        let reference =
            prepare_voice_reference(&input, temp_dir.path(), VOICE_SAMPLE_RATE, &Ffmpeg::default())
                .unwrap();

        assert_eq!(reference.sample_rate, 22050);
        assert_eq!(reference.frames, 22050);

        let reader = hound::WavReader::open(&reference.path).unwrap();
        assert_eq!(reader.spec().sample_rate, 22050);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 22050);
    }

    #[test]
    fn test_downmixes_stereo() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("stereo.WAV");
        let frames = 2205;
        let samples: Vec<f32> = (0..frames).flat_map(|_| [0.25f32, 0.75f32]).collect();
        AudioSegment::new(22050, 2, samples)
            .write_wav(&input)
            .unwrap();

        let reference =
            prepare_voice_reference(&input, temp_dir.path(), VOICE_SAMPLE_RATE, &Ffmpeg::default())
                .unwrap();
        assert_eq!(reference.frames, frames);

        let decoded = AudioSegment::from_wav_file(&reference.path).unwrap();
        assert_eq!(decoded.channels, 1);
        assert!(decoded.samples.iter().all(|s| (s - 0.5).abs() < 1e-3));
    }

    #[test]
    fn test_empty_sample_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("silent.wav");
        AudioSegment::new(22050, 1, Vec::new())
            .write_wav(&input)
            .unwrap();

        let result =
            prepare_voice_reference(&input, temp_dir.path(), VOICE_SAMPLE_RATE, &Ffmpeg::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_corrupt_wav_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("broken.wav");
        std::fs::write(&input, b"RIFF....nope").unwrap();

        let result =
            prepare_voice_reference(&input, temp_dir.path(), VOICE_SAMPLE_RATE, &Ffmpeg::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_mp3_sample_goes_through_ffmpeg() {
        let ffmpeg = Ffmpeg::default();
        if !ffmpeg.is_available() {
            eprintln!("ffmpeg not found, skipping");
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        let wav = temp_dir.path().join("source.wav");
        let mp3 = temp_dir.path().join("me.mp3");
        tone(44100, 44100).write_wav(&wav).unwrap();
        ffmpeg.encode_mp3(&wav, &mp3).unwrap();

        let reference =
            prepare_voice_reference(&mp3, temp_dir.path(), VOICE_SAMPLE_RATE, &ffmpeg).unwrap();

        assert!(temp_dir.path().join("uploaded_voice.wav").is_file());
        assert_eq!(reference.sample_rate, 22050);
        assert!((reference.frames as i64 - 22050).abs() < 3000);

        let decoded = AudioSegment::from_wav_file(&reference.path).unwrap();
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.sample_rate, 22050);
    }
}
