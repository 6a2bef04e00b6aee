//! Audio buffers, WAV codec, resampling and audiobook assembly.

pub mod assembler;
pub mod ffmpeg;
pub mod resample;
pub mod voice;

use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::{Cursor, Read};
use std::path::Path;

pub use assembler::{ExportFormat, concatenate, export};
pub use ffmpeg::Ffmpeg;
pub use voice::{VoiceReference, prepare_voice_reference};

/// A decoded audio buffer: interleaved samples in [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl AudioSegment {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            channels,
            samples,
        }
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Downmix to a single channel by averaging each frame.
    pub fn to_mono(&self) -> AudioSegment {
        if self.channels <= 1 {
            return self.clone();
        }

        let channels = self.channels as usize;
        let samples = self
            .samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        AudioSegment::new(self.sample_rate, 1, samples)
    }

    /// Decode a WAV container held in memory.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self> {
        let reader = WavReader::new(Cursor::new(bytes)).context("Invalid WAV data")?;
        decode(reader)
    }

    /// Decode a WAV file.
    pub fn from_wav_file(path: &Path) -> Result<Self> {
        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file {}", path.display()))?;
        decode(reader)
    }

    /// Write as 16-bit PCM WAV.
    ///
    /// Samples are clamped to [-1, 1] and scaled by 32767.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let spec = WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut writer = WavWriter::create(path, spec)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        for &sample in &self.samples {
            writer.write_sample((sample.clamp(-1.0, 1.0) * 32767.0) as i16)?;
        }
        writer.finalize().context("Failed to finalize WAV file")?;

        Ok(())
    }
}

fn decode<R: Read>(mut reader: WavReader<R>) -> Result<AudioSegment> {
    let spec = reader.spec();
    let mut samples = Vec::with_capacity(reader.len() as usize);

    match spec.sample_format {
        SampleFormat::Float => {
            for sample in reader.samples::<f32>() {
                match sample {
                    Ok(s) => samples.push(s),
                    Err(e) if is_truncated(&e) => break,
                    Err(e) => return Err(e).context("Failed to decode WAV samples"),
                }
            }
        }
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            for sample in reader.samples::<i32>() {
                match sample {
                    Ok(s) => samples.push(s as f32 / scale),
                    Err(e) if is_truncated(&e) => break,
                    Err(e) => return Err(e).context("Failed to decode WAV samples"),
                }
            }
        }
    }

    Ok(AudioSegment::new(spec.sample_rate, spec.channels, samples))
}

// Streamed WAV responses may declare a longer data chunk than they carry.
// hound reports the short read as an IO error, not a format error.
fn is_truncated(err: &hound::Error) -> bool {
    matches!(err, hound::Error::IoError(_))
}
