//! Audiobook assembly: ordered concatenation and export.

use super::{AudioSegment, Ffmpeg};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tempfile::TempDir;

/// Container/codec of an exported artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Wav,
    Mp3,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Wav => "wav",
            ExportFormat::Mp3 => "mp3",
        }
    }
}

/// Join segments end to end in the given order.
///
/// No gaps or crossfades are inserted. Every segment must share the first
/// segment's sample rate and channel count.
pub fn concatenate(segments: &[AudioSegment]) -> Result<AudioSegment> {
    let first = match segments.first() {
        Some(s) => s,
        None => anyhow::bail!("No audio segments provided"),
    };

    let total: usize = segments.iter().map(|s| s.samples.len()).sum();
    let mut samples = Vec::with_capacity(total);

    for (i, segment) in segments.iter().enumerate() {
        if segment.sample_rate != first.sample_rate || segment.channels != first.channels {
            anyhow::bail!(
                "Segment {} is {} Hz/{} ch, expected {} Hz/{} ch",
                i,
                segment.sample_rate,
                segment.channels,
                first.sample_rate,
                first.channels
            );
        }
        samples.extend_from_slice(&segment.samples);
    }

    Ok(AudioSegment::new(first.sample_rate, first.channels, samples))
}

/// Write an assembled segment to `output_path` in the requested format.
pub fn export(
    segment: &AudioSegment,
    output_path: &Path,
    format: ExportFormat,
    ffmpeg: &Ffmpeg,
) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match format {
        ExportFormat::Wav => segment.write_wav(output_path),
        ExportFormat::Mp3 => {
            let temp_dir = TempDir::new()?;
            let wav_path = temp_dir.path().join("assembled.wav");
            segment.write_wav(&wav_path)?;
            ffmpeg
                .encode_mp3(&wav_path, output_path)
                .with_context(|| format!("Failed to export {}", output_path.display()))
        }
    }
}
