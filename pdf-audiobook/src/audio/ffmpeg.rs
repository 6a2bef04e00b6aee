//! FFmpeg invocation for container decoding and MP3 encoding.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Handle on an FFmpeg executable.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    program: PathBuf,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
        }
    }
}

impl Ffmpeg {
    /// Use the configured executable if it exists, otherwise `ffmpeg` from PATH.
    pub fn from_config(path: Option<&Path>) -> Self {
        match path {
            Some(p) if p.exists() => Self {
                program: p.to_path_buf(),
            },
            Some(p) => {
                log::warn!(
                    "Configured ffmpeg {} not found, falling back to PATH",
                    p.display()
                );
                Self::default()
            }
            None => Self::default(),
        }
    }

    fn command(&self) -> Command {
        Command::new(&self.program)
    }

    /// Check if FFmpeg runs.
    pub fn is_available(&self) -> bool {
        self.command()
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Decode any container FFmpeg understands into 16-bit PCM WAV.
    pub fn decode_to_wav(&self, input: &Path, output: &Path) -> Result<()> {
        let result = self
            .command()
            .args(["-y", "-v", "error", "-i"])
            .arg(input)
            .args(["-f", "wav", "-acodec", "pcm_s16le"])
            .arg(output)
            .output()
            .context("Failed to run ffmpeg")?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            anyhow::bail!("ffmpeg decode failed: {}", stderr.trim());
        }

        Ok(())
    }

    /// Encode a WAV file as MP3.
    pub fn encode_mp3(&self, input: &Path, output: &Path) -> Result<()> {
        let result = self
            .command()
            .args(["-y", "-v", "error", "-i"])
            .arg(input)
            .args(["-codec:a", "libmp3lame", "-q:a", "2"])
            .arg(output)
            .output()
            .context("Failed to run ffmpeg")?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            anyhow::bail!("ffmpeg MP3 encoding failed: {}", stderr.trim());
        }

        Ok(())
    }
}
