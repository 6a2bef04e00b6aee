//! pdf-audio configuration management.

use crate::cache::CachePolicy;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_CHUNK_SIZE: usize = crate::text::chunker::DEFAULT_CHUNK_SIZE;
const DEFAULT_CLONE_MODEL: &str = "tts_models/multilingual/multi-dataset/your_tts";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudiobookConfig {
    /// Directory for generated audiobooks and the extracted text
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Characters per TTS request
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Voice preset from speech.toml used by the remote backend
    #[serde(default = "default_remote_preset")]
    pub remote_preset: String,

    /// Coqui model name for voice cloning
    #[serde(default = "default_clone_model")]
    pub clone_model: String,

    /// Language tag passed to the cloning model
    #[serde(default = "default_language")]
    pub language: String,

    /// Sample rate of the prepared voice reference
    #[serde(default = "default_voice_sample_rate")]
    pub voice_sample_rate: u32,

    /// Reuse existing artifacts instead of regenerating
    #[serde(default = "default_reuse_existing")]
    pub reuse_existing: bool,

    #[serde(default)]
    pub cache_policy: CachePolicy,

    /// Filename prefix of remote-TTS artifacts
    #[serde(default = "default_remote_prefix")]
    pub remote_prefix: String,

    /// Filename prefix of voice-cloned artifacts
    #[serde(default = "default_cloned_prefix")]
    pub cloned_prefix: String,

    /// Rewrite curly quotes, long dashes and ellipses to ASCII before filtering
    #[serde(default)]
    pub fold_typography: bool,

    /// Extra site-packages directory holding the Coqui TTS install
    #[serde(default)]
    pub python_site_packages: Option<PathBuf>,

    /// FFmpeg executable. None means `ffmpeg` from PATH.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_remote_preset() -> String {
    "deepgram-luna".to_string()
}

fn default_clone_model() -> String {
    DEFAULT_CLONE_MODEL.to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_voice_sample_rate() -> u32 {
    crate::audio::voice::VOICE_SAMPLE_RATE
}

fn default_reuse_existing() -> bool {
    true
}

fn default_remote_prefix() -> String {
    "audiobook_deepgram_tts".to_string()
}

fn default_cloned_prefix() -> String {
    "audiobook_yourtts_cloned".to_string()
}

impl Default for AudiobookConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            chunk_size: default_chunk_size(),
            remote_preset: default_remote_preset(),
            clone_model: default_clone_model(),
            language: default_language(),
            voice_sample_rate: default_voice_sample_rate(),
            reuse_existing: default_reuse_existing(),
            cache_policy: CachePolicy::default(),
            remote_prefix: default_remote_prefix(),
            cloned_prefix: default_cloned_prefix(),
            fold_typography: false,
            python_site_packages: None,
            ffmpeg_path: None,
        }
    }
}

impl AudiobookConfig {
    /// Get the config file path: ~/.config/cli-programs/pdf-audio.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("pdf-audio.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: AudiobookConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AudiobookConfig::default();
        assert_eq!(config.chunk_size, 2000);
        assert_eq!(config.voice_sample_rate, 22050);
        assert_eq!(config.language, "en");
        assert!(config.reuse_existing);
        assert_eq!(config.cache_policy, CachePolicy::Newest);
        assert!(!config.fold_typography);
        assert!(config.ffmpeg_path.is_none());
    }

    #[test]
    fn test_config_path() {
        let path = AudiobookConfig::config_path().unwrap();
        assert!(path.ends_with("cli-programs/pdf-audio.toml"));
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
output_dir = "/tmp/books"
chunk_size = 1500
language = "pt-br"
reuse_existing = false
cache_policy = "keyed"
remote_prefix = "life_30_deepgram_tts"
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
"#;
        let config: AudiobookConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/books"));
        assert_eq!(config.chunk_size, 1500);
        assert_eq!(config.language, "pt-br");
        assert!(!config.reuse_existing);
        assert_eq!(config.cache_policy, CachePolicy::Keyed);
        assert_eq!(config.remote_prefix, "life_30_deepgram_tts");
        assert_eq!(config.cloned_prefix, "audiobook_yourtts_cloned");
        assert_eq!(
            config.ffmpeg_path,
            Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
        );
    }

    #[test]
    fn test_parse_empty_config() {
        let config: AudiobookConfig = toml::from_str("").unwrap();
        assert_eq!(config.chunk_size, 2000);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.clone_model, DEFAULT_CLONE_MODEL);
    }
}
