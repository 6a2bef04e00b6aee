use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Result, SpeechError};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Named voice presets
    #[serde(default)]
    pub presets: HashMap<String, VoicePreset>,

    /// Provider-specific configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_encoding() -> String {
    "linear16".to_string()
}

fn default_container() -> String {
    "wav".to_string()
}

/// A named voice configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicePreset {
    /// Provider identifier (deepgram)
    pub provider: String,

    /// Voice/model identifier for the provider
    pub model: String,

    #[serde(default = "default_encoding")]
    pub encoding: String,

    #[serde(default = "default_container")]
    pub container: String,
}

/// Provider-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Custom base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| SpeechError::ConfigError("HOME not set".into()))?;
        Ok(PathBuf::from(home).join(".config/cli-programs/speech.toml"))
    }

    /// Get a preset by name
    pub fn get_preset(&self, name: &str) -> Result<&VoicePreset> {
        self.presets
            .get(name)
            .ok_or_else(|| SpeechError::InvalidPreset(name.to_string()))
    }

    /// Get provider config by provider name
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider)
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut presets = HashMap::new();

        presets.insert(
            "deepgram-luna".to_string(),
            VoicePreset {
                provider: "deepgram".to_string(),
                model: "aura-luna-en".to_string(),
                encoding: default_encoding(),
                container: default_container(),
            },
        );

        Self {
            presets,
            providers: HashMap::new(),
        }
    }
}
