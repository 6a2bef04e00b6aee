//! Speech provider implementations

mod deepgram;
pub mod mock;

pub use deepgram::DeepgramProvider;
pub use mock::MockProvider;

use crate::config::{ProviderConfig, VoicePreset};
use crate::error::{Result, SpeechError};
use crate::provider::SpeechProvider;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Deepgram,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "deepgram" => Ok(Self::Deepgram),
            _ => Err(SpeechError::UnknownProvider(s.to_string())),
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Deepgram => "DEEPGRAM_API_KEY",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Deepgram => "Deepgram",
        }
    }
}

/// Create a provider instance from a preset, optional config and an explicit key.
///
/// An explicit key wins over the config file, which wins over the environment.
pub fn get_provider(
    preset: &VoicePreset,
    provider_config: Option<&ProviderConfig>,
    explicit_key: Option<&str>,
) -> Result<Box<dyn SpeechProvider>> {
    let kind = ProviderKind::from_str(&preset.provider)?;

    match kind {
        ProviderKind::Deepgram => {
            let api_key = get_api_key(explicit_key, provider_config, kind)?;
            let provider = match provider_config.and_then(|c| c.base_url.as_deref()) {
                Some(url) => DeepgramProvider::with_base_url(url, api_key)?,
                None => DeepgramProvider::new(api_key)?,
            };
            Ok(Box::new(provider))
        }
    }
}

/// Resolve an API key from the flag, the config, or the environment
pub fn get_api_key(
    explicit_key: Option<&str>,
    config: Option<&ProviderConfig>,
    kind: ProviderKind,
) -> Result<String> {
    if let Some(key) = explicit_key.filter(|k| !k.trim().is_empty()) {
        return Ok(key.to_string());
    }

    if let Some(key) = config.and_then(|c| c.api_key.clone()) {
        return Ok(key);
    }

    std::env::var(kind.env_var()).map_err(|_| SpeechError::MissingApiKey {
        provider: kind.display_name().to_string(),
        env_var: kind.env_var().to_string(),
    })
}
