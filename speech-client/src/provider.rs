use async_trait::async_trait;

use crate::error::Result;

/// Request to send to a speech-synthesis provider
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    /// Voice/model identifier (e.g. "aura-luna-en")
    pub model: String,
    /// Sample encoding (e.g. "linear16")
    pub encoding: String,
    /// Container wrapping the samples (e.g. "wav")
    pub container: String,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            encoding: "linear16".to_string(),
            container: "wav".to_string(),
        }
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }
}

/// Audio returned by a speech-synthesis provider
#[derive(Debug, Clone)]
pub struct SpeechResponse {
    /// Raw or containerized audio bytes, exactly as returned
    pub audio: Vec<u8>,
    pub content_type: Option<String>,
    pub model: String,
}

/// Trait for speech-synthesis providers
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize one piece of text
    async fn speak(&self, request: SpeechRequest) -> Result<SpeechResponse>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;
}
