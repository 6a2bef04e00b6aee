//! Shared speech-synthesis client library for the pdf-audiobook workspace
//!
//! Provides a unified interface over text-to-speech services:
//! - Deepgram (REST `/v1/speak`)
//! - Mock (scriptable, for tests)

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;

pub use config::{Config, ProviderConfig, VoicePreset};
pub use error::{Result, SpeechError};
pub use provider::{SpeechProvider, SpeechRequest, SpeechResponse};
pub use providers::{DeepgramProvider, MockProvider, ProviderKind, get_api_key, get_provider};
