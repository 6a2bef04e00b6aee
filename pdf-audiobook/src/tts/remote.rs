//! Remote TTS backend built on a speech-client provider.

use super::SpeechBackend;
use crate::audio::AudioSegment;
use crate::text::TextChunk;
use anyhow::{Context, Result};
use async_trait::async_trait;
use speech_client::{SpeechProvider, SpeechRequest, VoicePreset};
use std::sync::Arc;

/// Sends each chunk to a hosted TTS service and decodes the returned WAV.
pub struct RemoteBackend {
    provider: Arc<dyn SpeechProvider>,
    preset: VoicePreset,
}

impl RemoteBackend {
    /// The preset must ask for a WAV container; other containers cannot be
    /// decoded into segments.
    pub fn new(provider: Arc<dyn SpeechProvider>, preset: VoicePreset) -> Result<Self> {
        if !preset.container.eq_ignore_ascii_case("wav") {
            anyhow::bail!(
                "Voice preset container '{}' is not supported; use 'wav'",
                preset.container
            );
        }
        Ok(Self { provider, preset })
    }
}

#[async_trait]
impl SpeechBackend for RemoteBackend {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn synthesize(&self, chunk: &TextChunk) -> Result<AudioSegment> {
        let request = SpeechRequest::new(chunk.text.clone(), self.preset.model.clone())
            .with_encoding(self.preset.encoding.clone())
            .with_container(self.preset.container.clone());

        let response = self.provider.speak(request).await?;
        log::debug!(
            "Chunk {} returned {} bytes ({})",
            chunk.index + 1,
            response.audio.len(),
            response.content_type.as_deref().unwrap_or("unknown type")
        );

        AudioSegment::from_wav_bytes(&response.audio)
            .with_context(|| format!("Could not decode audio for chunk {}", chunk.index + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::test_support::{tone, wav_bytes};
    use crate::tts::synthesize_chunks;
    use crate::text::chunk_text;
    use speech_client::MockProvider;

    fn preset() -> VoicePreset {
        VoicePreset {
            provider: "deepgram".to_string(),
            model: "aura-luna-en".to_string(),
            encoding: "linear16".to_string(),
            container: "wav".to_string(),
        }
    }

    #[tokio::test]
    async fn test_synthesize_decodes_wav() {
        let audio = wav_bytes(&tone(24000, 240));
        let provider = Arc::new(MockProvider::always_succeeds(audio));
        let backend = RemoteBackend::new(provider.clone(), preset()).unwrap();

        let segment = backend
            .synthesize(&TextChunk::new(0, "Hello.".to_string()))
            .await
            .unwrap();
        assert_eq!(segment.sample_rate, 24000);
        assert_eq!(segment.frames(), 240);
        assert_eq!(provider.received_texts(), vec!["Hello.".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_on_third_chunk_stops_requests() {
        let audio = wav_bytes(&tone(24000, 100));
        let provider = Arc::new(MockProvider::fails_on_call(2, "HTTP 500", audio));
        let backend = RemoteBackend::new(provider.clone(), preset()).unwrap();

        let chunks = chunk_text("aaaabbbbccccddddeeee", 4);
        let run = synthesize_chunks(&backend, &chunks).await;

        assert_eq!(run.segments.len(), 2);
        assert_eq!(run.failure.as_ref().map(|f| f.index), Some(2));
        assert_eq!(provider.call_count(), 3);
        assert_eq!(
            provider.received_texts(),
            vec!["aaaa".to_string(), "bbbb".to_string(), "cccc".to_string()]
        );
    }

    #[tokio::test]
    async fn test_undecodable_audio_is_chunk_error() {
        let provider = Arc::new(MockProvider::always_succeeds(b"not audio".to_vec()));
        let backend = RemoteBackend::new(provider, preset()).unwrap();

        let err = backend
            .synthesize(&TextChunk::new(4, "Hi".to_string()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("chunk 5"));
    }

    #[test]
    fn test_rejects_non_wav_container() {
        let mut mp3 = preset();
        mp3.container = "mp3".to_string();
        let provider = Arc::new(MockProvider::always_succeeds(Vec::new()));
        assert!(RemoteBackend::new(provider, mp3).is_err());
    }
}
