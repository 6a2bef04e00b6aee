//! Mock speech provider for testing
//!
//! Scriptable stand-in for a real provider: succeeds with fixed audio,
//! or fails on a chosen call so abort-on-failure paths can be exercised.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, SpeechError};
use crate::provider::{SpeechProvider, SpeechRequest, SpeechResponse};

/// A mock provider that records requests and can fail on demand
pub struct MockProvider {
    /// Zero-based call index that fails (None = never fail)
    fail_on_call: Option<usize>,
    /// Current call count
    call_count: AtomicUsize,
    /// Error message used for the failing call
    fail_message: String,
    /// Audio bytes returned on success
    audio: Vec<u8>,
    /// Texts received, in call order
    received: Mutex<Vec<String>>,
}

impl MockProvider {
    /// Create a provider that always returns the given audio
    pub fn always_succeeds(audio: Vec<u8>) -> Self {
        Self {
            fail_on_call: None,
            call_count: AtomicUsize::new(0),
            fail_message: String::new(),
            audio,
            received: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that returns audio until call `index`, which fails
    pub fn fails_on_call(index: usize, message: &str, audio: Vec<u8>) -> Self {
        Self {
            fail_on_call: Some(index),
            call_count: AtomicUsize::new(0),
            fail_message: message.to_string(),
            audio,
            received: Mutex::new(Vec::new()),
        }
    }

    /// Get the number of times speak() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Texts passed to speak(), in order
    pub fn received_texts(&self) -> Vec<String> {
        self.received
            .lock()
            .map(|texts| texts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SpeechProvider for MockProvider {
    async fn speak(&self, request: SpeechRequest) -> Result<SpeechResponse> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut texts) = self.received.lock() {
            texts.push(request.text.clone());
        }

        if self.fail_on_call == Some(call_num) {
            return Err(SpeechError::ApiError {
                message: self.fail_message.clone(),
                status_code: Some(500),
            });
        }

        Ok(SpeechResponse {
            audio: self.audio.clone(),
            content_type: Some("audio/wav".to_string()),
            model: request.model,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_succeeds() {
        let provider = MockProvider::always_succeeds(vec![1, 2, 3]);
        let result = provider
            .speak(SpeechRequest::new("hello", "aura-luna-en"))
            .await;
        assert_eq!(result.unwrap().audio, vec![1, 2, 3]);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.received_texts(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_fails_on_chosen_call() {
        let provider = MockProvider::fails_on_call(1, "service down", vec![0]);
        let request = SpeechRequest::new("text", "aura-luna-en");

        assert!(provider.speak(request.clone()).await.is_ok());
        let err = provider.speak(request.clone()).await.unwrap_err();
        assert!(err.to_string().contains("service down"));
        assert!(provider.speak(request).await.is_ok());
        assert_eq!(provider.call_count(), 3);
    }
}
