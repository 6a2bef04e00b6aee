//! Deepgram text-to-speech provider
//!
//! Talks to the `/v1/speak` REST endpoint. The request body carries only
//! the text; model, encoding and container travel as query parameters,
//! and the response body is the audio itself.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpeechError};
use crate::provider::{SpeechProvider, SpeechRequest, SpeechResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.deepgram.com";

/// Provider for the Deepgram speak API
pub struct DeepgramProvider {
    base_url: String,
    api_key: String,
    client: Client,
}

impl DeepgramProvider {
    /// Create a provider against the public Deepgram endpoint
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Create a provider against a custom endpoint (self-hosted, proxies, tests)
    pub fn with_base_url(base_url: &str, api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(SpeechError::MissingApiKey {
                provider: "Deepgram".to_string(),
                env_var: "DEEPGRAM_API_KEY".to_string(),
            });
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        })
    }
}

#[derive(Debug, Serialize)]
struct SpeakBody<'a> {
    text: &'a str,
}

// Deepgram has used both shapes for error bodies
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    err_msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl SpeechProvider for DeepgramProvider {
    async fn speak(&self, request: SpeechRequest) -> Result<SpeechResponse> {
        let url = format!("{}/v1/speak", self.base_url);

        let response = self
            .client
            .post(&url)
            .query(&[
                ("model", request.model.as_str()),
                ("encoding", request.encoding.as_str()),
                ("container", request.container.as_str()),
            ])
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&SpeakBody {
                text: &request.text,
            })
            .send()
            .await
            .map_err(|e| SpeechError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorResponse>(&error_text) {
                Ok(body) => body.err_msg.or(body.message).unwrap_or(error_text),
                Err(_) => error_text,
            };

            return Err(match status.as_u16() {
                401 | 403 => SpeechError::Unauthorized {
                    provider: "Deepgram".to_string(),
                    status_code: status.as_u16(),
                    message,
                },
                400 => SpeechError::BadRequest(message),
                code => SpeechError::ApiError {
                    message,
                    status_code: Some(code),
                },
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let audio = response
            .bytes()
            .await
            .map_err(|e| SpeechError::RequestFailed(format!("Failed to read audio body: {}", e)))?
            .to_vec();

        if audio.is_empty() {
            return Err(SpeechError::ApiError {
                message: "Empty audio response".to_string(),
                status_code: Some(status.as_u16()),
            });
        }

        log::debug!(
            "Deepgram returned {} bytes for {} characters",
            audio.len(),
            request.text.chars().count()
        );

        Ok(SpeechResponse {
            audio,
            content_type,
            model: request.model,
        })
    }

    fn name(&self) -> &'static str {
        "Deepgram"
    }
}
