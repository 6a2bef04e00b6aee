use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error(
        "API key not found for {provider}. Set {env_var} environment variable or add to config."
    )]
    MissingApiKey { provider: String, env_var: String },

    #[error("Authentication rejected by {provider} (HTTP {status_code}): {message}")]
    Unauthorized {
        provider: String,
        status_code: u16,
        message: String,
    },

    #[error("Malformed synthesis request (HTTP 400): {0}")]
    BadRequest(String),

    #[error("API error{}: {message}", status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid voice preset: {0}")]
    InvalidPreset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, SpeechError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_with_status() {
        let err = SpeechError::ApiError {
            message: "boom".to_string(),
            status_code: Some(500),
        };
        assert_eq!(err.to_string(), "API error (HTTP 500): boom");
    }

    #[test]
    fn test_api_error_display_without_status() {
        let err = SpeechError::ApiError {
            message: "boom".to_string(),
            status_code: None,
        };
        assert_eq!(err.to_string(), "API error: boom");
    }
}
