//! Core `LanguageModel` trait and the shared `LlmError` type.
//!
//! Concrete backends live in [`crate::llm::gemini`] and
//! [`crate::llm::openai`]; the pipeline only ever sees
//! `Arc<dyn LanguageModel>`.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{ServiceConfig, ServiceProvider};
use crate::llm::gemini::GeminiClient;
use crate::llm::openai::OpenAiClient;
use crate::llm::profile::InstructionProfile;

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur while asking the service for a reply.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LlmError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The service answered with a non-success HTTP status.
    #[error("service returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse service response: {0}")]
    Parse(String),

    /// The service returned a response with no usable text content.
    #[error("service returned an empty response")]
    EmptyResponse,

    /// No API key in the config or the environment.
    #[error("no API key configured")]
    MissingCredential,
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// LanguageModel trait
// ---------------------------------------------------------------------------

/// Async request/response boundary to a hosted text-generation service.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn LanguageModel>`).
///
/// # Arguments
/// * `profile`   – style/behaviour constraint, sent as the system instruction.
/// * `utterance` – the user's text, sent as the content.
///
/// A successful return is the complete reply text, already trimmed and
/// guaranteed non-empty.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(
        &self,
        profile: InstructionProfile,
        utterance: &str,
    ) -> Result<String, LlmError>;
}

/// Build the backend selected by `config.provider`.
pub fn from_config(config: &ServiceConfig) -> Arc<dyn LanguageModel> {
    match config.provider {
        ServiceProvider::Gemini => Arc::new(GeminiClient::from_config(config)),
        ServiceProvider::OpenAiCompatible => Arc::new(OpenAiClient::from_config(config)),
    }
}

/// Build a `reqwest` client carrying the per-request timeout.
///
/// A default client is used as a last resort if the builder fails.
pub(crate) fn http_client(config: &ServiceConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(config.timeout())
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Turn a raw reply into the trimmed, non-empty text callers expect.
pub(crate) fn non_empty(text: &str) -> Result<String, LlmError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(LlmError::EmptyResponse)
    } else {
        Ok(trimmed.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_trims() {
        assert_eq!(non_empty("  Een leegte.\n").unwrap(), "Een leegte.");
    }

    #[test]
    fn non_empty_rejects_blank() {
        assert_eq!(non_empty(" \n\t").unwrap_err(), LlmError::EmptyResponse);
        assert_eq!(non_empty("").unwrap_err(), LlmError::EmptyResponse);
    }

    #[test]
    fn from_config_builds_each_provider() {
        let mut config = ServiceConfig::default();
        let _gemini = from_config(&config);

        config.provider = ServiceProvider::OpenAiCompatible;
        let _openai = from_config(&config);
    }

    #[test]
    fn status_error_display_carries_code() {
        let e = LlmError::Status {
            code: 403,
            body: "denied".into(),
        };
        assert!(e.to_string().contains("403"));
        assert!(e.to_string().contains("denied"));
    }
}
