//! OpenAI-compatible chat-completions backend.
//!
//! Calls any `/v1/chat/completions` endpoint — OpenAI, Groq, Ollama (OpenAI
//! mode), LM Studio, vLLM.  The instruction profile becomes the system
//! message and the utterance the single user message.

use async_trait::async_trait;

use crate::config::ServiceConfig;
use crate::llm::client::{http_client, non_empty, LanguageModel, LlmError};
use crate::llm::profile::InstructionProfile;

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// The `Authorization: Bearer …` header is attached only when a credential
/// resolves, so local providers without authentication work unchanged.
pub struct OpenAiClient {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl OpenAiClient {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            client: http_client(config),
            config: config.clone(),
        }
    }

    fn request_body(&self, profile: &InstructionProfile, utterance: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": profile.text() },
                { "role": "user",   "content": utterance      }
            ],
            "stream": false
        });
        if let Some(temperature) = self.config.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        body
    }
}

/// Pull `choices[0].message.content` out of a chat-completions response.
fn reply_text(json: &serde_json::Value) -> Result<String, LlmError> {
    let content = json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or(LlmError::EmptyResponse)?;
    non_empty(content)
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn generate(
        &self,
        profile: InstructionProfile,
        utterance: &str,
    ) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let mut req = self
            .client
            .post(&url)
            .json(&self.request_body(&profile, utterance));

        if let Some(key) = self.config.resolve_api_key() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        reply_text(&json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
