//! Google Generative Language API backend.
//!
//! Calls `POST {base_url}/v1beta/models/{model}:generateContent` with the
//! instruction profile as `systemInstruction` and the utterance as the single
//! user turn.  All connection details come from [`ServiceConfig`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::llm::client::{http_client, non_empty, LanguageModel, LlmError};
use crate::llm::profile::InstructionProfile;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn reply_text(&self) -> Result<String, LlmError> {
        let text: String = self
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default();
        non_empty(&text)
    }
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Generative Language API client.
pub struct GeminiClient {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl GeminiClient {
    /// Build a client from service config; the HTTP client carries
    /// `config.timeout_secs`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            client: http_client(config),
            config: config.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn request_body<'a>(
        &self,
        profile: &'a InstructionProfile,
        utterance: &'a str,
    ) -> GenerateRequest<'a> {
        GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: profile.text(),
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: utterance }],
            }],
            generation_config: self
                .config
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(
        &self,
        profile: InstructionProfile,
        utterance: &str,
    ) -> Result<String, LlmError> {
        let key = self
            .config
            .resolve_api_key()
            .ok_or(LlmError::MissingCredential)?;

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", key)
            .json(&self.request_body(&profile, utterance))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        parsed.reply_text()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn client(temperature: Option<f32>) -> GeminiClient {
        GeminiClient::from_config(&ServiceConfig {
            base_url: "https://generativelanguage.googleapis.com/".into(),
            temperature,
            ..ServiceConfig::default()
        })
    }

    #[test]
    fn endpoint_names_model_and_trims_slash() {
        assert_eq!(
            client(None).endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn request_carries_profile_as_system_instruction() {
        let profile = InstructionProfile::from_static("wees stil");
        let c = client(None);
        let body = serde_json::to_value(c.request_body(&profile, "Wat is stilte?")).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "wees stil");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Wat is stilte?");
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn request_includes_temperature_when_set() {
        let profile = InstructionProfile::default();
        let c = client(Some(0.5));
        let body = serde_json::to_value(c.request_body(&profile, "hoi")).unwrap();
        assert_eq!(body["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn reply_text_joins_parts_of_first_candidate() {
        let raw = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Een leegte "}, {"text": "die luistert."}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.reply_text().unwrap(), "Een leegte die luistert.");
    }

    #[test]
    fn reply_without_candidates_is_empty_response() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        assert_eq!(parsed.reply_text().unwrap_err(), LlmError::EmptyResponse);
    }

    #[test]
    fn candidate_without_content_is_empty_response() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        assert_eq!(parsed.reply_text().unwrap_err(), LlmError::EmptyResponse);
    }

    #[test]
    fn client_is_object_safe() {
        let model: Box<dyn LanguageModel> = Box::new(client(None));
        drop(model);
    }
}
