//! Google Gemini generateContent client.

use crate::transport::send_json;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use studyforge_core::TokenUsage;
use studyforge_error::{ProviderError, ProviderErrorKind, StudyforgeResult};
use studyforge_interface::{GenerateRequest, GenerateResponse, ProviderDriver};
use tracing::{debug, instrument};

/// A text part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Text content
    #[serde(default)]
    pub text: Option<String>,
}

/// A turn in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// "user" or "model"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Parts of the turn
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Response length cap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// generateContent request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    /// Conversation
    pub contents: Vec<Content>,
    /// Sampling settings
    pub generation_config: GenerationConfig,
}

/// One candidate answer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Candidate {
    /// Candidate content
    pub content: Option<Content>,
}

/// Usage metadata reported by Gemini.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Prompt tokens
    #[serde(default)]
    pub prompt_token_count: u64,
    /// Candidate tokens
    #[serde(default)]
    pub candidates_token_count: u64,
}

/// generateContent response body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    /// Candidates; the first with text is used
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Reported usage
    pub usage_metadata: Option<UsageMetadata>,
}

impl GeminiResponse {
    /// Convert into the provider-neutral response.
    ///
    /// # Errors
    ///
    /// Returns a parse error when no candidate carries text.
    pub fn into_generate_response(self) -> StudyforgeResult<GenerateResponse> {
        let text = self
            .candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .find(|text| !text.is_empty())
            .ok_or_else(|| {
                ProviderError::new(ProviderErrorKind::Parse(
                    "Response contained no candidate text".to_string(),
                ))
            })?;
        Ok(GenerateResponse {
            text,
            reported_usage: self
                .usage_metadata
                .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count)),
        })
    }
}

/// Gemini API client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    temperature: Option<f32>,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Creates a client for `{base_url}/models/{model}:generateContent`.
    pub fn new(
        client: Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
    ) -> Self {
        let model = model.into();
        let endpoint = format!(
            "{}/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        );
        Self {
            client,
            api_key: api_key.into(),
            model,
            endpoint,
            temperature: None,
            timeout_secs: 60,
        }
    }

    /// Default sampling temperature when the request sets none.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Timeout reported on transport timeouts.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Full URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Converts a prompt to a generateContent request.
    pub fn build_request(&self, req: &GenerateRequest) -> GeminiRequest {
        GeminiRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(req.prompt.clone()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: req.temperature.or(self.temperature),
                max_output_tokens: req.max_tokens,
            },
        }
    }
}

#[async_trait]
impl ProviderDriver for GeminiClient {
    #[instrument(skip(self, req), fields(provider = "gemini", model = %self.model))]
    async fn generate(&self, req: &GenerateRequest) -> StudyforgeResult<GenerateResponse> {
        let body = self.build_request(req);
        debug!("Sending generateContent request");

        let response: GeminiResponse = send_json(
            self.client
                .post(&self.endpoint)
                .header("x-goog-api-key", &self.api_key)
                .json(&body),
            "gemini",
            self.timeout_secs,
        )
        .await?;

        response.into_generate_response()
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case() {
        let client = GeminiClient::new(
            Client::new(),
            "key",
            "gemini-2.0-flash",
            "https://generativelanguage.googleapis.com/v1beta",
        );
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
        let json =
            serde_json::to_value(client.build_request(&GenerateRequest::new("q").with_max_tokens(64)))
                .unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 64);
        assert_eq!(json["contents"][0]["parts"][0]["text"], "q");
    }

    #[test]
    fn candidate_text_converts() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Osmosis"}]}}],
                "usageMetadata":{"promptTokenCount":4,"candidatesTokenCount":1,"totalTokenCount":5}}"#,
        )
        .unwrap();
        let converted = response.into_generate_response().unwrap();
        assert_eq!(converted.text, "Osmosis");
        assert_eq!(converted.reported_usage, Some(TokenUsage::new(4, 1)));
    }
}
