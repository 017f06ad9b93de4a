//! Client for OpenAI-style chat completion endpoints.
//!
//! OpenAI, Groq, OpenRouter and self-hosted gateways all speak this format;
//! they differ only in base URL.

use crate::transport::send_json;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use studyforge_core::TokenUsage;
use studyforge_error::{ProviderError, ProviderErrorKind, StudyforgeResult};
use studyforge_interface::{GenerateRequest, GenerateResponse, ProviderDriver};
use tracing::{debug, instrument};

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user" or "assistant"
    pub role: String,
    /// Message text
    #[serde(default)]
    pub content: Option<String>,
}

/// Chat completion request body.
#[derive(Debug, Clone, PartialEq, Serialize, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into))]
pub struct ChatCompletionRequest {
    /// Model identifier
    model: String,
    /// Conversation
    messages: Vec<ChatMessage>,
    /// Sampling temperature
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Response length cap
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl ChatCompletionRequest {
    /// Creates a new builder.
    pub fn builder() -> ChatCompletionRequestBuilder {
        ChatCompletionRequestBuilder::default()
    }
}

/// One completion choice.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatChoice {
    /// Generated message
    pub message: ChatMessage,
}

/// Token counts reported by the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ChatUsage {
    /// Prompt tokens
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Completion tokens
    #[serde(default)]
    pub completion_tokens: u64,
}

/// Chat completion response body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatCompletionResponse {
    /// Choices; the first is used
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    /// Reported usage
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

impl ChatCompletionResponse {
    /// Convert into the provider-neutral response.
    ///
    /// # Errors
    ///
    /// Returns a parse error when no choice carries text.
    pub fn into_generate_response(self) -> StudyforgeResult<GenerateResponse> {
        let text = self
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or_else(|| {
                ProviderError::new(ProviderErrorKind::Parse(
                    "Response contained no message content".to_string(),
                ))
            })?;
        Ok(GenerateResponse {
            text,
            reported_usage: self
                .usage
                .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
        })
    }
}

/// Generic client for OpenAI-compatible chat completion APIs.
#[derive(Debug, Clone)]
pub struct OpenAICompatibleClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    provider_name: &'static str,
    temperature: Option<f32>,
    timeout_secs: u64,
}

impl OpenAICompatibleClient {
    /// Creates a client for `{base_url}/chat/completions`.
    pub fn new(
        client: Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
        provider_name: &'static str,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            provider_name,
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

    /// Build the request body for a prompt.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the builder rejects the input.
    pub fn build_request(&self, req: &GenerateRequest) -> StudyforgeResult<ChatCompletionRequest> {
        ChatCompletionRequest::builder()
            .model(self.model.clone())
            .messages(vec![ChatMessage {
                role: "user".to_string(),
                content: Some(req.prompt.clone()),
            }])
            .temperature(req.temperature.or(self.temperature))
            .max_tokens(req.max_tokens)
            .build()
            .map_err(|e| {
                ProviderError::new(ProviderErrorKind::InvalidConfiguration(e.to_string())).into()
            })
    }
}

#[async_trait]
impl ProviderDriver for OpenAICompatibleClient {
    #[instrument(skip(self, req), fields(provider = self.provider_name, model = %self.model))]
    async fn generate(&self, req: &GenerateRequest) -> StudyforgeResult<GenerateResponse> {
        let body = self.build_request(req)?;
        debug!(endpoint = %self.endpoint, "Sending chat completion request");

        let response: ChatCompletionResponse = send_json(
            self.client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body),
            self.provider_name,
            self.timeout_secs,
        )
        .await?;

        response.into_generate_response()
    }

    fn provider_name(&self) -> &'static str {
        self.provider_name
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAICompatibleClient {
        OpenAICompatibleClient::new(
            Client::new(),
            "sk",
            "gpt-4o-mini",
            "https://api.openai.com/v1/",
            "openai",
        )
        .with_temperature(Some(0.2))
    }

    #[test]
    fn endpoint_joins_base_url() {
        assert_eq!(
            client().endpoint(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn request_prefers_call_temperature() {
        let body = client()
            .build_request(&GenerateRequest::new("hi").with_temperature(0.9))
            .unwrap();
        assert_eq!(*body.temperature(), Some(0.9));

        let body = client().build_request(&GenerateRequest::new("hi")).unwrap();
        assert_eq!(*body.temperature(), Some(0.2));
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert_eq!(json["messages"][0]["content"], "hi");
    }

    #[test]
    fn response_with_usage_converts() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Mitochondria"}}],
                "usage":{"prompt_tokens":12,"completion_tokens":3,"total_tokens":15}}"#,
        )
        .unwrap();
        let converted = response.into_generate_response().unwrap();
        assert_eq!(converted.text, "Mitochondria");
        assert_eq!(converted.reported_usage, Some(TokenUsage::new(12, 3)));
    }

    #[test]
    fn empty_choices_is_parse_error() {
        let response: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(response.into_generate_response().is_err());
    }
}
