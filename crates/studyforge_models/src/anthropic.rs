//! Anthropic Messages API client.

use crate::transport::send_json;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use studyforge_core::TokenUsage;
use studyforge_error::{ProviderError, ProviderErrorKind, StudyforgeResult};
use studyforge_interface::{GenerateRequest, GenerateResponse, ProviderDriver};
use tracing::{debug, instrument};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// A message in an Anthropic conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthropicMessage {
    /// "user" or "assistant"
    pub role: String,
    /// Message text
    pub content: String,
}

/// Messages API request body.
#[derive(Debug, Clone, PartialEq, Serialize, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into))]
pub struct AnthropicRequest {
    /// Model identifier
    model: String,
    /// Required response length cap
    max_tokens: u32,
    /// Conversation
    messages: Vec<AnthropicMessage>,
    /// Sampling temperature
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

impl AnthropicRequest {
    /// Creates a new builder.
    pub fn builder() -> AnthropicRequestBuilder {
        AnthropicRequestBuilder::default()
    }
}

/// One content block of a response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnthropicContent {
    /// Block type; only "text" blocks carry text
    #[serde(rename = "type")]
    pub content_type: String,
    /// Block text
    #[serde(default)]
    pub text: Option<String>,
}

/// Usage reported by the Messages API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AnthropicUsage {
    /// Input tokens
    pub input_tokens: u64,
    /// Output tokens
    pub output_tokens: u64,
}

/// Messages API response body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnthropicResponse {
    /// Response id
    #[serde(default)]
    pub id: String,
    /// Content blocks
    #[serde(default)]
    pub content: Vec<AnthropicContent>,
    /// Reported usage
    pub usage: Option<AnthropicUsage>,
}

impl AnthropicResponse {
    /// Convert into the provider-neutral response, joining text blocks.
    ///
    /// # Errors
    ///
    /// Returns a parse error when the response has no text block.
    pub fn into_generate_response(self) -> StudyforgeResult<GenerateResponse> {
        let blocks: Vec<String> = self
            .content
            .into_iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text)
            .collect();
        if blocks.is_empty() {
            return Err(ProviderError::new(ProviderErrorKind::Parse(
                "Response contained no text blocks".to_string(),
            ))
            .into());
        }
        Ok(GenerateResponse {
            text: blocks.join(""),
            reported_usage: self
                .usage
                .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens)),
        })
    }
}

/// Anthropic API client.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    temperature: Option<f32>,
    timeout_secs: u64,
}

impl AnthropicClient {
    /// Creates a new Anthropic client against `{base_url}/messages`.
    pub fn new(
        client: Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
    ) -> Self {
        debug!("Creating new Anthropic client");
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: format!("{}/messages", base_url.trim_end_matches('/')),
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

    /// Converts a prompt to a Messages API request.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the builder rejects the input.
    pub fn build_request(&self, req: &GenerateRequest) -> StudyforgeResult<AnthropicRequest> {
        AnthropicRequest::builder()
            .model(self.model.clone())
            .max_tokens(req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS))
            .messages(vec![AnthropicMessage {
                role: "user".to_string(),
                content: req.prompt.clone(),
            }])
            .temperature(req.temperature.or(self.temperature))
            .build()
            .map_err(|e| {
                ProviderError::new(ProviderErrorKind::InvalidConfiguration(e.to_string())).into()
            })
    }
}

#[async_trait]
impl ProviderDriver for AnthropicClient {
    #[instrument(skip(self, req), fields(provider = "anthropic", model = %self.model))]
    async fn generate(&self, req: &GenerateRequest) -> StudyforgeResult<GenerateResponse> {
        let body = self.build_request(req)?;
        debug!("Sending request to Anthropic API");

        let response: AnthropicResponse = send_json(
            self.client
                .post(&self.endpoint)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body),
            "anthropic",
            self.timeout_secs,
        )
        .await?;

        debug!(response_id = %response.id, "Received response from Anthropic");
        response.into_generate_response()
    }

    fn provider_name(&self) -> &'static str {
        "anthropic"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_max_tokens() {
        let client = AnthropicClient::new(
            Client::new(),
            "key",
            "claude-3-5-haiku-latest",
            "https://api.anthropic.com/v1",
        );
        let body = client.build_request(&GenerateRequest::new("Quiz me")).unwrap();
        assert_eq!(*body.max_tokens(), DEFAULT_MAX_TOKENS);
        assert_eq!(body.messages()[0].content, "Quiz me");
    }

    #[test]
    fn text_blocks_are_joined() {
        let response: AnthropicResponse = serde_json::from_str(
            r#"{"id":"msg_1","content":[{"type":"text","text":"Photo"},{"type":"text","text":"synthesis"}],
                "usage":{"input_tokens":5,"output_tokens":2}}"#,
        )
        .unwrap();
        let converted = response.into_generate_response().unwrap();
        assert_eq!(converted.text, "Photosynthesis");
        assert_eq!(converted.reported_usage, Some(TokenUsage::new(5, 2)));
    }
}
