//! Request and response types for provider calls.

use serde::{Deserialize, Serialize};
use studyforge_core::TokenUsage;

/// A single-prompt generation request.
///
/// # Examples
///
/// ```
/// use studyforge_interface::GenerateRequest;
///
/// let request = GenerateRequest::new("Write three flashcards about mitosis")
///     .with_max_tokens(256);
///
/// assert_eq!(request.max_tokens, Some(256));
/// assert_eq!(request.temperature, None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GenerateRequest {
    /// Prompt text
    pub prompt: String,
    /// Sampling temperature; overrides the provider's configured value
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
}

impl GenerateRequest {
    /// Request with only a prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Cap the response length.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Text produced by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated text
    pub text: String,
    /// Token counts reported by the provider, when it returns them
    pub reported_usage: Option<TokenUsage>,
}

impl GenerateResponse {
    /// Response without reported usage.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reported_usage: None,
        }
    }
}
