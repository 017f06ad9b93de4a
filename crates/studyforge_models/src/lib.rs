//! AI provider adapters for Studyforge.
//!
//! Each adapter implements [`studyforge_interface::ProviderDriver`] over a
//! vendor REST API and translates vendor failures into
//! [`studyforge_error::ProviderErrorKind`] before returning.
//!
//! # Available Providers
//!
//! - **OpenAI**, **Groq**, **OpenRouter** and custom gateways via [`OpenAICompatibleClient`]
//! - **Anthropic** via [`AnthropicClient`]
//! - **Gemini** via [`GeminiClient`]
//!
//! [`HttpDriverFactory`] picks the right adapter for a stored configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod anthropic;
mod factory;
mod failure;
mod gemini;
mod metrics;
mod openai_compat;
mod transport;

pub use anthropic::{
    AnthropicClient, AnthropicContent, AnthropicMessage, AnthropicRequest,
    AnthropicRequestBuilder, AnthropicResponse, AnthropicUsage,
};
pub use factory::HttpDriverFactory;
pub use failure::{EXHAUSTION_MARKERS, mentions_exhaustion, translate_failure, translate_transport};
pub use gemini::{
    Candidate, Content, GeminiClient, GeminiRequest, GeminiResponse, GenerationConfig, Part,
    UsageMetadata,
};
pub use metrics::{LlmMetrics, error_label};
pub use openai_compat::{
    ChatChoice, ChatCompletionRequest, ChatCompletionRequestBuilder, ChatCompletionResponse,
    ChatMessage, ChatUsage, OpenAICompatibleClient,
};
