//! Trait definitions for AI backends.

use crate::{GenerateRequest, GenerateResponse};
use async_trait::async_trait;
use std::sync::Arc;
use studyforge_core::ProviderConfig;
use studyforge_error::StudyforgeResult;

/// Core trait that all AI backends must implement.
///
/// Implementations translate vendor failures into
/// [`studyforge_error::ProviderErrorKind`] before returning, so callers can
/// classify outcomes without inspecting message text.
#[async_trait]
pub trait ProviderDriver: Send + Sync {
    /// Generate text for a single prompt.
    async fn generate(&self, req: &GenerateRequest) -> StudyforgeResult<GenerateResponse>;

    /// Provider name (e.g., "anthropic", "openai", "gemini").
    fn provider_name(&self) -> &'static str;

    /// Model identifier (e.g., "gpt-4o-mini").
    fn model_name(&self) -> &str;
}

/// Builds a driver for a stored provider configuration.
pub trait DriverFactory: Send + Sync {
    /// Construct a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns a provider configuration error when the record cannot produce
    /// a usable client (e.g. a custom provider without a base URL).
    fn build(&self, config: &ProviderConfig) -> StudyforgeResult<Arc<dyn ProviderDriver>>;
}
