//! Builds HTTP drivers from stored provider configurations.

use crate::{AnthropicClient, GeminiClient, OpenAICompatibleClient};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use studyforge_core::{ProviderConfig, ProviderKind};
use studyforge_error::{ProviderError, ProviderErrorKind, StudyforgeResult};
use studyforge_interface::{DriverFactory, ProviderDriver};
use tracing::{debug, instrument};

/// Driver factory sharing one connection pool across providers.
#[derive(Debug, Clone)]
pub struct HttpDriverFactory {
    client: Client,
    timeout_secs: u64,
}

impl HttpDriverFactory {
    /// Creates a factory whose clients give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns a provider configuration error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> StudyforgeResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| {
                ProviderError::new(ProviderErrorKind::InvalidConfiguration(format!(
                    "Failed to build HTTP client: {}",
                    e
                )))
            })?;
        Ok(Self {
            client,
            timeout_secs: timeout.as_secs(),
        })
    }
}

impl DriverFactory for HttpDriverFactory {
    #[instrument(skip(self, config), fields(provider = %config.label()))]
    fn build(&self, config: &ProviderConfig) -> StudyforgeResult<Arc<dyn ProviderDriver>> {
        let base_url = config.effective_base_url().ok_or_else(|| {
            ProviderError::new(ProviderErrorKind::InvalidConfiguration(format!(
                "Provider {} has no base URL",
                config.label()
            )))
        })?;
        debug!(base_url, "Building driver");

        let driver: Arc<dyn ProviderDriver> = match config.provider_kind {
            ProviderKind::Anthropic => Arc::new(
                AnthropicClient::new(
                    self.client.clone(),
                    config.secret_credential.clone(),
                    config.model.clone(),
                    base_url,
                )
                .with_temperature(config.temperature)
                .with_timeout_secs(self.timeout_secs),
            ),
            ProviderKind::Gemini => Arc::new(
                GeminiClient::new(
                    self.client.clone(),
                    config.secret_credential.clone(),
                    config.model.clone(),
                    base_url,
                )
                .with_temperature(config.temperature)
                .with_timeout_secs(self.timeout_secs),
            ),
            kind @ (ProviderKind::OpenAi
            | ProviderKind::Groq
            | ProviderKind::OpenRouter
            | ProviderKind::Custom) => Arc::new(
                OpenAICompatibleClient::new(
                    self.client.clone(),
                    config.secret_credential.clone(),
                    config.model.clone(),
                    base_url,
                    compat_name(kind),
                )
                .with_temperature(config.temperature)
                .with_timeout_secs(self.timeout_secs),
            ),
        };
        Ok(driver)
    }
}

fn compat_name(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::OpenAi => "openai",
        ProviderKind::Groq => "groq",
        ProviderKind::OpenRouter => "openrouter",
        _ => "custom",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use studyforge_core::{NewProviderConfig, ProviderId};

    fn config(kind: ProviderKind, base_url: Option<&str>) -> ProviderConfig {
        let mut builder = NewProviderConfig::builder();
        builder
            .provider_kind(kind)
            .model("m")
            .secret_credential("k");
        if let Some(url) = base_url {
            builder.base_url(url);
        }
        ProviderConfig::from_new(ProviderId::new(1), builder.build().unwrap(), Utc::now())
    }

    #[test]
    fn builds_driver_per_kind() {
        let factory = HttpDriverFactory::new(Duration::from_secs(5)).unwrap();
        let cases = [
            (ProviderKind::OpenAi, "openai"),
            (ProviderKind::Anthropic, "anthropic"),
            (ProviderKind::Gemini, "gemini"),
            (ProviderKind::Groq, "groq"),
            (ProviderKind::OpenRouter, "openrouter"),
        ];
        for (kind, name) in cases {
            let driver = factory.build(&config(kind, None)).unwrap();
            assert_eq!(driver.provider_name(), name);
            assert_eq!(driver.model_name(), "m");
        }
    }

    #[test]
    fn custom_without_url_is_rejected() {
        let factory = HttpDriverFactory::new(Duration::from_secs(5)).unwrap();
        assert!(factory.build(&config(ProviderKind::Custom, None)).is_err());
        assert!(factory
            .build(&config(ProviderKind::Custom, Some("http://localhost:8080/v1")))
            .is_ok());
    }
}
