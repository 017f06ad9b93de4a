//! Quota-checked, failover-aware AI call execution.

use crate::{Dispatcher, FailureClass, ProviderRegistry, classify};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use studyforge_core::{
    CallResult, Principal, ProviderConfig, ProviderId, TokenUsage, advisory_estimate,
};
use studyforge_error::{ProviderError, ProviderErrorKind, StudyforgeError, StudyforgeResult};
use studyforge_interface::{DriverFactory, GenerateRequest, GenerateResponse};
use studyforge_limits::DispatchSettings;
use studyforge_models::{LlmMetrics, error_label};
use studyforge_quota::{QuotaGate, UsageLedgerService};
use tracing::{debug, error, info, instrument, warn};

/// Result of a provider connectivity test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderTestOutcome {
    /// Provider record after the outcome was recorded
    pub provider: ProviderConfig,
    /// Whether the probe succeeded
    pub success: bool,
    /// Round-trip time in milliseconds
    pub latency_ms: u64,
    /// Start of the response text on success
    pub response_preview: Option<String>,
    /// Error text on failure
    pub error: Option<String>,
    /// How the failure was classified
    pub failure_class: Option<FailureClass>,
}

struct Served {
    response: GenerateResponse,
    config: ProviderConfig,
    fell_back: bool,
}

/// Runs AI calls: quota pre-check, provider selection, invocation under a
/// deadline, outcome bookkeeping, one fallback on exhaustion, and token
/// accounting.
#[derive(Clone)]
pub struct CallExecutor {
    gate: QuotaGate,
    ledger: UsageLedgerService,
    registry: ProviderRegistry,
    dispatcher: Dispatcher,
    drivers: Arc<dyn DriverFactory>,
    settings: DispatchSettings,
    metrics: &'static LlmMetrics,
}

impl std::fmt::Debug for CallExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallExecutor")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl CallExecutor {
    /// Wire an executor.
    pub fn new(
        gate: QuotaGate,
        ledger: UsageLedgerService,
        registry: ProviderRegistry,
        drivers: Arc<dyn DriverFactory>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            gate,
            ledger,
            dispatcher: Dispatcher::new(registry.clone()),
            registry,
            drivers,
            settings,
            metrics: LlmMetrics::get(),
        }
    }

    /// Serve an AI call for a principal.
    ///
    /// # Errors
    ///
    /// - `QuotaExceeded` when the advisory estimate does not fit; never retried
    /// - `ConfigurationMissing` when no provider is configured
    /// - the provider error when the call (and, on exhaustion, its single
    ///   fallback) fails
    /// - a database error when bookkeeping cannot be persisted
    #[instrument(skip(self, principal, request), fields(principal = %principal.id, tier = %principal.tier))]
    pub async fn dispatch_ai_call(
        &self,
        principal: &Principal,
        request: GenerateRequest,
    ) -> StudyforgeResult<CallResult> {
        let estimate = advisory_estimate(&request.prompt, self.settings.advisory_overhead_tokens);
        if let Err(e) = self.gate.require(principal, estimate).await {
            if e.is_quota_exceeded() {
                self.metrics.record_quota_rejection(principal.tier.as_ref());
            }
            return Err(e);
        }

        let served = self.serve(&request).await?;
        let usage = self.charge(&request, &served);
        self.ledger
            .consume_tokens(
                &principal.id,
                *usage.total_tokens(),
                Some(*usage.prompt_tokens()),
                Some(*usage.completion_tokens()),
            )
            .await?;

        Ok(Self::result(served, usage))
    }

    /// Serve an AI call without quota checks or token accounting.
    ///
    /// For system jobs and administrative use.
    ///
    /// # Errors
    ///
    /// As [`dispatch_ai_call`](Self::dispatch_ai_call), minus quota errors.
    #[instrument(skip(self, request))]
    pub async fn dispatch_unmetered(&self, request: GenerateRequest) -> StudyforgeResult<CallResult> {
        let served = self.serve(&request).await?;
        let usage = self.charge(&request, &served);
        Ok(Self::result(served, usage))
    }

    /// Send the probe prompt to one specific provider and record the outcome.
    ///
    /// Provider failures are reported in the outcome, not as errors.
    ///
    /// # Errors
    ///
    /// Returns `ProviderNotFound` for an unknown id, or a database error if
    /// the outcome cannot be recorded.
    #[instrument(skip(self))]
    pub async fn test_provider(&self, id: ProviderId) -> StudyforgeResult<ProviderTestOutcome> {
        let config = self.registry.get(id).await?;
        let request = GenerateRequest::new(self.settings.probe_prompt.clone()).with_max_tokens(16);
        let started = Instant::now();
        let result = self.invoke(&config, &request).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(response) => {
                let provider = self.registry.record_success(id).await?;
                info!(provider = %provider.label(), latency_ms, "Provider test succeeded");
                Ok(ProviderTestOutcome {
                    provider,
                    success: true,
                    latency_ms,
                    response_preview: Some(response.text.chars().take(80).collect()),
                    error: None,
                    failure_class: None,
                })
            }
            Err(e) => {
                let class = classify(&e);
                let provider = match class {
                    FailureClass::Exhaustion => {
                        self.registry.mark_exhausted(id, e.to_string()).await?
                    }
                    FailureClass::Transient | FailureClass::Unknown => {
                        self.registry.record_failure(id, e.to_string()).await?
                    }
                };
                warn!(provider = %provider.label(), class = %class, "Provider test failed");
                Ok(ProviderTestOutcome {
                    provider,
                    success: false,
                    latency_ms,
                    response_preview: None,
                    error: Some(e.to_string()),
                    failure_class: Some(class),
                })
            }
        }
    }

    async fn serve(&self, request: &GenerateRequest) -> StudyforgeResult<Served> {
        let first = self.dispatcher.select_provider().await?;
        let error = match self.invoke(&first, request).await {
            Ok(response) => {
                self.registry.record_success(first.id).await?;
                return Ok(Served {
                    response,
                    config: first,
                    fell_back: false,
                });
            }
            Err(e) => e,
        };

        let class = self.record_failure_outcome(&first, &error).await;
        if class != FailureClass::Exhaustion {
            return Err(error);
        }

        let fallback = self.dispatcher.select_provider().await?;
        if fallback.id == first.id {
            warn!(provider = %first.label(), "No other provider to fall back to");
            return Err(error);
        }
        info!(from = %first.label(), to = %fallback.label(), "Falling back after exhaustion");

        match self.invoke(&fallback, request).await {
            Ok(response) => {
                self.registry.record_success(fallback.id).await?;
                self.metrics
                    .record_fallback(first.provider_kind.as_ref(), fallback.provider_kind.as_ref());
                Ok(Served {
                    response,
                    config: fallback,
                    fell_back: true,
                })
            }
            Err(fallback_error) => {
                self.record_failure_outcome(&fallback, &fallback_error).await;
                Err(fallback_error)
            }
        }
    }

    /// Build the driver and call it under the configured deadline.
    async fn invoke(
        &self,
        config: &ProviderConfig,
        request: &GenerateRequest,
    ) -> StudyforgeResult<GenerateResponse> {
        let driver = self.drivers.build(config)?;
        let started = Instant::now();
        debug!(provider = %config.label(), "Invoking provider");

        let outcome = match tokio::time::timeout(self.settings.call_timeout(), driver.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::new(ProviderErrorKind::Timeout(
                self.settings.call_timeout_secs,
            ))
            .into()),
        };

        let elapsed = started.elapsed().as_secs_f64();
        match &outcome {
            Ok(_) => self
                .metrics
                .record_request(driver.provider_name(), driver.model_name(), elapsed),
            Err(e) => {
                error!(provider = %config.label(), error = %e, "Provider call failed");
                self.metrics
                    .record_error(driver.provider_name(), driver.model_name(), error_label(e));
            }
        }
        outcome
    }

    /// Classify a failure and update the registry accordingly.
    ///
    /// Bookkeeping errors are logged; the provider error is what the caller sees.
    async fn record_failure_outcome(
        &self,
        config: &ProviderConfig,
        error: &StudyforgeError,
    ) -> FailureClass {
        let class = classify(error);
        let recorded = match class {
            FailureClass::Exhaustion => {
                self.metrics
                    .record_exhaustion(config.provider_kind.as_ref(), &config.model);
                self.registry.mark_exhausted(config.id, error.to_string()).await
            }
            FailureClass::Transient | FailureClass::Unknown => {
                self.registry.record_failure(config.id, error.to_string()).await
            }
        };
        if let Err(e) = recorded {
            error!(provider = %config.label(), error = %e, "Failed to record provider outcome");
        }
        class
    }

    fn charge(&self, request: &GenerateRequest, served: &Served) -> TokenUsage {
        let usage = self.settings.token_accounting.charge(
            &request.prompt,
            &served.response.text,
            served.response.reported_usage,
        );
        if let Some(reported) = served.response.reported_usage {
            debug!(
                charged = *usage.total_tokens(),
                reported = *reported.total_tokens(),
                "Token usage"
            );
        }
        self.metrics.record_tokens(
            &served.config.model,
            *usage.prompt_tokens(),
            *usage.completion_tokens(),
            *usage.total_tokens(),
        );
        usage
    }

    fn result(served: Served, usage: TokenUsage) -> CallResult {
        CallResult {
            text: served.response.text,
            provider_id: served.config.id,
            provider_kind: served.config.provider_kind,
            model: served.config.model,
            usage,
            fell_back: served.fell_back,
        }
    }
}
