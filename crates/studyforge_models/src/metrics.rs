//! Metrics for provider calls.
//!
//! OpenTelemetry counters and histograms labeled with provider and model.
//! Without an installed meter provider the instruments are no-ops.

use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram, Meter},
};
use std::sync::OnceLock;
use studyforge_error::{ProviderErrorKind, StudyforgeError, StudyforgeErrorKind};

static METRICS: OnceLock<LlmMetrics> = OnceLock::new();

/// Metrics for AI provider interactions.
#[derive(Clone)]
pub struct LlmMetrics {
    /// Meter handle kept alive for metric instruments
    _meter: Meter,
    /// Successful provider calls
    pub requests: Counter<u64>,
    /// Failed provider calls
    pub errors: Counter<u64>,
    /// Provider call duration in seconds
    pub duration: Histogram<f64>,
    /// Tokens charged (prompt + completion)
    pub tokens_used: Counter<u64>,
    /// Prompt tokens charged
    pub prompt_tokens: Counter<u64>,
    /// Completion tokens charged
    pub completion_tokens: Counter<u64>,
    /// Calls answered by a fallback provider
    pub fallbacks: Counter<u64>,
    /// Providers marked exhausted
    pub exhaustions: Counter<u64>,
    /// Calls rejected by the quota gate
    pub quota_rejections: Counter<u64>,
}

impl LlmMetrics {
    fn init() -> Self {
        let meter = global::meter("studyforge_dispatch");

        Self {
            _meter: meter.clone(),
            requests: meter
                .u64_counter("llm.requests")
                .with_description("Successful provider calls")
                .build(),
            errors: meter
                .u64_counter("llm.errors")
                .with_description("Failed provider calls")
                .build(),
            duration: meter
                .f64_histogram("llm.duration")
                .with_unit("seconds")
                .with_description("Provider call duration")
                .build(),
            tokens_used: meter
                .u64_counter("llm.tokens")
                .with_description("Tokens charged (prompt + completion)")
                .build(),
            prompt_tokens: meter
                .u64_counter("llm.tokens.prompt")
                .with_description("Prompt tokens charged")
                .build(),
            completion_tokens: meter
                .u64_counter("llm.tokens.completion")
                .with_description("Completion tokens charged")
                .build(),
            fallbacks: meter
                .u64_counter("llm.fallbacks")
                .with_description("Calls answered after an exhaustion fallback")
                .build(),
            exhaustions: meter
                .u64_counter("llm.exhaustions")
                .with_description("Providers marked exhausted")
                .build(),
            quota_rejections: meter
                .u64_counter("quota.rejections")
                .with_description("Calls rejected by the quota gate")
                .build(),
        }
    }

    /// Get the global metrics instance.
    pub fn get() -> &'static Self {
        METRICS.get_or_init(Self::init)
    }

    /// Record a successful provider call.
    pub fn record_request(&self, provider: &str, model: &str, duration_secs: f64) {
        let labels = &[
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("model", model.to_string()),
        ];
        self.requests.add(1, labels);
        self.duration.record(duration_secs, labels);
    }

    /// Record a failed provider call.
    pub fn record_error(&self, provider: &str, model: &str, error_type: &str) {
        let labels = &[
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("model", model.to_string()),
            KeyValue::new("error_type", error_type.to_string()),
        ];
        self.errors.add(1, labels);
    }

    /// Record tokens charged for a call.
    pub fn record_tokens(
        &self,
        model: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
        total_tokens: u64,
    ) {
        let labels = &[KeyValue::new("model", model.to_string())];
        self.tokens_used.add(total_tokens, labels);
        self.prompt_tokens.add(prompt_tokens, labels);
        self.completion_tokens.add(completion_tokens, labels);
    }

    /// Record a call served by a fallback provider.
    pub fn record_fallback(&self, from_provider: &str, to_provider: &str) {
        self.fallbacks.add(
            1,
            &[
                KeyValue::new("from", from_provider.to_string()),
                KeyValue::new("to", to_provider.to_string()),
            ],
        );
    }

    /// Record a provider being marked exhausted.
    pub fn record_exhaustion(&self, provider: &str, model: &str) {
        self.exhaustions.add(
            1,
            &[
                KeyValue::new("provider", provider.to_string()),
                KeyValue::new("model", model.to_string()),
            ],
        );
    }

    /// Record a quota rejection for a tier.
    pub fn record_quota_rejection(&self, tier: &str) {
        self.quota_rejections
            .add(1, &[KeyValue::new("tier", tier.to_string())]);
    }
}

impl Default for LlmMetrics {
    fn default() -> Self {
        Self::get().clone()
    }
}

/// Error type label for metrics.
///
/// Returns one of: "exhausted", "transient", "timeout", "network", "api",
/// "parse", "config", "quota", "other".
pub fn error_label(error: &StudyforgeError) -> &'static str {
    match error.kind() {
        StudyforgeErrorKind::Provider(e) => match &e.kind {
            ProviderErrorKind::Exhausted { .. } => "exhausted",
            ProviderErrorKind::Transient { .. } => "transient",
            ProviderErrorKind::Timeout(_) => "timeout",
            ProviderErrorKind::Network(_) => "network",
            ProviderErrorKind::Api { .. } => "api",
            ProviderErrorKind::Parse(_) => "parse",
            ProviderErrorKind::InvalidConfiguration(_) => "config",
        },
        StudyforgeErrorKind::Quota(_) => "quota",
        StudyforgeErrorKind::Config(_) => "config",
        _ => "other",
    }
}
