//! Provider credentials and their health state machine.
//!
//! ```text
//! Untested ──► Active / Inactive ──► Failing(n) ──► Exhausted
//!     ▲                                                  │
//!     └──────────────────── Restore ◄────────────────────┘
//! ```
//!
//! The state is derived from the persisted fields; transitions are pure
//! methods so a store can apply them to one record atomically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use studyforge_error::{ConfigError, StudyforgeResult};

/// Default number of consecutive unclassified failures before a provider is
/// treated as exhausted.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Identifier of a configured provider credential.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct ProviderId(i64);

impl ProviderId {
    /// Wrap a raw id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw id value.
    pub fn get(&self) -> i64 {
        self.0
    }
}

/// AI backend family a credential belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    /// OpenAI chat completions
    OpenAi,
    /// Anthropic messages API
    Anthropic,
    /// Google Gemini generateContent API
    Gemini,
    /// Groq (OpenAI-compatible)
    Groq,
    /// OpenRouter (OpenAI-compatible)
    OpenRouter,
    /// Any other OpenAI-compatible endpoint; requires a base URL
    Custom,
}

impl ProviderKind {
    /// Endpoint used when a config carries no base URL.
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("https://api.openai.com/v1"),
            ProviderKind::Anthropic => Some("https://api.anthropic.com/v1"),
            ProviderKind::Gemini => Some("https://generativelanguage.googleapis.com/v1beta"),
            ProviderKind::Groq => Some("https://api.groq.com/openai/v1"),
            ProviderKind::OpenRouter => Some("https://openrouter.ai/api/v1"),
            ProviderKind::Custom => None,
        }
    }
}

/// Outcome of the last health observation for a provider.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TestStatus {
    /// Never called, or restored by an administrator
    #[default]
    NotTested,
    /// Last call succeeded
    Success,
    /// Last call failed
    Failed,
    /// Credits or quota used up
    Exhausted,
}

/// Health state of a provider, derived from its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum ProviderState {
    /// Never exercised and not active
    #[display("untested")]
    Untested,
    /// Holds the active flag and is healthy
    #[display("active")]
    Active,
    /// Healthy but not the active provider
    #[display("inactive")]
    Inactive,
    /// Has failed this many times in a row
    #[display("failing({})", _0)]
    Failing(u32),
    /// Skipped by the dispatcher until restored
    #[display("exhausted")]
    Exhausted,
}

/// A state change applied to a single provider record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderTransition {
    /// A call succeeded
    Success,
    /// A call failed with an unclassified or transient error
    Failure {
        /// Error text to keep for the admin console
        message: String,
        /// Consecutive failures that exhaust the provider
        threshold: u32,
    },
    /// Credits or quota are known to be used up
    MarkExhausted {
        /// Why the provider was exhausted
        reason: String,
    },
    /// Administrator put the provider back into rotation
    Restore,
    /// Administrator changed the priority
    SetPriority(i32),
    /// Administrator switched the active flag
    SetActive(bool),
}

/// One configured AI credential and its health counters.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Store-assigned identifier
    pub id: ProviderId,
    /// Backend family
    pub provider_kind: ProviderKind,
    /// Model name sent to the backend
    pub model: String,
    /// API key; never serialized
    #[serde(skip_serializing, default)]
    pub secret_credential: String,
    /// Endpoint override
    pub base_url: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Lower numbers are tried first
    pub priority: i32,
    /// At most one healthy provider holds this flag
    pub is_active: bool,
    /// Set when credits/quota are used up
    pub credits_exhausted: bool,
    /// When the provider was exhausted
    pub exhausted_at: Option<DateTime<Utc>>,
    /// Consecutive failures since the last success
    pub failure_count: u32,
    /// Lifetime successful calls
    pub success_count: u64,
    /// Last successful call
    pub last_success_at: Option<DateTime<Utc>>,
    /// Last failed call
    pub last_failure_at: Option<DateTime<Utc>>,
    /// Outcome of the last observation
    pub test_status: TestStatus,
    /// Error text from the last failure
    pub test_error: Option<String>,
    /// Creation time; breaks priority ties (newest first)
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("id", &self.id)
            .field("provider_kind", &self.provider_kind)
            .field("model", &self.model)
            .field("secret_credential", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("priority", &self.priority)
            .field("is_active", &self.is_active)
            .field("credits_exhausted", &self.credits_exhausted)
            .field("failure_count", &self.failure_count)
            .field("test_status", &self.test_status)
            .finish_non_exhaustive()
    }
}

impl ProviderConfig {
    /// Materialize a new record from administrator input.
    pub fn from_new(id: ProviderId, new: NewProviderConfig, now: DateTime<Utc>) -> Self {
        Self {
            id,
            provider_kind: new.provider_kind,
            model: new.model,
            secret_credential: new.secret_credential,
            base_url: new.base_url,
            temperature: new.temperature,
            priority: new.priority,
            is_active: false,
            credits_exhausted: false,
            exhausted_at: None,
            failure_count: 0,
            success_count: 0,
            last_success_at: None,
            last_failure_at: None,
            test_status: TestStatus::NotTested,
            test_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Current state in the provider state machine.
    ///
    /// # Examples
    ///
    /// ```
    /// use studyforge_core::{NewProviderConfig, ProviderConfig, ProviderId, ProviderKind, ProviderState, ProviderTransition};
    ///
    /// let new = NewProviderConfig::builder()
    ///     .provider_kind(ProviderKind::OpenAi)
    ///     .model("gpt-4o-mini")
    ///     .secret_credential("sk-test")
    ///     .build()
    ///     .unwrap();
    /// let now = chrono::Utc::now();
    /// let mut config = ProviderConfig::from_new(ProviderId::new(1), new, now);
    /// assert_eq!(config.state(), ProviderState::Untested);
    ///
    /// config.apply(&ProviderTransition::Failure { message: "boom".into(), threshold: 5 }, now);
    /// assert_eq!(config.state(), ProviderState::Failing(1));
    /// ```
    pub fn state(&self) -> ProviderState {
        if self.credits_exhausted {
            ProviderState::Exhausted
        } else if self.failure_count > 0 {
            ProviderState::Failing(self.failure_count)
        } else if self.is_active {
            ProviderState::Active
        } else if self.test_status == TestStatus::NotTested {
            ProviderState::Untested
        } else {
            ProviderState::Inactive
        }
    }

    /// Whether the dispatcher may route calls here outside degraded mode.
    pub fn is_available(&self) -> bool {
        !self.credits_exhausted
    }

    /// Endpoint for this provider, falling back to the kind's default.
    pub fn effective_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .or_else(|| self.provider_kind.default_base_url())
    }

    /// Human-readable label used in logs.
    pub fn label(&self) -> String {
        format!("#{} {}/{}", self.id, self.provider_kind, self.model)
    }

    /// Apply one transition to this record.
    pub fn apply(&mut self, transition: &ProviderTransition, now: DateTime<Utc>) {
        match transition {
            ProviderTransition::Success => {
                self.success_count = self.success_count.saturating_add(1);
                self.last_success_at = Some(now);
                self.failure_count = 0;
                self.test_status = TestStatus::Success;
                self.test_error = None;
            }
            ProviderTransition::Failure { message, threshold } => {
                self.failure_count = self.failure_count.saturating_add(1);
                self.last_failure_at = Some(now);
                if self.credits_exhausted {
                    // Degraded-mode failure; keep the original exhaustion record.
                } else if self.failure_count >= *threshold {
                    self.exhaust(
                        format!(
                            "{} consecutive failures; last error: {}",
                            self.failure_count, message
                        ),
                        now,
                    );
                } else {
                    self.test_status = TestStatus::Failed;
                    self.test_error = Some(message.clone());
                }
            }
            ProviderTransition::MarkExhausted { reason } => {
                self.exhaust(reason.clone(), now);
            }
            ProviderTransition::Restore => {
                self.failure_count = 0;
                self.credits_exhausted = false;
                self.exhausted_at = None;
                self.test_status = TestStatus::NotTested;
                self.test_error = None;
            }
            ProviderTransition::SetPriority(priority) => {
                self.priority = *priority;
            }
            ProviderTransition::SetActive(active) => {
                self.is_active = *active;
            }
        }
        self.updated_at = now;
    }

    /// Only the first exhaustion is recorded; repeats just drop the active flag.
    fn exhaust(&mut self, reason: String, now: DateTime<Utc>) {
        self.is_active = false;
        if self.credits_exhausted {
            return;
        }
        self.credits_exhausted = true;
        self.exhausted_at = Some(now);
        self.test_status = TestStatus::Exhausted;
        self.test_error = Some(reason);
    }
}

/// Administrator input for registering a provider.
#[derive(Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct NewProviderConfig {
    /// Backend family
    pub provider_kind: ProviderKind,
    /// Model name
    pub model: String,
    /// API key
    pub secret_credential: String,
    /// Endpoint override
    #[builder(default, setter(into, strip_option))]
    pub base_url: Option<String>,
    /// Sampling temperature
    #[builder(default, setter(into, strip_option))]
    pub temperature: Option<f32>,
    /// Lower numbers are tried first
    #[builder(default = "100")]
    pub priority: i32,
}

impl std::fmt::Debug for NewProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewProviderConfig")
            .field("provider_kind", &self.provider_kind)
            .field("model", &self.model)
            .field("secret_credential", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("priority", &self.priority)
            .finish()
    }
}

impl NewProviderConfig {
    /// Creates a new builder.
    pub fn builder() -> NewProviderConfigBuilder {
        NewProviderConfigBuilder::default()
    }

    /// Check the input can produce a usable client.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty model or credential, a
    /// custom provider without a base URL, or a temperature outside `0.0..=2.0`.
    pub fn validate(&self) -> StudyforgeResult<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::new("Provider model must not be empty").into());
        }
        if self.secret_credential.trim().is_empty() {
            return Err(ConfigError::new("Provider credential must not be empty").into());
        }
        if self.provider_kind == ProviderKind::Custom && self.base_url.is_none() {
            return Err(ConfigError::new("Custom providers require a base URL").into());
        }
        match self.temperature {
            Some(temperature) if !(0.0..=2.0).contains(&temperature) => {
                Err(ConfigError::invalid_value("temperature", temperature).into())
            }
            _ => Ok(()),
        }
    }
}
