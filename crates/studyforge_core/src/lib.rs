//! Core data types for the Studyforge AI dispatch core.
//!
//! This crate holds the records the quota ledger and the provider registry
//! operate on, together with the pure logic that mutates them (window resets,
//! provider state transitions, token estimation). Stores apply that logic
//! atomically; services orchestrate it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod ledger;
mod limits;
mod principal;
mod provider;
mod quota;
mod telemetry;
mod usage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ledger::{TokenDelta, UsageLedger, UsageSnapshot, WindowReset};
pub use limits::{LimitPolicy, LimitPolicyUpdate, LimitSource, TierLimits};
pub use principal::{Principal, PrincipalId, SubscriptionTier};
pub use provider::{
    DEFAULT_FAILURE_THRESHOLD, NewProviderConfig, NewProviderConfigBuilder, NewProviderConfigBuilderError, ProviderConfig,
    ProviderId, ProviderKind, ProviderState, ProviderTransition, TestStatus,
};
pub use quota::QuotaStatus;
pub use telemetry::{DEFAULT_LOG_FILTER, init_console_telemetry};
pub use usage::{
    CallResult, DEFAULT_ADVISORY_OVERHEAD_TOKENS, TokenAccounting, TokenUsage, advisory_estimate,
    estimate_tokens,
};
