//! Studyforge AI dispatch core.
//!
//! Enforces per-principal token ceilings over daily and monthly windows and
//! routes every AI generation call across a prioritized set of provider
//! credentials, failing over when a provider runs out of credits.
//!
//! # Architecture
//!
//! Studyforge is organized as a workspace with focused crates:
//!
//! - `studyforge_error` - Error types
//! - `studyforge_core` - Domain types: tiers, ledgers, provider state machine
//! - `studyforge_interface` - Driver and store traits
//! - `studyforge_limits` - Limits catalog and configuration
//! - `studyforge_quota` - Usage ledger service and quota gate
//! - `studyforge_models` - HTTP provider adapters and metrics
//! - `studyforge_dispatch` - Provider registry, dispatcher and call executor
//! - `studyforge_storage` - In-memory stores
//! - `studyforge_database` - PostgreSQL stores (`database` feature)
//!
//! This crate re-exports everything and wires it together in [`Studyforge`].
//!
//! # Cargo Features
//!
//! - `database` - PostgreSQL persistence
//! - `api` - Enable tests that call real provider APIs

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod service;

pub use service::{Stores, Studyforge};

pub use studyforge_core::*;
pub use studyforge_dispatch::{
    CallExecutor, Dispatcher, FailureClass, ProviderRegistry, ProviderTestOutcome, RegistryHealth,
    classify,
};
pub use studyforge_error::*;
pub use studyforge_interface::*;
pub use studyforge_limits::{DispatchSettings, EffectiveLimits, LimitsCatalog, StudyforgeConfig};
pub use studyforge_models::{HttpDriverFactory, LlmMetrics, translate_failure};
pub use studyforge_quota::{QuotaGate, UsageLedgerService};
pub use studyforge_storage::{
    InMemoryLimitPolicyStore, InMemoryProviderStore, InMemoryUsageLedgerStore,
};

#[cfg(feature = "database")]
pub use studyforge_database::{
    DbPool, PostgresLimitPolicyStore, PostgresProviderStore, PostgresUsageLedgerStore,
    database_url, establish_pool, run_migrations,
};
