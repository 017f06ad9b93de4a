//! Tier limits and runtime configuration.
//!
//! [`StudyforgeConfig`] carries the default token ceilings for each
//! subscription tier and the dispatch settings. [`LimitsCatalog`] layers
//! administrator-managed policies on top of those defaults.
//!
//! ## Resolution order
//!
//! 1. Active [`studyforge_core::LimitPolicy`] for the tier
//! 2. `[tiers.<name>]` from the layered configuration
//! 3. [`studyforge_core::TierLimits::builtin`]

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod config;
mod tiers;

pub use catalog::{EffectiveLimits, LimitsCatalog};
pub use config::{DispatchSettings, StudyforgeConfig};
pub use tiers::TierDefaults;
