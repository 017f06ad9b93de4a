//! Trait definitions for the Studyforge AI dispatch core.
//!
//! This crate provides the seams between the dispatch services and the
//! outside world: [`ProviderDriver`] for AI backends and the three store
//! traits the ledger, catalog and registry persist through.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod stores;
mod traits;
mod types;

pub use stores::{Activation, LimitPolicyStore, ProviderStore, UsageLedgerStore};
pub use traits::{DriverFactory, ProviderDriver};
pub use types::{GenerateRequest, GenerateResponse};
