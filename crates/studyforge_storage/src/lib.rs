//! In-memory store implementations.
//!
//! HashMap-backed stores behind a `tokio::sync::RwLock`. Each mutating
//! operation holds the write lock for its whole read-modify-write, which makes
//! per-record transitions and exclusive activation atomic. All data is lost
//! when the store is dropped; use them for tests, demos and single-process
//! deployments.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod ledger;
mod policy;
mod provider;

pub use ledger::InMemoryUsageLedgerStore;
pub use policy::InMemoryLimitPolicyStore;
pub use provider::InMemoryProviderStore;
