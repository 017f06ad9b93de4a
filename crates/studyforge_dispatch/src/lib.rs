//! Provider registry, selection and call execution.
//!
//! ```text
//! caller ─► QuotaGate ─► Dispatcher ─► CallExecutor ─► ProviderDriver
//!                            │               │
//!                            ▼               ▼
//!                     ProviderRegistry  UsageLedgerService
//! ```
//!
//! A call whose provider reports exhaustion marks that provider exhausted
//! and is retried once on the next provider. Any other failure counts a
//! strike against the provider and is returned to the caller; enough strikes
//! exhaust it for future calls.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod classify;
mod dispatcher;
mod executor;
mod registry;

pub use classify::{FailureClass, classify};
pub use dispatcher::Dispatcher;
pub use executor::{CallExecutor, ProviderTestOutcome};
pub use registry::{ProviderRegistry, RegistryHealth, selection_order};
