//! Error types for the Studyforge AI dispatch core.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! | Condition | Type |
//! |-----------|------|
//! | principal over its ceiling | [`QuotaError`] |
//! | provider credits used up | [`ProviderErrorKind::Exhausted`] |
//! | any other provider failure | [`ProviderErrorKind`] (remaining variants) |
//! | empty provider registry | [`DispatchErrorKind::ConfigurationMissing`] |
//! | ledger or registry write failed | [`DatabaseError`] |
//!
//! # Examples
//!
//! ```
//! use studyforge_error::{StudyforgeResult, ProviderError, ProviderErrorKind};
//!
//! fn call() -> StudyforgeResult<String> {
//!     Err(ProviderError::new(ProviderErrorKind::Network("connection refused".into())))?
//! }
//!
//! match call() {
//!     Ok(text) => println!("Got: {}", text),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod dispatch;
mod error;
mod json;
mod provider;
mod quota;

pub use config::ConfigError;
pub use database::{DatabaseError, DatabaseErrorKind};
pub use dispatch::{DispatchError, DispatchErrorKind};
pub use error::{StudyforgeError, StudyforgeErrorKind, StudyforgeResult};
pub use json::JsonError;
pub use provider::{ProviderError, ProviderErrorKind};
pub use quota::{QuotaError, QuotaErrorKind};
