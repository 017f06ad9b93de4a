//! PostgreSQL persistence for Studyforge.
//!
//! Diesel-backed implementations of the ledger, limit policy and provider
//! stores. Blocking Diesel calls run on the Tokio blocking pool over an r2d2
//! connection pool; read-modify-write operations run in a transaction that
//! holds a row lock.
//!
//! # Example
//!
//! ```rust,no_run
//! use studyforge_database::{PostgresUsageLedgerStore, establish_pool, run_migrations};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = establish_pool("postgres://localhost/studyforge")?;
//! run_migrations(&pool)?;
//! let ledgers = PostgresUsageLedgerStore::new(pool);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod connection;
mod ledger_store;
mod models;
mod policy_store;
mod provider_store;

pub mod schema;

pub use connection::{DbPool, MIGRATIONS, database_url, establish_pool, run_migrations};
pub use ledger_store::PostgresUsageLedgerStore;
pub use models::{LimitPolicyRow, NewProviderConfigRow, ProviderConfigRow, UsageLedgerRow};
pub use policy_store::PostgresLimitPolicyStore;
pub use provider_store::PostgresProviderStore;

use studyforge_error::DatabaseError;

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
