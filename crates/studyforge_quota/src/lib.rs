//! Token accounting and quota enforcement.
//!
//! The [`QuotaGate`] answers "may this principal spend N tokens now" and the
//! [`UsageLedgerService`] records what was actually spent. The gate is a
//! look-then-decide check, not a reservation: two concurrent requests for the
//! same principal can both pass before either is charged, so usage may
//! overshoot a limit by at most the in-flight calls' cost. Limits are soft.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod gate;
mod ledger;

pub use gate::QuotaGate;
pub use ledger::UsageLedgerService;
