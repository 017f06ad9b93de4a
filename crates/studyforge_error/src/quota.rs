//! Quota enforcement error types.

/// Quota error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum QuotaErrorKind {
    /// The principal cannot spend the requested tokens in the current windows.
    #[display(
        "Token quota exceeded: {} needed, {} of {} left today, {} of {} left this month",
        tokens_needed,
        daily_remaining,
        daily_limit,
        monthly_remaining,
        monthly_limit
    )]
    Exceeded {
        /// Tokens the caller asked to spend
        tokens_needed: u64,
        /// Tokens left in the daily window
        daily_remaining: u64,
        /// Tokens left in the monthly window
        monthly_remaining: u64,
        /// Daily ceiling for the principal's tier
        daily_limit: u64,
        /// Monthly ceiling for the principal's tier
        monthly_limit: u64,
    },
}

/// Quota error with source location tracking.
///
/// Quota errors are surfaced to the caller immediately and are never retried.
///
/// # Examples
///
/// ```
/// use studyforge_error::{QuotaError, QuotaErrorKind};
///
/// let err = QuotaError::new(QuotaErrorKind::Exceeded {
///     tokens_needed: 100,
///     daily_remaining: 50,
///     monthly_remaining: 4_000,
///     daily_limit: 200,
///     monthly_limit: 5_000,
/// });
/// assert!(format!("{}", err).contains("50 of 200 left today"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Quota Error: {} at line {} in {}", kind, line, file)]
pub struct QuotaError {
    /// The kind of error that occurred
    pub kind: QuotaErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl QuotaError {
    /// Create a new QuotaError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: QuotaErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
