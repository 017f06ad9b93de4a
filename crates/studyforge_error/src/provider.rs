//! AI provider error types.
//!
//! Provider adapters translate vendor-specific failures into these kinds at
//! the adapter boundary, so the dispatch layer never inspects raw response
//! text to decide whether a credential is exhausted.

/// Provider failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ProviderErrorKind {
    /// Credits, quota or credential are used up or rejected; retrying the same
    /// provider is pointless.
    #[display("Provider exhausted: {}", message)]
    Exhausted {
        /// HTTP status code, when the failure came from an HTTP response
        status_code: Option<u16>,
        /// Provider message
        message: String,
    },
    /// The provider reported a failure that may succeed later (overload, 5xx).
    #[display("Transient provider failure: {}", message)]
    Transient {
        /// HTTP status code, when the failure came from an HTTP response
        status_code: Option<u16>,
        /// Provider message
        message: String,
    },
    /// The call exceeded its deadline.
    #[display("Provider call timed out after {}s", _0)]
    Timeout(u64),
    /// The request never produced an HTTP response.
    #[display("Network error: {}", _0)]
    Network(String),
    /// Any other non-success HTTP response.
    #[display("HTTP {} error: {}", status_code, message)]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Provider message
        message: String,
    },
    /// The response body could not be understood.
    #[display("Failed to parse provider response: {}", _0)]
    Parse(String),
    /// The stored configuration cannot be used to build a client.
    #[display("Invalid provider configuration: {}", _0)]
    InvalidConfiguration(String),
}

impl ProviderErrorKind {
    /// HTTP status code attached to this failure, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderErrorKind::Exhausted { status_code, .. }
            | ProviderErrorKind::Transient { status_code, .. } => *status_code,
            ProviderErrorKind::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Whether the same provider may succeed if asked again later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderErrorKind::Transient { .. }
                | ProviderErrorKind::Timeout(_)
                | ProviderErrorKind::Network(_)
        )
    }
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use studyforge_error::{ProviderError, ProviderErrorKind};
///
/// let err = ProviderError::new(ProviderErrorKind::Exhausted {
///     status_code: Some(429),
///     message: "You exceeded your current quota".to_string(),
/// });
/// assert_eq!(err.kind.status_code(), Some(429));
/// assert!(!err.kind.is_transient());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error: {} at line {} in {}", kind, line, file)]
pub struct ProviderError {
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
