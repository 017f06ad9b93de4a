//! Dispatch and registry error types.

/// Dispatch error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DispatchErrorKind {
    /// The provider registry is empty; no AI call can be served.
    #[display("No AI provider is configured")]
    ConfigurationMissing,
    /// An administrative operation referenced an unknown provider.
    #[display("Provider {} not found", _0)]
    ProviderNotFound(String),
}

/// Dispatch error with source location tracking.
///
/// # Examples
///
/// ```
/// use studyforge_error::{DispatchError, DispatchErrorKind};
///
/// let err = DispatchError::new(DispatchErrorKind::ConfigurationMissing);
/// assert!(format!("{}", err).contains("No AI provider"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Dispatch Error: {} at line {} in {}", kind, line, file)]
pub struct DispatchError {
    /// The kind of error that occurred
    pub kind: DispatchErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl DispatchError {
    /// Create a new DispatchError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DispatchErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
