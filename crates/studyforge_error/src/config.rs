//! Configuration error types.

/// Configuration error with source location.
///
/// Raised for unreadable or unparsable configuration files and for
/// administrative input that violates a configuration invariant (for example
/// an unknown tier name or a daily limit above the monthly limit).
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use studyforge_error::ConfigError;
    ///
    /// let err = ConfigError::new("Unknown tier 'gold'");
    /// assert!(err.message.contains("gold"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// Create an error for a configuration key holding an unusable value.
    #[track_caller]
    pub fn invalid_value(key: &str, value: impl std::fmt::Display) -> Self {
        Self::new(format!("Invalid value for '{}': {}", key, value))
    }
}
