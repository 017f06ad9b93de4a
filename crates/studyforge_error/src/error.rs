//! Top-level error wrapper types.

use crate::{
    ConfigError, DatabaseError, DispatchError, DispatchErrorKind, JsonError, ProviderError,
    QuotaError,
};

/// Every error the Studyforge core can surface.
///
/// # Examples
///
/// ```
/// use studyforge_error::{StudyforgeError, ConfigError};
///
/// let config_err = ConfigError::new("Missing field");
/// let err: StudyforgeError = config_err.into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum StudyforgeErrorKind {
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Principal is over its usage ceiling
    #[from(QuotaError)]
    Quota(QuotaError),
    /// AI provider call failed
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Provider selection or registry lookup failed
    #[from(DispatchError)]
    Dispatch(DispatchError),
    /// Ledger, policy or registry persistence failed
    #[from(DatabaseError)]
    Database(DatabaseError),
}

/// Studyforge error with kind discrimination.
///
/// # Examples
///
/// ```
/// use studyforge_error::{StudyforgeResult, DispatchError, DispatchErrorKind};
///
/// fn pick() -> StudyforgeResult<()> {
///     Err(DispatchError::new(DispatchErrorKind::ConfigurationMissing))?
/// }
///
/// let err = pick().unwrap_err();
/// assert_eq!(err.http_status(), 503);
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Studyforge Error: {}", _0)]
pub struct StudyforgeError(Box<StudyforgeErrorKind>);

impl StudyforgeError {
    /// Create a new error from a kind.
    pub fn new(kind: StudyforgeErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StudyforgeErrorKind {
        &self.0
    }

    /// Whether this error is a quota rejection.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self.kind(), StudyforgeErrorKind::Quota(_))
    }

    /// Whether this error means no provider is configured at all.
    pub fn is_configuration_missing(&self) -> bool {
        matches!(
            self.kind(),
            StudyforgeErrorKind::Dispatch(DispatchError {
                kind: DispatchErrorKind::ConfigurationMissing,
                ..
            })
        )
    }

    /// HTTP status an upstream web layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            StudyforgeErrorKind::Quota(_) => 429,
            StudyforgeErrorKind::Provider(_) => 502,
            StudyforgeErrorKind::Dispatch(e) => match &e.kind {
                DispatchErrorKind::ConfigurationMissing => 503,
                DispatchErrorKind::ProviderNotFound(_) => 404,
            },
            StudyforgeErrorKind::Config(_) => 400,
            StudyforgeErrorKind::Json(_) | StudyforgeErrorKind::Database(_) => 500,
        }
    }
}

// Generic From implementation for any type that converts to StudyforgeErrorKind
impl<T> From<T> for StudyforgeError
where
    T: Into<StudyforgeErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Studyforge operations.
pub type StudyforgeResult<T> = std::result::Result<T, StudyforgeError>;
