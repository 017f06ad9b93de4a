//! Failure classification.

use serde::{Deserialize, Serialize};
use studyforge_error::{ProviderErrorKind, StudyforgeError, StudyforgeErrorKind};

/// How the executor reacts to a failed provider call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum FailureClass {
    /// Credits or quota used up: mark exhausted, fall back once
    Exhaustion,
    /// Overload, 5xx, timeout or network: count a strike, no retry
    Transient,
    /// Anything else: count a strike, no retry
    Unknown,
}

/// Classify a provider call failure.
///
/// Pure over the structured kinds adapters produce; message text is never
/// inspected here.
///
/// # Examples
///
/// ```
/// use studyforge_dispatch::{classify, FailureClass};
/// use studyforge_error::{ProviderError, ProviderErrorKind, StudyforgeError};
///
/// let err: StudyforgeError = ProviderError::new(ProviderErrorKind::Timeout(60)).into();
/// assert_eq!(classify(&err), FailureClass::Transient);
/// ```
pub fn classify(error: &StudyforgeError) -> FailureClass {
    match error.kind() {
        StudyforgeErrorKind::Provider(e) => match &e.kind {
            ProviderErrorKind::Exhausted { .. } => FailureClass::Exhaustion,
            ProviderErrorKind::Transient { .. }
            | ProviderErrorKind::Timeout(_)
            | ProviderErrorKind::Network(_) => FailureClass::Transient,
            ProviderErrorKind::Api { .. }
            | ProviderErrorKind::Parse(_)
            | ProviderErrorKind::InvalidConfiguration(_) => FailureClass::Unknown,
        },
        _ => FailureClass::Unknown,
    }
}
