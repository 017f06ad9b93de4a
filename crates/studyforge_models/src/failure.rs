//! Translation of vendor failures into [`ProviderErrorKind`].
//!
//! Every adapter funnels non-success responses and transport errors through
//! this module, so the dispatch layer classifies outcomes from structured
//! kinds rather than message text.

use studyforge_error::{ProviderError, ProviderErrorKind};

/// Lowercase fragments that mark a response as credits/quota/credential exhaustion.
pub const EXHAUSTION_MARKERS: &[&str] = &[
    "quota",
    "rate limit",
    "rate_limit",
    "credits",
    "credit balance",
    "insufficient",
    "exceeded",
    "forbidden",
    "unauthorized",
    "invalid_request_error",
    "resource_exhausted",
    "429",
    "403",
];

/// Longest provider message kept on an error.
const MAX_MESSAGE_LEN: usize = 500;

/// Whether `text` contains any exhaustion marker (case-insensitive).
///
/// # Examples
///
/// ```
/// use studyforge_models::mentions_exhaustion;
///
/// assert!(mentions_exhaustion("You exceeded your current quota"));
/// assert!(mentions_exhaustion("Error 429: Too Many Requests"));
/// assert!(!mentions_exhaustion("The server had an error while processing"));
/// ```
pub fn mentions_exhaustion(text: &str) -> bool {
    let lower = text.to_lowercase();
    EXHAUSTION_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Map a non-success HTTP response to a provider error.
///
/// - 401, 403, 429, or a body mentioning exhaustion: [`ProviderErrorKind::Exhausted`]
/// - 408 or 5xx: [`ProviderErrorKind::Transient`]
/// - anything else: [`ProviderErrorKind::Api`]
#[track_caller]
pub fn translate_failure(status: u16, body: &str) -> ProviderError {
    let message = truncate(body);
    let kind = if matches!(status, 401 | 403 | 429) || mentions_exhaustion(body) {
        ProviderErrorKind::Exhausted {
            status_code: Some(status),
            message,
        }
    } else if status == 408 || (500..600).contains(&status) {
        ProviderErrorKind::Transient {
            status_code: Some(status),
            message,
        }
    } else {
        ProviderErrorKind::Api {
            status_code: status,
            message,
        }
    };
    ProviderError::new(kind)
}

/// Map a request that produced no usable response.
#[track_caller]
pub fn translate_transport(err: &reqwest::Error, timeout_secs: u64) -> ProviderError {
    if err.is_timeout() {
        ProviderError::new(ProviderErrorKind::Timeout(timeout_secs))
    } else if err.is_decode() {
        ProviderError::new(ProviderErrorKind::Parse(err.to_string()))
    } else {
        ProviderError::new(ProviderErrorKind::Network(err.to_string()))
    }
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_MESSAGE_LEN) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_status_is_exhaustion() {
        let err = translate_failure(429, "slow down");
        assert!(matches!(
            err.kind,
            ProviderErrorKind::Exhausted {
                status_code: Some(429),
                ..
            }
        ));
    }

    #[test]
    fn auth_statuses_are_exhaustion() {
        for status in [401, 403] {
            assert!(matches!(
                translate_failure(status, "").kind,
                ProviderErrorKind::Exhausted { .. }
            ));
        }
    }

    #[test]
    fn body_vocabulary_wins_over_status() {
        let err = translate_failure(400, r#"{"error":{"type":"insufficient_quota"}}"#);
        assert!(matches!(err.kind, ProviderErrorKind::Exhausted { .. }));

        let err = translate_failure(500, "credit balance is too low");
        assert!(matches!(err.kind, ProviderErrorKind::Exhausted { .. }));
    }

    #[test]
    fn server_errors_are_transient() {
        for status in [408, 500, 502, 503, 529] {
            let err = translate_failure(status, "overloaded");
            assert!(err.kind.is_transient(), "status {}", status);
        }
    }

    #[test]
    fn other_client_errors_are_api_errors() {
        let err = translate_failure(404, "model not found");
        assert_eq!(
            err.kind,
            ProviderErrorKind::Api {
                status_code: 404,
                message: "model not found".to_string()
            }
        );
    }

    #[test]
    fn long_bodies_are_truncated() {
        let err = translate_failure(404, &"x".repeat(2_000));
        match err.kind {
            ProviderErrorKind::Api { message, .. } => {
                assert!(message.chars().count() <= MAX_MESSAGE_LEN + 1)
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }
}
