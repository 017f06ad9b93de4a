//! Token estimation and call results.

use crate::{ProviderId, ProviderKind, TokenDelta};
use serde::{Deserialize, Serialize};

/// Fixed allowance added to advisory pre-call estimates to cover the reply.
pub const DEFAULT_ADVISORY_OVERHEAD_TOKENS: u64 = 50;

/// Token usage statistics for a single provider call.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct TokenUsage {
    /// Tokens in the prompt/input.
    prompt_tokens: u64,
    /// Tokens in the response/output.
    completion_tokens: u64,
    /// Total tokens (prompt + completion).
    total_tokens: u64,
}

impl TokenUsage {
    /// Create a usage record; the total is the sum of both sides.
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    /// Heuristic usage for a prompt/response pair.
    pub fn estimate(prompt: &str, response: &str) -> Self {
        Self::new(estimate_tokens(prompt), estimate_tokens(response))
    }

    /// Ledger delta charging these figures.
    pub fn to_delta(&self) -> TokenDelta {
        TokenDelta::from_parts(
            self.total_tokens,
            Some(self.prompt_tokens),
            Some(self.completion_tokens),
        )
    }
}

/// Estimate tokens as one per four characters, rounded up.
///
/// # Examples
///
/// ```
/// use studyforge_core::estimate_tokens;
///
/// assert_eq!(estimate_tokens(""), 0);
/// assert_eq!(estimate_tokens("abcd"), 1);
/// assert_eq!(estimate_tokens("abcde"), 2);
/// ```
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

/// Pre-call estimate used only for the quota pre-check.
pub fn advisory_estimate(prompt: &str, overhead: u64) -> u64 {
    estimate_tokens(prompt).saturating_add(overhead)
}

/// How post-call usage is charged to the ledger.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TokenAccounting {
    /// Always charge the length heuristic; reported counts are only logged
    #[default]
    Heuristic,
    /// Charge provider-reported counts when the response carries them
    PreferReported,
}

impl TokenAccounting {
    /// Usage to charge for a completed call.
    pub fn charge(&self, prompt: &str, response: &str, reported: Option<TokenUsage>) -> TokenUsage {
        match (self, reported) {
            (TokenAccounting::PreferReported, Some(usage)) if usage.total_tokens > 0 => usage,
            _ => TokenUsage::estimate(prompt, response),
        }
    }
}

/// Outcome of a dispatched AI call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResult {
    /// Generated text
    pub text: String,
    /// Provider that produced the text
    pub provider_id: ProviderId,
    /// Backend family of that provider
    pub provider_kind: ProviderKind,
    /// Model that produced the text
    pub model: String,
    /// Tokens charged for the call
    pub usage: TokenUsage,
    /// Whether the first selected provider was exhausted and a fallback answered
    pub fell_back: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_counts_characters_not_bytes() {
        // four multi-byte scalars
        assert_eq!(estimate_tokens("éééé"), 1);
        assert_eq!(estimate_tokens(&"x".repeat(401)), 101);
    }

    #[test]
    fn advisory_adds_overhead() {
        assert_eq!(advisory_estimate("abcdefgh", DEFAULT_ADVISORY_OVERHEAD_TOKENS), 52);
    }

    #[test]
    fn usage_sums_both_sides() {
        let usage = TokenUsage::estimate(&"p".repeat(40), &"r".repeat(9));
        assert_eq!(*usage.prompt_tokens(), 10);
        assert_eq!(*usage.completion_tokens(), 3);
        assert_eq!(*usage.total_tokens(), 13);
    }

    #[test]
    fn heuristic_ignores_reported_counts() {
        let reported = TokenUsage::new(1_000, 2_000);
        let charged = TokenAccounting::Heuristic.charge("abcd", "abcd", Some(reported));
        assert_eq!(*charged.total_tokens(), 2);
    }

    #[test]
    fn prefer_reported_falls_back_when_missing() {
        let reported = TokenUsage::new(7, 3);
        assert_eq!(
            TokenAccounting::PreferReported.charge("abcd", "abcd", Some(reported)),
            reported
        );
        assert_eq!(
            *TokenAccounting::PreferReported
                .charge("abcd", "abcd", None)
                .total_tokens(),
            2
        );
    }
}
