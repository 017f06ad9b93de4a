//! Result of a quota check.

use crate::{TierLimits, UsageLedger};
use serde::{Deserialize, Serialize};

/// Outcome of asking whether a principal may spend some tokens now.
///
/// Remaining figures saturate at zero: concurrent calls may push usage past
/// a limit, and the status reports that as "nothing left", never as a
/// negative balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuotaStatus {
    /// Whether both windows can absorb the requested tokens
    pub allowed: bool,
    /// Tokens left in the daily window
    pub daily_remaining: u64,
    /// Tokens left in the monthly window
    pub monthly_remaining: u64,
    /// Daily ceiling
    pub daily_limit: u64,
    /// Monthly ceiling
    pub monthly_limit: u64,
    /// Tokens spent in the daily window
    pub daily_used: u64,
    /// Tokens spent in the monthly window
    pub monthly_used: u64,
}

impl QuotaStatus {
    /// Evaluate a ledger (with windows already rolled) against limits.
    ///
    /// # Examples
    ///
    /// ```
    /// use studyforge_core::{PrincipalId, QuotaStatus, TierLimits, TokenDelta, UsageLedger};
    ///
    /// let now = chrono::Utc::now();
    /// let mut ledger = UsageLedger::new(PrincipalId::new("u"), now);
    /// ledger.add(TokenDelta::from_total(150), now);
    ///
    /// let status = QuotaStatus::evaluate(TierLimits::new(200, 5_000), &ledger, 100);
    /// assert!(!status.allowed);
    /// assert_eq!(status.daily_remaining, 50);
    /// ```
    pub fn evaluate(limits: TierLimits, ledger: &UsageLedger, tokens_needed: u64) -> Self {
        let daily_remaining = limits.daily_limit.saturating_sub(ledger.daily_tokens_used);
        let monthly_remaining = limits
            .monthly_limit
            .saturating_sub(ledger.monthly_tokens_used);

        Self {
            allowed: daily_remaining >= tokens_needed && monthly_remaining >= tokens_needed,
            daily_remaining,
            monthly_remaining,
            daily_limit: limits.daily_limit,
            monthly_limit: limits.monthly_limit,
            daily_used: ledger.daily_tokens_used,
            monthly_used: ledger.monthly_tokens_used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PrincipalId, TokenDelta};
    use chrono::Utc;

    fn ledger_with(daily: u64, monthly_extra: u64) -> UsageLedger {
        let now = Utc::now();
        let mut ledger = UsageLedger::new(PrincipalId::new("p"), now);
        ledger.add(TokenDelta::from_total(daily), now);
        ledger.monthly_tokens_used += monthly_extra;
        ledger
    }

    #[test]
    fn exact_remaining_is_allowed() {
        let status = QuotaStatus::evaluate(TierLimits::new(200, 5_000), &ledger_with(100, 0), 100);
        assert!(status.allowed);
        assert_eq!(status.daily_remaining, 100);
    }

    #[test]
    fn monthly_window_can_deny_alone() {
        let status =
            QuotaStatus::evaluate(TierLimits::new(200, 5_000), &ledger_with(0, 4_990), 20);
        assert!(!status.allowed);
        assert_eq!(status.daily_remaining, 200);
        assert_eq!(status.monthly_remaining, 10);
    }

    #[test]
    fn overshoot_saturates_at_zero() {
        let status = QuotaStatus::evaluate(TierLimits::new(200, 5_000), &ledger_with(260, 0), 1);
        assert!(!status.allowed);
        assert_eq!(status.daily_remaining, 0);
        assert_eq!(status.daily_used, 260);
    }
}
