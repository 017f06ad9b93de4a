//! Per-principal rolling usage counters.
//!
//! Window resets are computed from calendar components (UTC date for the
//! daily window, year and month for the monthly window), never from elapsed
//! durations. A ledger idle for a week resets its daily counters once on the
//! next access; it does not accumulate "days owed".

use crate::PrincipalId;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Token amounts added to a ledger by one successful call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TokenDelta {
    /// Total tokens
    pub total: u64,
    /// Input (prompt) tokens
    pub input: u64,
    /// Output (completion) tokens
    pub output: u64,
}

impl TokenDelta {
    /// Share of a bare total attributed to input when no split is known.
    pub const INPUT_SHARE: f64 = 0.3;

    /// Create a delta with an explicit split.
    pub fn new(total: u64, input: u64, output: u64) -> Self {
        Self {
            total,
            input,
            output,
        }
    }

    /// Estimate a 30/70 input/output split for a bare total.
    ///
    /// # Examples
    ///
    /// ```
    /// use studyforge_core::TokenDelta;
    ///
    /// let delta = TokenDelta::from_total(100);
    /// assert_eq!((delta.input, delta.output), (30, 70));
    /// ```
    pub fn from_total(total: u64) -> Self {
        let input = ((total as f64) * Self::INPUT_SHARE).round() as u64;
        let input = input.min(total);
        Self {
            total,
            input,
            output: total - input,
        }
    }

    /// Build a delta from the optional caller-supplied split.
    ///
    /// When neither side is given (or both are zero) the 30/70 estimate is used.
    pub fn from_parts(total: u64, input: Option<u64>, output: Option<u64>) -> Self {
        let input = input.unwrap_or(0);
        let output = output.unwrap_or(0);
        if input == 0 && output == 0 {
            Self::from_total(total)
        } else {
            Self::new(total, input, output)
        }
    }
}

/// Which windows a call to [`UsageLedger::roll_windows`] zeroed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowReset {
    /// Daily counters were zeroed
    pub daily: bool,
    /// Monthly counters were zeroed
    pub monthly: bool,
}

impl WindowReset {
    /// Whether any window was reset (and the ledger therefore needs saving).
    pub fn any(&self) -> bool {
        self.daily || self.monthly
    }
}

/// Rolling usage counters for one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLedger {
    /// Owner of the ledger
    pub principal_id: PrincipalId,
    /// Lifetime token total (never decreases)
    pub total_tokens_used: u64,
    /// Input tokens in the current day
    pub daily_input_tokens: u64,
    /// Output tokens in the current day
    pub daily_output_tokens: u64,
    /// Total tokens in the current day
    pub daily_tokens_used: u64,
    /// Input tokens in the current month
    pub monthly_input_tokens: u64,
    /// Output tokens in the current month
    pub monthly_output_tokens: u64,
    /// Total tokens in the current month
    pub monthly_tokens_used: u64,
    /// When the daily counters were last zeroed
    pub last_daily_reset_at: DateTime<Utc>,
    /// When the monthly counters were last zeroed
    pub last_monthly_reset_at: DateTime<Utc>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl UsageLedger {
    /// Create an empty ledger whose windows start at `now`.
    pub fn new(principal_id: PrincipalId, now: DateTime<Utc>) -> Self {
        Self {
            principal_id,
            total_tokens_used: 0,
            daily_input_tokens: 0,
            daily_output_tokens: 0,
            daily_tokens_used: 0,
            monthly_input_tokens: 0,
            monthly_output_tokens: 0,
            monthly_tokens_used: 0,
            last_daily_reset_at: now,
            last_monthly_reset_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `now` falls on a later calendar day than the last daily reset.
    pub fn daily_window_expired(&self, now: DateTime<Utc>) -> bool {
        now.date_naive() > self.last_daily_reset_at.date_naive()
    }

    /// Whether `now` falls in a different calendar month (or year) than the
    /// last monthly reset.
    pub fn monthly_window_expired(&self, now: DateTime<Utc>) -> bool {
        (now.year(), now.month())
            != (
                self.last_monthly_reset_at.year(),
                self.last_monthly_reset_at.month(),
            )
    }

    /// Zero any expired window and move its reset marker to `now`.
    ///
    /// Idempotent for a given `now`: a second call in the same day and month
    /// resets nothing.
    pub fn roll_windows(&mut self, now: DateTime<Utc>) -> WindowReset {
        let mut reset = WindowReset::default();

        if self.daily_window_expired(now) {
            self.daily_input_tokens = 0;
            self.daily_output_tokens = 0;
            self.daily_tokens_used = 0;
            self.last_daily_reset_at = now;
            reset.daily = true;
        }

        if self.monthly_window_expired(now) {
            self.monthly_input_tokens = 0;
            self.monthly_output_tokens = 0;
            self.monthly_tokens_used = 0;
            self.last_monthly_reset_at = now;
            reset.monthly = true;
        }

        if reset.any() {
            self.updated_at = now;
        }
        reset
    }

    /// Add a delta to the lifetime, daily and monthly counters.
    ///
    /// Callers roll the windows first; stores do both under one lock or
    /// transaction.
    pub fn add(&mut self, delta: TokenDelta, now: DateTime<Utc>) {
        self.total_tokens_used = self.total_tokens_used.saturating_add(delta.total);
        self.daily_tokens_used = self.daily_tokens_used.saturating_add(delta.total);
        self.daily_input_tokens = self.daily_input_tokens.saturating_add(delta.input);
        self.daily_output_tokens = self.daily_output_tokens.saturating_add(delta.output);
        self.monthly_tokens_used = self.monthly_tokens_used.saturating_add(delta.total);
        self.monthly_input_tokens = self.monthly_input_tokens.saturating_add(delta.input);
        self.monthly_output_tokens = self.monthly_output_tokens.saturating_add(delta.output);
        self.updated_at = now;
    }

    /// Read model of this ledger.
    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot::from(self)
    }
}

/// Read-only view of a ledger returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Owner of the ledger
    pub principal_id: PrincipalId,
    /// Lifetime token total
    pub total_tokens_used: u64,
    /// Total tokens in the current day
    pub daily_tokens_used: u64,
    /// Input tokens in the current day
    pub daily_input_tokens: u64,
    /// Output tokens in the current day
    pub daily_output_tokens: u64,
    /// Total tokens in the current month
    pub monthly_tokens_used: u64,
    /// Input tokens in the current month
    pub monthly_input_tokens: u64,
    /// Output tokens in the current month
    pub monthly_output_tokens: u64,
    /// When the daily counters were last zeroed
    pub last_daily_reset_at: DateTime<Utc>,
    /// When the monthly counters were last zeroed
    pub last_monthly_reset_at: DateTime<Utc>,
}

impl From<&UsageLedger> for UsageSnapshot {
    fn from(ledger: &UsageLedger) -> Self {
        Self {
            principal_id: ledger.principal_id.clone(),
            total_tokens_used: ledger.total_tokens_used,
            daily_tokens_used: ledger.daily_tokens_used,
            daily_input_tokens: ledger.daily_input_tokens,
            daily_output_tokens: ledger.daily_output_tokens,
            monthly_tokens_used: ledger.monthly_tokens_used,
            monthly_input_tokens: ledger.monthly_input_tokens,
            monthly_output_tokens: ledger.monthly_output_tokens,
            last_daily_reset_at: ledger.last_daily_reset_at,
            last_monthly_reset_at: ledger.last_monthly_reset_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn ledger_at(now: DateTime<Utc>) -> UsageLedger {
        UsageLedger::new(PrincipalId::new("user-1"), now)
    }

    #[test]
    fn split_always_sums_to_total() {
        for total in [0, 1, 2, 3, 7, 99, 1_001] {
            let delta = TokenDelta::from_total(total);
            assert_eq!(delta.input + delta.output, total);
        }
    }

    #[test]
    fn explicit_split_is_kept() {
        let delta = TokenDelta::from_parts(100, Some(10), Some(90));
        assert_eq!(delta, TokenDelta::new(100, 10, 90));
        let estimated = TokenDelta::from_parts(100, Some(0), None);
        assert_eq!(estimated, TokenDelta::from_total(100));
    }

    #[test]
    fn same_day_does_not_reset() {
        let mut ledger = ledger_at(at(2024, 3, 10, 1));
        ledger.add(TokenDelta::from_total(50), at(2024, 3, 10, 2));
        let reset = ledger.roll_windows(at(2024, 3, 10, 23));
        assert!(!reset.any());
        assert_eq!(ledger.daily_tokens_used, 50);
    }

    #[test]
    fn day_boundary_resets_daily_only() {
        let mut ledger = ledger_at(at(2024, 3, 10, 1));
        ledger.add(TokenDelta::from_total(180), at(2024, 3, 10, 23));
        let reset = ledger.roll_windows(at(2024, 3, 11, 0));
        assert_eq!(
            reset,
            WindowReset {
                daily: true,
                monthly: false
            }
        );
        assert_eq!(ledger.daily_tokens_used, 0);
        assert_eq!(ledger.daily_input_tokens, 0);
        assert_eq!(ledger.daily_output_tokens, 0);
        assert_eq!(ledger.monthly_tokens_used, 180);
        assert_eq!(ledger.total_tokens_used, 180);
    }

    #[test]
    fn reset_happens_once_per_crossing() {
        let mut ledger = ledger_at(at(2024, 3, 10, 1));
        ledger.add(TokenDelta::from_total(100), at(2024, 3, 10, 2));
        assert!(ledger.roll_windows(at(2024, 3, 11, 8)).daily);
        ledger.add(TokenDelta::from_total(40), at(2024, 3, 11, 8));
        assert!(!ledger.roll_windows(at(2024, 3, 11, 9)).daily);
        assert_eq!(ledger.daily_tokens_used, 40);
    }

    #[test]
    fn idle_ledger_resets_counters_not_days_owed() {
        let mut ledger = ledger_at(at(2024, 3, 1, 1));
        ledger.add(TokenDelta::from_total(90), at(2024, 3, 1, 2));
        let reset = ledger.roll_windows(at(2024, 3, 20, 12));
        assert!(reset.daily);
        assert_eq!(ledger.daily_tokens_used, 0);
        assert_eq!(ledger.last_daily_reset_at, at(2024, 3, 20, 12));
    }

    #[test]
    fn month_change_resets_regardless_of_day_of_month() {
        let mut ledger = ledger_at(at(2024, 1, 31, 10));
        ledger.add(TokenDelta::from_total(500), at(2024, 1, 31, 11));
        let reset = ledger.roll_windows(at(2024, 2, 1, 0));
        assert!(reset.daily && reset.monthly);
        assert_eq!(ledger.monthly_tokens_used, 0);
    }

    #[test]
    fn same_month_next_year_resets_monthly() {
        let mut ledger = ledger_at(at(2023, 5, 15, 10));
        ledger.add(TokenDelta::from_total(500), at(2023, 5, 15, 11));
        let reset = ledger.roll_windows(at(2024, 5, 15, 10));
        assert!(reset.monthly);
        assert_eq!(ledger.monthly_tokens_used, 0);
        assert_eq!(ledger.total_tokens_used, 500);
    }

    #[test]
    fn add_updates_every_counter() {
        let mut ledger = ledger_at(at(2024, 3, 10, 1));
        ledger.add(TokenDelta::new(10, 4, 6), at(2024, 3, 10, 2));
        let snap = ledger.snapshot();
        assert_eq!(snap.total_tokens_used, 10);
        assert_eq!(snap.daily_tokens_used, 10);
        assert_eq!(snap.daily_input_tokens, 4);
        assert_eq!(snap.daily_output_tokens, 6);
        assert_eq!(snap.monthly_tokens_used, 10);
        assert_eq!(snap.monthly_input_tokens, 4);
        assert_eq!(snap.monthly_output_tokens, 6);
    }
}
