//! Pre-call quota checks.

use std::sync::Arc;
use studyforge_core::{Clock, Principal, QuotaStatus};
use studyforge_error::{QuotaError, QuotaErrorKind, StudyforgeResult};
use studyforge_interface::UsageLedgerStore;
use studyforge_limits::LimitsCatalog;
use tracing::{debug, instrument, warn};

/// Read-only quota check backed by the usage ledger.
#[derive(Clone)]
pub struct QuotaGate {
    ledgers: Arc<dyn UsageLedgerStore>,
    catalog: LimitsCatalog,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for QuotaGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaGate")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl QuotaGate {
    /// Create a gate over a ledger store and limits catalog.
    pub fn new(
        ledgers: Arc<dyn UsageLedgerStore>,
        catalog: LimitsCatalog,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledgers,
            catalog,
            clock,
        }
    }

    /// Whether `principal` can spend `tokens_needed` in both windows.
    ///
    /// Lazily creates the ledger and zeroes expired windows; nothing else is
    /// written.
    ///
    /// # Errors
    ///
    /// Returns a database error if the ledger cannot be loaded or the reset
    /// cannot be persisted.
    #[instrument(skip(self, principal), fields(principal = %principal.id, tier = %principal.tier))]
    pub async fn check_quota(
        &self,
        principal: &Principal,
        tokens_needed: u64,
    ) -> StudyforgeResult<QuotaStatus> {
        let (ledger, reset) = self
            .ledgers
            .roll_windows(&principal.id, self.clock.now())
            .await?;
        if reset.any() {
            debug!(daily = reset.daily, monthly = reset.monthly, "Usage windows reset");
        }

        let limits = self.catalog.resolve(principal.tier).await;
        let status = QuotaStatus::evaluate(limits, &ledger, tokens_needed);
        debug!(
            allowed = status.allowed,
            daily_remaining = status.daily_remaining,
            monthly_remaining = status.monthly_remaining,
            "Quota checked"
        );
        Ok(status)
    }

    /// Like [`check_quota`](Self::check_quota), but a denial is an error.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaErrorKind::Exceeded`] carrying the remaining figures
    /// when either window cannot absorb `tokens_needed`.
    #[instrument(skip(self, principal), fields(principal = %principal.id))]
    pub async fn require(
        &self,
        principal: &Principal,
        tokens_needed: u64,
    ) -> StudyforgeResult<QuotaStatus> {
        let status = self.check_quota(principal, tokens_needed).await?;
        if status.allowed {
            return Ok(status);
        }
        warn!(
            tokens_needed,
            daily_remaining = status.daily_remaining,
            monthly_remaining = status.monthly_remaining,
            "Quota exceeded"
        );
        Err(QuotaError::new(QuotaErrorKind::Exceeded {
            tokens_needed,
            daily_remaining: status.daily_remaining,
            monthly_remaining: status.monthly_remaining,
            daily_limit: status.daily_limit,
            monthly_limit: status.monthly_limit,
        })
        .into())
    }
}
