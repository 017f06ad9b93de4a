//! Post-call token accounting.

use std::sync::Arc;
use studyforge_core::{Clock, PrincipalId, TokenDelta, UsageSnapshot};
use studyforge_error::StudyforgeResult;
use studyforge_interface::UsageLedgerStore;
use tracing::{debug, error, instrument};

/// Records token consumption on a principal's ledger.
///
/// This is the only writer of ledger counters. Call it strictly after a
/// successful AI call.
#[derive(Clone)]
pub struct UsageLedgerService {
    store: Arc<dyn UsageLedgerStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for UsageLedgerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageLedgerService").finish_non_exhaustive()
    }
}

impl UsageLedgerService {
    /// Create a service over a ledger store.
    pub fn new(store: Arc<dyn UsageLedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Charge tokens to a principal.
    ///
    /// When neither `input_tokens` nor `output_tokens` is given (or both are
    /// zero) the total is split 30/70. Expired windows are zeroed and the
    /// counters incremented in one store operation.
    ///
    /// # Errors
    ///
    /// Returns a database error if the increment cannot be persisted.
    #[instrument(skip(self), fields(principal = %principal))]
    pub async fn consume_tokens(
        &self,
        principal: &PrincipalId,
        tokens_used: u64,
        input_tokens: Option<u64>,
        output_tokens: Option<u64>,
    ) -> StudyforgeResult<UsageSnapshot> {
        let delta = TokenDelta::from_parts(tokens_used, input_tokens, output_tokens);
        let ledger = self
            .store
            .increment(principal, delta, self.clock.now())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to record token usage");
                e
            })?;
        debug!(
            total = delta.total,
            daily_used = ledger.daily_tokens_used,
            monthly_used = ledger.monthly_tokens_used,
            "Tokens consumed"
        );
        Ok(ledger.snapshot())
    }

    /// Current counters for a principal, after lazy window resets.
    ///
    /// # Errors
    ///
    /// Returns a database error if the ledger cannot be loaded or saved.
    #[instrument(skip(self), fields(principal = %principal))]
    pub async fn usage_snapshot(&self, principal: &PrincipalId) -> StudyforgeResult<UsageSnapshot> {
        let (ledger, _) = self.store.roll_windows(principal, self.clock.now()).await?;
        Ok(ledger.snapshot())
    }
}
