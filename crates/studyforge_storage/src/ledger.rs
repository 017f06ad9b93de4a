//! In-memory usage ledgers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use studyforge_core::{PrincipalId, TokenDelta, UsageLedger, WindowReset};
use studyforge_error::StudyforgeResult;
use studyforge_interface::UsageLedgerStore;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory ledger store keyed by principal.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUsageLedgerStore {
    ledgers: Arc<RwLock<HashMap<PrincipalId, UsageLedger>>>,
}

impl InMemoryUsageLedgerStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored ledgers (for testing).
    pub async fn len(&self) -> usize {
        self.ledgers.read().await.len()
    }

    /// Check if the store is empty (for testing).
    pub async fn is_empty(&self) -> bool {
        self.ledgers.read().await.is_empty()
    }
}

#[async_trait]
impl UsageLedgerStore for InMemoryUsageLedgerStore {
    async fn find_one(&self, principal: &PrincipalId) -> StudyforgeResult<Option<UsageLedger>> {
        Ok(self.ledgers.read().await.get(principal).cloned())
    }

    async fn roll_windows(
        &self,
        principal: &PrincipalId,
        now: DateTime<Utc>,
    ) -> StudyforgeResult<(UsageLedger, WindowReset)> {
        let mut ledgers = self.ledgers.write().await;
        let ledger = ledgers.entry(principal.clone()).or_insert_with(|| {
            debug!(principal = %principal, "Creating usage ledger");
            UsageLedger::new(principal.clone(), now)
        });
        let reset = ledger.roll_windows(now);
        Ok((ledger.clone(), reset))
    }

    async fn increment(
        &self,
        principal: &PrincipalId,
        delta: TokenDelta,
        now: DateTime<Utc>,
    ) -> StudyforgeResult<UsageLedger> {
        let mut ledgers = self.ledgers.write().await;
        let ledger = ledgers
            .entry(principal.clone())
            .or_insert_with(|| UsageLedger::new(principal.clone(), now));
        ledger.roll_windows(now);
        ledger.add(delta, now);
        Ok(ledger.clone())
    }
}
