//! In-memory limit policies.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use studyforge_core::{LimitPolicy, SubscriptionTier};
use studyforge_error::StudyforgeResult;
use studyforge_interface::LimitPolicyStore;
use tokio::sync::RwLock;

/// In-memory policy store, one policy per tier.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLimitPolicyStore {
    policies: Arc<RwLock<HashMap<SubscriptionTier, LimitPolicy>>>,
}

impl InMemoryLimitPolicyStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LimitPolicyStore for InMemoryLimitPolicyStore {
    async fn find_active(&self, tier: SubscriptionTier) -> StudyforgeResult<Option<LimitPolicy>> {
        Ok(self
            .policies
            .read()
            .await
            .get(&tier)
            .filter(|p| p.is_active)
            .cloned())
    }

    async fn list(&self) -> StudyforgeResult<Vec<LimitPolicy>> {
        let mut policies: Vec<LimitPolicy> =
            self.policies.read().await.values().cloned().collect();
        policies.sort_by_key(|p| p.tier);
        Ok(policies)
    }

    async fn upsert(&self, policy: &LimitPolicy) -> StudyforgeResult<LimitPolicy> {
        self.policies
            .write()
            .await
            .insert(policy.tier, policy.clone());
        Ok(policy.clone())
    }

    async fn deactivate(
        &self,
        tier: SubscriptionTier,
        now: DateTime<Utc>,
    ) -> StudyforgeResult<bool> {
        let mut policies = self.policies.write().await;
        match policies.get_mut(&tier) {
            Some(policy) => {
                policy.is_active = false;
                policy.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
