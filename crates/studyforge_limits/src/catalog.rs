//! Effective token limits per tier.

use crate::StudyforgeConfig;
use crate::config::LimitsCheck;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use strum::IntoEnumIterator;
use studyforge_core::{
    Clock, LimitPolicy, LimitPolicyUpdate, LimitSource, SubscriptionTier, TierLimits,
};
use studyforge_error::StudyforgeResult;
use studyforge_interface::LimitPolicyStore;
use tracing::{debug, info, instrument, warn};

/// Limits in force for a tier and where they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveLimits {
    /// Tier
    pub tier: SubscriptionTier,
    /// Ceilings in force
    pub limits: TierLimits,
    /// Persisted policy or default table
    pub source: LimitSource,
    /// Policy or default description
    pub description: Option<String>,
}

/// Resolves a tier's limits from administrator policies, falling back to the
/// configured defaults.
///
/// Resolution never fails: a store error is logged and the defaults are used,
/// so a broken policy table can only make limits revert, not block calls.
#[derive(Clone)]
pub struct LimitsCatalog {
    store: Arc<dyn LimitPolicyStore>,
    defaults: HashMap<SubscriptionTier, TierLimits>,
    descriptions: HashMap<SubscriptionTier, String>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for LimitsCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LimitsCatalog")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl LimitsCatalog {
    /// Build a catalog over a policy store with defaults from `config`.
    pub fn new(
        store: Arc<dyn LimitPolicyStore>,
        config: &StudyforgeConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let defaults = SubscriptionTier::iter()
            .map(|tier| (tier, config.tier_limits(tier)))
            .collect();
        let descriptions = SubscriptionTier::iter()
            .filter_map(|tier| {
                config
                    .tier_description(tier)
                    .map(|d| (tier, d.to_string()))
            })
            .collect();
        Self {
            store,
            defaults,
            descriptions,
            clock,
        }
    }

    /// Default limits for a tier, ignoring persisted policies.
    pub fn default_limits(&self, tier: SubscriptionTier) -> TierLimits {
        self.defaults
            .get(&tier)
            .copied()
            .unwrap_or_else(|| TierLimits::builtin(tier))
    }

    /// Limits in force for `tier`.
    #[instrument(skip(self))]
    pub async fn resolve(&self, tier: SubscriptionTier) -> TierLimits {
        match self.store.find_active(tier).await {
            Ok(Some(policy)) => {
                debug!(daily = policy.daily_limit, monthly = policy.monthly_limit, "Using stored policy");
                policy.limits()
            }
            Ok(None) => self.default_limits(tier),
            Err(e) => {
                warn!(error = %e, "Failed to load limit policy, using defaults");
                self.default_limits(tier)
            }
        }
    }

    /// Store an active policy for `tier`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the daily limit exceeds the monthly
    /// limit, or a database error if the store fails.
    #[instrument(skip(self, update), fields(daily = update.daily_limit, monthly = update.monthly_limit))]
    pub async fn update_policy(
        &self,
        tier: SubscriptionTier,
        update: LimitPolicyUpdate,
    ) -> StudyforgeResult<LimitPolicy> {
        TierLimits::new(update.daily_limit, update.monthly_limit).check()?;
        let policy = update.into_policy(tier, self.clock.now());
        let saved = self.store.upsert(&policy).await?;
        info!("Limit policy updated");
        Ok(saved)
    }

    /// Every tier with its effective limits.
    ///
    /// # Errors
    ///
    /// Returns a database error if the store fails.
    #[instrument(skip(self))]
    pub async fn list_policies(&self) -> StudyforgeResult<Vec<EffectiveLimits>> {
        let stored = self.store.list().await?;
        let rows = SubscriptionTier::iter()
            .map(|tier| {
                match stored.iter().find(|p| p.tier == tier && p.is_active) {
                    Some(policy) => EffectiveLimits {
                        tier,
                        limits: policy.limits(),
                        source: LimitSource::Policy,
                        description: policy.description.clone(),
                    },
                    None => EffectiveLimits {
                        tier,
                        limits: self.default_limits(tier),
                        source: LimitSource::Default,
                        description: self.descriptions.get(&tier).cloned(),
                    },
                }
            })
            .collect();
        Ok(rows)
    }

    /// Mark a tier's stored policy inactive so the defaults apply again.
    ///
    /// Returns whether a stored policy existed.
    ///
    /// # Errors
    ///
    /// Returns a database error if the store fails.
    #[instrument(skip(self))]
    pub async fn deactivate_policy(&self, tier: SubscriptionTier) -> StudyforgeResult<bool> {
        let existed = self.store.deactivate(tier, self.clock.now()).await?;
        if existed {
            info!("Limit policy deactivated");
        }
        Ok(existed)
    }
}
