//! Per-tier token ceilings.

use crate::SubscriptionTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Daily and monthly token ceilings for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TierLimits {
    /// Tokens a principal may spend per calendar day
    pub daily_limit: u64,
    /// Tokens a principal may spend per calendar month
    pub monthly_limit: u64,
}

impl TierLimits {
    /// Create a limit pair.
    pub fn new(daily_limit: u64, monthly_limit: u64) -> Self {
        Self {
            daily_limit,
            monthly_limit,
        }
    }

    /// Hard-coded limits used when neither a persisted policy nor a
    /// configuration file provides one.
    ///
    /// # Examples
    ///
    /// ```
    /// use studyforge_core::{SubscriptionTier, TierLimits};
    ///
    /// let free = TierLimits::builtin(SubscriptionTier::Free);
    /// assert_eq!(free.daily_limit, 200);
    /// assert_eq!(free.monthly_limit, 5_000);
    /// ```
    pub fn builtin(tier: SubscriptionTier) -> Self {
        match tier {
            SubscriptionTier::Guest => Self::new(100, 1_000),
            SubscriptionTier::Free => Self::new(200, 5_000),
            SubscriptionTier::Pro => Self::new(2_000, 50_000),
            SubscriptionTier::Premium => Self::new(10_000, 200_000),
        }
    }
}

/// Where a set of effective limits came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LimitSource {
    /// An active policy stored by an administrator
    Policy,
    /// The configured (or built-in) default table
    Default,
}

/// Administrator-managed limit policy for one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitPolicy {
    /// Tier the policy applies to
    pub tier: SubscriptionTier,
    /// Daily token ceiling
    pub daily_limit: u64,
    /// Monthly token ceiling
    pub monthly_limit: u64,
    /// Free-text description shown in the admin console
    pub description: Option<String>,
    /// Inactive policies are ignored by the catalog
    pub is_active: bool,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl LimitPolicy {
    /// The ceilings carried by this policy.
    pub fn limits(&self) -> TierLimits {
        TierLimits::new(self.daily_limit, self.monthly_limit)
    }
}

/// Administrative edit of a tier's policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitPolicyUpdate {
    /// New daily ceiling
    pub daily_limit: u64,
    /// New monthly ceiling
    pub monthly_limit: u64,
    /// New description (replaces the old one)
    pub description: Option<String>,
}

impl LimitPolicyUpdate {
    /// Build the active policy this update produces.
    pub fn into_policy(self, tier: SubscriptionTier, now: DateTime<Utc>) -> LimitPolicy {
        LimitPolicy {
            tier,
            daily_limit: self.daily_limit,
            monthly_limit: self.monthly_limit,
            description: self.description,
            is_active: true,
            updated_at: now,
        }
    }
}
