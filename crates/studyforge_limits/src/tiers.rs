//! Default limits per subscription tier.

use serde::{Deserialize, Serialize};
use studyforge_core::TierLimits;

/// Configured token ceilings for one tier.
///
/// ```toml
/// [tiers.free]
/// daily_limit = 200
/// monthly_limit = 5_000
/// description = "Registered users"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TierDefaults {
    /// Tokens per calendar day
    pub daily_limit: u64,

    /// Tokens per calendar month
    pub monthly_limit: u64,

    /// Shown alongside the limits in the admin console
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TierDefaults {
    /// The limit pair.
    pub fn limits(&self) -> TierLimits {
        TierLimits::new(self.daily_limit, self.monthly_limit)
    }
}

impl From<TierLimits> for TierDefaults {
    fn from(limits: TierLimits) -> Self {
        Self {
            daily_limit: limits.daily_limit,
            monthly_limit: limits.monthly_limit,
            description: None,
        }
    }
}
