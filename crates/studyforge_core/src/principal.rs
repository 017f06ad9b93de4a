//! Principals and subscription tiers.

use serde::{Deserialize, Serialize};

/// Identity of the user or guest session a quota is tracked for.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Create a principal id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PrincipalId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Subscription class that determines a principal's limit policy.
///
/// # Examples
///
/// ```
/// use studyforge_core::SubscriptionTier;
/// use std::str::FromStr;
///
/// assert_eq!(SubscriptionTier::from_str("Pro").unwrap(), SubscriptionTier::Pro);
/// assert_eq!(SubscriptionTier::Premium.to_string(), "premium");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SubscriptionTier {
    /// Anonymous session
    Guest,
    /// Registered, non-paying user
    Free,
    /// Paid tier
    Pro,
    /// Highest paid tier
    Premium,
}

/// An authenticated principal as handed over by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    /// Principal identity
    pub id: PrincipalId,
    /// Subscription tier resolved upstream
    pub tier: SubscriptionTier,
}

impl Principal {
    /// Create a principal.
    pub fn new(id: impl Into<PrincipalId>, tier: SubscriptionTier) -> Self {
        Self {
            id: id.into(),
            tier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn tier_names_round_trip_through_strings() {
        for tier in SubscriptionTier::iter() {
            assert_eq!(SubscriptionTier::from_str(tier.as_ref()).unwrap(), tier);
        }
        assert!(SubscriptionTier::from_str("gold").is_err());
    }

    #[test]
    fn tier_serializes_lowercase() {
        let json = serde_json::to_string(&SubscriptionTier::Guest).unwrap();
        assert_eq!(json, "\"guest\"");
    }
}
