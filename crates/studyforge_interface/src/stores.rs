//! Persistence traits.
//!
//! Every method that changes a record does so atomically for that record:
//! the in-memory implementations hold a write lock across read-modify-write,
//! the Postgres implementations run inside a transaction with row locks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use studyforge_core::{
    LimitPolicy, NewProviderConfig, PrincipalId, ProviderConfig, ProviderId, ProviderTransition,
    SubscriptionTier, TokenDelta, UsageLedger, WindowReset,
};
use studyforge_error::StudyforgeResult;

/// Storage for per-principal usage ledgers.
#[async_trait]
pub trait UsageLedgerStore: Send + Sync {
    /// Load a ledger without creating it.
    async fn find_one(&self, principal: &PrincipalId) -> StudyforgeResult<Option<UsageLedger>>;

    /// Load the ledger, creating it if missing, and apply lazy window resets.
    ///
    /// The ledger is persisted only when it was created or a window reset.
    async fn roll_windows(
        &self,
        principal: &PrincipalId,
        now: DateTime<Utc>,
    ) -> StudyforgeResult<(UsageLedger, WindowReset)>;

    /// Apply window resets and add `delta` to every counter as one update.
    async fn increment(
        &self,
        principal: &PrincipalId,
        delta: TokenDelta,
        now: DateTime<Utc>,
    ) -> StudyforgeResult<UsageLedger>;
}

/// Storage for administrator-managed tier limit policies.
#[async_trait]
pub trait LimitPolicyStore: Send + Sync {
    /// The active policy for a tier, if one exists.
    async fn find_active(&self, tier: SubscriptionTier) -> StudyforgeResult<Option<LimitPolicy>>;

    /// Every stored policy, active or not.
    async fn list(&self) -> StudyforgeResult<Vec<LimitPolicy>>;

    /// Insert or replace the policy for `policy.tier`.
    async fn upsert(&self, policy: &LimitPolicy) -> StudyforgeResult<LimitPolicy>;

    /// Mark a tier's policy inactive. Returns whether a policy existed.
    async fn deactivate(&self, tier: SubscriptionTier, now: DateTime<Utc>)
    -> StudyforgeResult<bool>;
}

/// Outcome of [`ProviderStore::activate_exclusive`].
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    /// The provider is now the sole active provider
    Activated(ProviderConfig),
    /// The provider was exhausted when the lock was taken; nothing changed
    Unavailable(ProviderConfig),
    /// No provider has this id
    NotFound,
}

/// Storage for provider configurations.
#[async_trait]
pub trait ProviderStore: Send + Sync {
    /// All providers, in no particular order.
    async fn list(&self) -> StudyforgeResult<Vec<ProviderConfig>>;

    /// Load one provider.
    async fn find_one(&self, id: ProviderId) -> StudyforgeResult<Option<ProviderConfig>>;

    /// Persist a new provider and return it with its assigned id.
    async fn insert(
        &self,
        new: NewProviderConfig,
        now: DateTime<Utc>,
    ) -> StudyforgeResult<ProviderConfig>;

    /// Apply one transition to one provider. `None` if the id is unknown.
    async fn apply(
        &self,
        id: ProviderId,
        transition: ProviderTransition,
        now: DateTime<Utc>,
    ) -> StudyforgeResult<Option<ProviderConfig>>;

    /// Clear the active flag everywhere and set it on `id`, as one operation.
    ///
    /// Availability is checked under the same lock: an exhausted provider is
    /// never promoted and the current active provider keeps its flag.
    async fn activate_exclusive(
        &self,
        id: ProviderId,
        now: DateTime<Utc>,
    ) -> StudyforgeResult<Activation>;

    /// Delete a provider. Returns whether it existed.
    async fn remove(&self, id: ProviderId) -> StudyforgeResult<bool>;
}
