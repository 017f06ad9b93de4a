//! Administrative and bookkeeping operations on provider configurations.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use studyforge_core::{
    Clock, NewProviderConfig, ProviderConfig, ProviderId, ProviderState, ProviderTransition,
};
use studyforge_error::{ConfigError, DispatchError, DispatchErrorKind, StudyforgeResult};
use studyforge_interface::{Activation, ProviderStore};
use tracing::{debug, info, instrument, warn};

/// Order in which providers are considered: priority ascending, then most
/// recently created first.
pub fn selection_order(a: &ProviderConfig, b: &ProviderConfig) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

/// Aggregate health of the registry.
///
/// Derived from the stored records on every call; there is no separate
/// process-wide "quota exceeded" flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryHealth {
    /// Configured providers
    pub total: usize,
    /// Providers with exhausted credits
    pub exhausted: usize,
    /// Providers holding the active flag
    pub active: usize,
    /// Providers with a failure streak below the threshold
    pub failing: usize,
}

impl RegistryHealth {
    /// Whether every configured provider is exhausted (degraded mode).
    pub fn all_exhausted(&self) -> bool {
        self.total > 0 && self.exhausted == self.total
    }
}

/// Provider registry over a [`ProviderStore`].
#[derive(Clone)]
pub struct ProviderRegistry {
    store: Arc<dyn ProviderStore>,
    clock: Arc<dyn Clock>,
    failure_threshold: u32,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("failure_threshold", &self.failure_threshold)
            .finish_non_exhaustive()
    }
}

fn not_found(id: ProviderId) -> DispatchError {
    DispatchError::new(DispatchErrorKind::ProviderNotFound(id.to_string()))
}

impl ProviderRegistry {
    /// Create a registry; `failure_threshold` consecutive failures exhaust a provider.
    pub fn new(store: Arc<dyn ProviderStore>, clock: Arc<dyn Clock>, failure_threshold: u32) -> Self {
        Self {
            store,
            clock,
            failure_threshold,
        }
    }

    /// Consecutive failures that exhaust a provider.
    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// All providers in selection order.
    #[instrument(skip(self))]
    pub async fn list_providers(&self) -> StudyforgeResult<Vec<ProviderConfig>> {
        let mut providers = self.store.list().await?;
        providers.sort_by(selection_order);
        Ok(providers)
    }

    /// Load one provider.
    ///
    /// # Errors
    ///
    /// Returns `ProviderNotFound` for an unknown id.
    pub async fn get(&self, id: ProviderId) -> StudyforgeResult<ProviderConfig> {
        self.store
            .find_one(id)
            .await?
            .ok_or_else(|| not_found(id).into())
    }

    /// Register a new provider. It starts untested and inactive.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the input is unusable.
    #[instrument(skip(self, new), fields(kind = %new.provider_kind, model = %new.model, priority = new.priority))]
    pub async fn add_provider(&self, new: NewProviderConfig) -> StudyforgeResult<ProviderConfig> {
        new.validate()?;
        let config = self.store.insert(new, self.clock.now()).await?;
        info!(provider = %config.label(), "Provider added");
        Ok(config)
    }

    async fn transition(
        &self,
        id: ProviderId,
        transition: ProviderTransition,
    ) -> StudyforgeResult<ProviderConfig> {
        self.store
            .apply(id, transition, self.clock.now())
            .await?
            .ok_or_else(|| not_found(id).into())
    }

    /// Record a successful call; clears the failure streak.
    #[instrument(skip(self))]
    pub async fn record_success(&self, id: ProviderId) -> StudyforgeResult<ProviderConfig> {
        let config = self.transition(id, ProviderTransition::Success).await?;
        debug!(success_count = config.success_count, "Provider success recorded");
        Ok(config)
    }

    /// Record an unclassified or transient failure.
    ///
    /// Reaching the failure threshold exhausts the provider.
    #[instrument(skip(self, message))]
    pub async fn record_failure(
        &self,
        id: ProviderId,
        message: impl Into<String>,
    ) -> StudyforgeResult<ProviderConfig> {
        let config = self
            .transition(
                id,
                ProviderTransition::Failure {
                    message: message.into(),
                    threshold: self.failure_threshold,
                },
            )
            .await?;
        if config.state() == ProviderState::Exhausted {
            warn!(
                provider = %config.label(),
                failure_count = config.failure_count,
                "Provider exhausted after repeated failures"
            );
        } else {
            debug!(failure_count = config.failure_count, "Provider failure recorded");
        }
        Ok(config)
    }

    /// Mark a provider's credits exhausted. It also loses the active flag.
    #[instrument(skip(self, reason))]
    pub async fn mark_exhausted(
        &self,
        id: ProviderId,
        reason: impl Into<String>,
    ) -> StudyforgeResult<ProviderConfig> {
        let config = self
            .transition(
                id,
                ProviderTransition::MarkExhausted {
                    reason: reason.into(),
                },
            )
            .await?;
        warn!(provider = %config.label(), "Provider marked exhausted");
        Ok(config)
    }

    /// Put an exhausted or failing provider back into rotation.
    ///
    /// When the restored provider outranks the current active provider it
    /// takes over the active flag, so the next call goes to it.
    #[instrument(skip(self))]
    pub async fn restore_provider(&self, id: ProviderId) -> StudyforgeResult<ProviderConfig> {
        let restored = self.transition(id, ProviderTransition::Restore).await?;
        info!(provider = %restored.label(), "Provider restored");

        let providers = self.store.list().await?;
        let outranked = providers.iter().any(|p| {
            p.id != restored.id
                && p.is_active
                && p.is_available()
                && selection_order(&restored, p) == Ordering::Less
        });
        if !outranked {
            return Ok(restored);
        }
        match self.try_activate(id).await? {
            Activation::Activated(config) => Ok(config),
            Activation::Unavailable(config) => {
                warn!(provider = %config.label(), "Provider exhausted again before taking over");
                Ok(config)
            }
            Activation::NotFound => Err(not_found(id).into()),
        }
    }

    /// Change a provider's priority.
    #[instrument(skip(self))]
    pub async fn set_priority(
        &self,
        id: ProviderId,
        priority: i32,
    ) -> StudyforgeResult<ProviderConfig> {
        let config = self
            .transition(id, ProviderTransition::SetPriority(priority))
            .await?;
        info!(provider = %config.label(), "Provider priority changed");
        Ok(config)
    }

    /// Enable (make the sole active provider) or disable a provider.
    ///
    /// # Errors
    ///
    /// Enabling an exhausted provider is a configuration error; restore it first.
    #[instrument(skip(self))]
    pub async fn set_enabled(&self, id: ProviderId, enabled: bool) -> StudyforgeResult<ProviderConfig> {
        if !enabled {
            return self.transition(id, ProviderTransition::SetActive(false)).await;
        }
        self.activate(id).await
    }

    /// Delete a provider.
    #[instrument(skip(self))]
    pub async fn remove_provider(&self, id: ProviderId) -> StudyforgeResult<()> {
        if self.store.remove(id).await? {
            info!("Provider removed");
            Ok(())
        } else {
            Err(not_found(id).into())
        }
    }

    /// Demote every provider and promote `id`, as one store operation.
    ///
    /// # Errors
    ///
    /// Returns `ProviderNotFound` for an unknown id and a configuration error
    /// when the provider is exhausted; restore it first.
    #[instrument(skip(self))]
    pub async fn activate(&self, id: ProviderId) -> StudyforgeResult<ProviderConfig> {
        match self.try_activate(id).await? {
            Activation::Activated(config) => Ok(config),
            Activation::Unavailable(config) => Err(ConfigError::new(format!(
                "Provider {} is exhausted; restore it before enabling",
                config.label()
            ))
            .into()),
            Activation::NotFound => Err(not_found(id).into()),
        }
    }

    /// Like [`activate`](Self::activate), but reports an exhausted or
    /// unknown provider as an outcome instead of an error.
    pub async fn try_activate(&self, id: ProviderId) -> StudyforgeResult<Activation> {
        let outcome = self.store.activate_exclusive(id, self.clock.now()).await?;
        if let Activation::Activated(config) = &outcome {
            info!(provider = %config.label(), "Provider activated");
        }
        Ok(outcome)
    }

    /// Counts of providers by health.
    pub async fn exhaustion_summary(&self) -> StudyforgeResult<RegistryHealth> {
        let providers = self.store.list().await?;
        Ok(RegistryHealth {
            total: providers.len(),
            exhausted: providers.iter().filter(|p| p.credits_exhausted).count(),
            active: providers.iter().filter(|p| p.is_active).count(),
            failing: providers
                .iter()
                .filter(|p| matches!(p.state(), ProviderState::Failing(_)))
                .count(),
        })
    }

    /// Whether every configured provider is exhausted.
    pub async fn all_exhausted(&self) -> StudyforgeResult<bool> {
        Ok(self.exhaustion_summary().await?.all_exhausted())
    }
}
