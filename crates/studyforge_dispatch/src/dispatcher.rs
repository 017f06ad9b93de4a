//! Provider selection.

use crate::{ProviderRegistry, selection_order};
use studyforge_core::ProviderConfig;
use studyforge_error::{DispatchError, DispatchErrorKind, StudyforgeResult};
use studyforge_interface::Activation;
use tracing::{debug, instrument, warn};

/// Picks the provider for the next call.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: ProviderRegistry,
}

impl Dispatcher {
    /// Create a dispatcher over a registry.
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    /// Select a provider, in order of preference:
    ///
    /// 1. the active, non-exhausted provider, unchanged;
    /// 2. the first non-exhausted provider in selection order, promoted to
    ///    sole active provider in one store operation;
    /// 3. when every provider is exhausted, the first in selection order,
    ///    returned without promotion (degraded mode).
    ///
    /// The store refuses to promote a provider exhausted after the listing
    /// was taken; selection then runs once more on a fresh listing.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationMissing` when no provider is configured.
    #[instrument(skip(self))]
    pub async fn select_provider(&self) -> StudyforgeResult<ProviderConfig> {
        for attempt in 1..=PROMOTION_ATTEMPTS {
            let providers = self.registry.list_providers().await?;

            if let Some(active) = providers.iter().find(|p| p.is_active && p.is_available()) {
                debug!(provider = %active.label(), "Using active provider");
                return Ok(active.clone());
            }

            let candidate = providers
                .iter()
                .find(|p| p.is_available())
                .map(|p| (p.id, p.label()));
            let Some((id, label)) = candidate else {
                return degraded(providers);
            };
            debug!(provider = %label, "Promoting provider");
            match self.registry.try_activate(id).await? {
                Activation::Activated(config) => return Ok(config),
                Activation::Unavailable(_) => {
                    debug!(provider = %label, attempt, "Candidate exhausted during promotion");
                }
                Activation::NotFound => {
                    debug!(provider = %label, attempt, "Candidate removed during promotion");
                }
            }
        }

        let providers = self.registry.list_providers().await?;
        if let Some(active) = providers.iter().find(|p| p.is_active && p.is_available()) {
            return Ok(active.clone());
        }
        match providers.iter().find(|p| p.is_available()) {
            Some(available) => {
                warn!(provider = %available.label(), "Promotion kept racing, dispatching unpromoted");
                Ok(available.clone())
            }
            None => degraded(providers),
        }
    }
}

/// Promotion attempts before settling for whatever a fresh listing offers.
const PROMOTION_ATTEMPTS: u32 = 2;

fn degraded(providers: Vec<ProviderConfig>) -> StudyforgeResult<ProviderConfig> {
    match providers.into_iter().min_by(selection_order) {
        Some(last_resort) => {
            warn!(
                provider = %last_resort.label(),
                "No provider available for promotion, dispatching in degraded mode"
            );
            Ok(last_resort)
        }
        None => Err(DispatchError::new(DispatchErrorKind::ConfigurationMissing).into()),
    }
}
