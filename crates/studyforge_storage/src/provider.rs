//! In-memory provider configurations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use studyforge_core::{
    NewProviderConfig, ProviderConfig, ProviderId, ProviderTransition,
};
use studyforge_error::StudyforgeResult;
use studyforge_interface::{Activation, ProviderStore};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Providers {
    records: BTreeMap<ProviderId, ProviderConfig>,
    next_id: i64,
}

/// In-memory provider store.
///
/// A single lock guards every record so exclusive activation is one step.
///
/// # Example
/// ```no_run
/// use studyforge_storage::InMemoryProviderStore;
/// use studyforge_interface::{Activation, ProviderStore};
///
/// #[tokio::main]
/// async fn main() {
///     let store = InMemoryProviderStore::new();
///     assert!(store.list().await.unwrap().is_empty());
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryProviderStore {
    providers: Arc<RwLock<Providers>>,
}

impl InMemoryProviderStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed record, replacing any with the same id (for testing).
    pub async fn put(&self, config: ProviderConfig) {
        let mut providers = self.providers.write().await;
        providers.next_id = providers.next_id.max(config.id.get());
        providers.records.insert(config.id, config);
    }
}

#[async_trait]
impl ProviderStore for InMemoryProviderStore {
    async fn list(&self) -> StudyforgeResult<Vec<ProviderConfig>> {
        Ok(self.providers.read().await.records.values().cloned().collect())
    }

    async fn find_one(&self, id: ProviderId) -> StudyforgeResult<Option<ProviderConfig>> {
        Ok(self.providers.read().await.records.get(&id).cloned())
    }

    async fn insert(
        &self,
        new: NewProviderConfig,
        now: DateTime<Utc>,
    ) -> StudyforgeResult<ProviderConfig> {
        let mut providers = self.providers.write().await;
        providers.next_id += 1;
        let id = ProviderId::new(providers.next_id);
        let config = ProviderConfig::from_new(id, new, now);
        providers.records.insert(id, config.clone());
        Ok(config)
    }

    async fn apply(
        &self,
        id: ProviderId,
        transition: ProviderTransition,
        now: DateTime<Utc>,
    ) -> StudyforgeResult<Option<ProviderConfig>> {
        let mut providers = self.providers.write().await;
        Ok(providers.records.get_mut(&id).map(|config| {
            config.apply(&transition, now);
            config.clone()
        }))
    }

    async fn activate_exclusive(
        &self,
        id: ProviderId,
        now: DateTime<Utc>,
    ) -> StudyforgeResult<Activation> {
        let mut providers = self.providers.write().await;
        match providers.records.get(&id) {
            None => return Ok(Activation::NotFound),
            Some(target) if !target.is_available() => {
                return Ok(Activation::Unavailable(target.clone()));
            }
            Some(_) => {}
        }
        for config in providers.records.values_mut() {
            let active = config.id == id;
            if config.is_active != active {
                config.apply(&ProviderTransition::SetActive(active), now);
            }
        }
        Ok(providers
            .records
            .get(&id)
            .cloned()
            .map_or(Activation::NotFound, Activation::Activated))
    }

    async fn remove(&self, id: ProviderId) -> StudyforgeResult<bool> {
        Ok(self.providers.write().await.records.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyforge_core::ProviderKind;

    fn new_provider(priority: i32) -> NewProviderConfig {
        NewProviderConfig::builder()
            .provider_kind(ProviderKind::Groq)
            .model("llama-3.1-8b-instant")
            .secret_credential("gsk")
            .priority(priority)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn ids_are_assigned_sequentially() {
        let store = InMemoryProviderStore::new();
        let a = store.insert(new_provider(1), Utc::now()).await.unwrap();
        let b = store.insert(new_provider(2), Utc::now()).await.unwrap();
        assert_eq!(a.id.get() + 1, b.id.get());
    }

    #[tokio::test]
    async fn activate_exclusive_leaves_one_active() {
        let store = InMemoryProviderStore::new();
        let now = Utc::now();
        let a = store.insert(new_provider(1), now).await.unwrap();
        let b = store.insert(new_provider(2), now).await.unwrap();
        store.activate_exclusive(a.id, now).await.unwrap();
        store.activate_exclusive(b.id, now).await.unwrap();

        let active: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|c| c.is_active)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b.id);
    }

    #[tokio::test]
    async fn activating_unknown_id_changes_nothing() {
        let store = InMemoryProviderStore::new();
        let now = Utc::now();
        let a = store.insert(new_provider(1), now).await.unwrap();
        store.activate_exclusive(a.id, now).await.unwrap();
        assert_eq!(
            store.activate_exclusive(ProviderId::new(99), now).await.unwrap(),
            Activation::NotFound
        );
        assert!(store.find_one(a.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn exhausted_provider_is_never_promoted() {
        let store = InMemoryProviderStore::new();
        let now = Utc::now();
        let a = store.insert(new_provider(1), now).await.unwrap();
        let b = store.insert(new_provider(2), now).await.unwrap();
        store.activate_exclusive(a.id, now).await.unwrap();
        store
            .apply(
                b.id,
                ProviderTransition::MarkExhausted {
                    reason: "HTTP 429".to_string(),
                },
                now,
            )
            .await
            .unwrap();

        let outcome = store.activate_exclusive(b.id, now).await.unwrap();

        assert!(matches!(outcome, Activation::Unavailable(ref c) if c.id == b.id));
        assert!(!store.find_one(b.id).await.unwrap().unwrap().is_active);
        assert!(store.find_one(a.id).await.unwrap().unwrap().is_active);
    }
}
