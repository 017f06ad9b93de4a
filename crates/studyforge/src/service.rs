//! Wired dispatch core.

use std::sync::Arc;
use studyforge_core::{
    CallResult, Clock, LimitPolicy, LimitPolicyUpdate, NewProviderConfig, Principal, PrincipalId,
    ProviderConfig, ProviderId, QuotaStatus, SubscriptionTier, SystemClock, UsageSnapshot,
};
use studyforge_dispatch::{CallExecutor, ProviderRegistry, ProviderTestOutcome, RegistryHealth};
use studyforge_error::StudyforgeResult;
use studyforge_interface::{
    DriverFactory, GenerateRequest, LimitPolicyStore, ProviderStore, UsageLedgerStore,
};
use studyforge_limits::{EffectiveLimits, LimitsCatalog, StudyforgeConfig};
use studyforge_models::HttpDriverFactory;
use studyforge_quota::{QuotaGate, UsageLedgerService};
use studyforge_storage::{InMemoryLimitPolicyStore, InMemoryProviderStore, InMemoryUsageLedgerStore};
use tracing::info;

/// The three persistence seams the core needs.
#[derive(Clone)]
pub struct Stores {
    /// Usage ledgers
    pub ledgers: Arc<dyn UsageLedgerStore>,
    /// Limit policies
    pub policies: Arc<dyn LimitPolicyStore>,
    /// Provider configurations
    pub providers: Arc<dyn ProviderStore>,
}

impl Stores {
    /// Fresh in-memory stores.
    pub fn in_memory() -> Self {
        Self {
            ledgers: Arc::new(InMemoryUsageLedgerStore::new()),
            policies: Arc::new(InMemoryLimitPolicyStore::new()),
            providers: Arc::new(InMemoryProviderStore::new()),
        }
    }

    /// PostgreSQL stores over a migrated connection pool.
    ///
    /// # Errors
    ///
    /// Returns a database error if the pool cannot be built or migrations fail.
    #[cfg(feature = "database")]
    pub fn postgres(database_url: &str) -> StudyforgeResult<Self> {
        use studyforge_database::{
            PostgresLimitPolicyStore, PostgresProviderStore, PostgresUsageLedgerStore,
            establish_pool, run_migrations,
        };

        let pool = establish_pool(database_url)?;
        run_migrations(&pool)?;
        Ok(Self {
            ledgers: Arc::new(PostgresUsageLedgerStore::new(pool.clone())),
            policies: Arc::new(PostgresLimitPolicyStore::new(pool.clone())),
            providers: Arc::new(PostgresProviderStore::new(pool)),
        })
    }
}

/// Quota-aware, multi-provider AI dispatch.
///
/// Cheap to clone; clones share stores and drivers.
///
/// # Example
///
/// ```no_run
/// use studyforge::{GenerateRequest, Principal, Studyforge, StudyforgeConfig, SubscriptionTier};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let core = Studyforge::in_memory(&StudyforgeConfig::load()?)?;
/// let student = Principal::new("user-42", SubscriptionTier::Free);
///
/// let status = core.check_quota(&student, 120).await?;
/// if status.allowed {
///     let result = core
///         .dispatch_ai_call(&student, GenerateRequest::new("Write three quiz questions about mitosis"))
///         .await?;
///     println!("{}", result.text);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Studyforge {
    catalog: LimitsCatalog,
    gate: QuotaGate,
    ledger: UsageLedgerService,
    registry: ProviderRegistry,
    executor: CallExecutor,
}

impl std::fmt::Debug for Studyforge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studyforge")
            .field("catalog", &self.catalog)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Studyforge {
    /// Wire the core over explicit stores, drivers and clock.
    pub fn new(
        config: &StudyforgeConfig,
        stores: Stores,
        drivers: Arc<dyn DriverFactory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let catalog = LimitsCatalog::new(stores.policies, config, clock.clone());
        let gate = QuotaGate::new(stores.ledgers.clone(), catalog.clone(), clock.clone());
        let ledger = UsageLedgerService::new(stores.ledgers, clock.clone());
        let registry = ProviderRegistry::new(
            stores.providers,
            clock,
            config.dispatch.failure_threshold,
        );
        let executor = CallExecutor::new(
            gate.clone(),
            ledger.clone(),
            registry.clone(),
            drivers,
            config.dispatch.clone(),
        );

        Self {
            catalog,
            gate,
            ledger,
            registry,
            executor,
        }
    }

    /// Core over in-memory stores and HTTP drivers.
    ///
    /// # Errors
    ///
    /// Returns a provider configuration error if the HTTP client cannot be built.
    pub fn in_memory(config: &StudyforgeConfig) -> StudyforgeResult<Self> {
        let drivers = HttpDriverFactory::new(config.dispatch.call_timeout())?;
        info!("Using in-memory stores");
        Ok(Self::new(
            config,
            Stores::in_memory(),
            Arc::new(drivers),
            Arc::new(SystemClock),
        ))
    }

    /// Core over PostgreSQL stores and HTTP drivers. Runs pending migrations.
    ///
    /// # Errors
    ///
    /// Returns a database error if the pool or migrations fail, or a provider
    /// configuration error if the HTTP client cannot be built.
    #[cfg(feature = "database")]
    pub fn postgres(config: &StudyforgeConfig, database_url: &str) -> StudyforgeResult<Self> {
        let stores = Stores::postgres(database_url)?;
        let drivers = HttpDriverFactory::new(config.dispatch.call_timeout())?;
        info!("Using PostgreSQL stores");
        Ok(Self::new(
            config,
            stores,
            Arc::new(drivers),
            Arc::new(SystemClock),
        ))
    }

    // Quota

    /// Whether `principal` may spend `tokens_needed` now.
    pub async fn check_quota(
        &self,
        principal: &Principal,
        tokens_needed: u64,
    ) -> StudyforgeResult<QuotaStatus> {
        self.gate.check_quota(principal, tokens_needed).await
    }

    /// Charge tokens to a principal's ledger.
    pub async fn consume_tokens(
        &self,
        principal: &PrincipalId,
        tokens_used: u64,
        input_tokens: Option<u64>,
        output_tokens: Option<u64>,
    ) -> StudyforgeResult<UsageSnapshot> {
        self.ledger
            .consume_tokens(principal, tokens_used, input_tokens, output_tokens)
            .await
    }

    /// Current counters for a principal.
    pub async fn usage_snapshot(&self, principal: &PrincipalId) -> StudyforgeResult<UsageSnapshot> {
        self.ledger.usage_snapshot(principal).await
    }

    // Dispatch

    /// Quota-checked AI call with automatic failover.
    pub async fn dispatch_ai_call(
        &self,
        principal: &Principal,
        request: GenerateRequest,
    ) -> StudyforgeResult<CallResult> {
        self.executor.dispatch_ai_call(principal, request).await
    }

    /// AI call outside any principal's quota.
    pub async fn dispatch_unmetered(&self, request: GenerateRequest) -> StudyforgeResult<CallResult> {
        self.executor.dispatch_unmetered(request).await
    }

    // Provider administration

    /// Providers in selection order.
    pub async fn list_providers(&self) -> StudyforgeResult<Vec<ProviderConfig>> {
        self.registry.list_providers().await
    }

    /// Register a provider.
    pub async fn add_provider(&self, new: NewProviderConfig) -> StudyforgeResult<ProviderConfig> {
        self.registry.add_provider(new).await
    }

    /// Change a provider's priority.
    pub async fn set_priority(
        &self,
        id: ProviderId,
        priority: i32,
    ) -> StudyforgeResult<ProviderConfig> {
        self.registry.set_priority(id, priority).await
    }

    /// Take a provider out of rotation as exhausted.
    pub async fn mark_exhausted(
        &self,
        id: ProviderId,
        reason: impl Into<String>,
    ) -> StudyforgeResult<ProviderConfig> {
        self.registry.mark_exhausted(id, reason).await
    }

    /// Put an exhausted or failing provider back into rotation.
    pub async fn restore_provider(&self, id: ProviderId) -> StudyforgeResult<ProviderConfig> {
        self.registry.restore_provider(id).await
    }

    /// Make a provider the active one, or clear its active flag.
    pub async fn set_enabled(&self, id: ProviderId, enabled: bool) -> StudyforgeResult<ProviderConfig> {
        self.registry.set_enabled(id, enabled).await
    }

    /// Delete a provider.
    pub async fn remove_provider(&self, id: ProviderId) -> StudyforgeResult<()> {
        self.registry.remove_provider(id).await
    }

    /// Probe one provider and record the outcome.
    pub async fn test_provider(&self, id: ProviderId) -> StudyforgeResult<ProviderTestOutcome> {
        self.executor.test_provider(id).await
    }

    /// Provider counts by health.
    pub async fn registry_health(&self) -> StudyforgeResult<RegistryHealth> {
        self.registry.exhaustion_summary().await
    }

    // Limit administration

    /// Store a tier's limit policy.
    pub async fn update_limit_policy(
        &self,
        tier: SubscriptionTier,
        update: LimitPolicyUpdate,
    ) -> StudyforgeResult<LimitPolicy> {
        self.catalog.update_policy(tier, update).await
    }

    /// Every tier with its effective limits.
    pub async fn list_limit_policies(&self) -> StudyforgeResult<Vec<EffectiveLimits>> {
        self.catalog.list_policies().await
    }

    /// Revert a tier to its default limits.
    pub async fn deactivate_limit_policy(&self, tier: SubscriptionTier) -> StudyforgeResult<bool> {
        self.catalog.deactivate_policy(tier).await
    }
}
