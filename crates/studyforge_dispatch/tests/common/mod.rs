//! Shared harness for dispatch tests: in-memory stores, a manual clock and a
//! scripted driver factory.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use studyforge_core::{ManualClock, NewProviderConfig, ProviderConfig, ProviderKind};
use studyforge_dispatch::{CallExecutor, Dispatcher, ProviderRegistry};
use studyforge_error::StudyforgeResult;
use studyforge_interface::{DriverFactory, GenerateRequest, GenerateResponse, ProviderDriver};
use studyforge_limits::{LimitsCatalog, StudyforgeConfig};
use studyforge_models::translate_failure;
use studyforge_quota::{QuotaGate, UsageLedgerService};
use studyforge_storage::{InMemoryLimitPolicyStore, InMemoryProviderStore, InMemoryUsageLedgerStore};

/// What a scripted driver does on its next call.
#[derive(Debug, Clone)]
pub enum Step {
    Reply(String),
    Fail(u16, String),
    Hang,
}

pub fn reply(text: &str) -> Step {
    Step::Reply(text.to_string())
}

pub fn fail(status: u16, body: &str) -> Step {
    Step::Fail(status, body.to_string())
}

struct ScriptedDriver {
    model: String,
    step: Step,
}

#[async_trait]
impl ProviderDriver for ScriptedDriver {
    async fn generate(&self, _req: &GenerateRequest) -> StudyforgeResult<GenerateResponse> {
        match &self.step {
            Step::Reply(text) => Ok(GenerateResponse::text(text.clone())),
            Step::Fail(status, body) => Err(translate_failure(*status, body).into()),
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
                Ok(GenerateResponse::text("too late"))
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Hands out drivers that follow a per-model script, replying "ok" once the
/// script runs out, and records which models were called.
#[derive(Default)]
pub struct ScriptedFactory {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFactory {
    pub fn script(&self, model: &str, steps: impl IntoIterator<Item = Step>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .extend(steps);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl DriverFactory for ScriptedFactory {
    fn build(&self, config: &ProviderConfig) -> StudyforgeResult<Arc<dyn ProviderDriver>> {
        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&config.model)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| reply("ok"));
        self.calls.lock().unwrap().push(config.model.clone());
        Ok(Arc::new(ScriptedDriver {
            model: config.model.clone(),
            step,
        }))
    }
}

pub struct Harness {
    pub executor: CallExecutor,
    pub registry: ProviderRegistry,
    pub dispatcher: Dispatcher,
    pub ledger: UsageLedgerService,
    pub factory: Arc<ScriptedFactory>,
    pub clock: ManualClock,
}

pub fn harness() -> Harness {
    let config = StudyforgeConfig::bundled().unwrap();
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 9, 3, 9, 0, 0).unwrap());
    let ledgers = Arc::new(InMemoryUsageLedgerStore::new());
    let catalog = LimitsCatalog::new(
        Arc::new(InMemoryLimitPolicyStore::new()),
        &config,
        Arc::new(clock.clone()),
    );
    let registry = ProviderRegistry::new(
        Arc::new(InMemoryProviderStore::new()),
        Arc::new(clock.clone()),
        config.dispatch.failure_threshold,
    );
    let gate = QuotaGate::new(ledgers.clone(), catalog, Arc::new(clock.clone()));
    let ledger = UsageLedgerService::new(ledgers, Arc::new(clock.clone()));
    let factory = Arc::new(ScriptedFactory::default());
    let executor = CallExecutor::new(
        gate,
        ledger.clone(),
        registry.clone(),
        factory.clone(),
        config.dispatch,
    );

    Harness {
        executor,
        dispatcher: Dispatcher::new(registry.clone()),
        registry,
        ledger,
        factory,
        clock,
    }
}

impl Harness {
    /// Register a provider; one second passes after each registration.
    pub async fn add(&self, kind: ProviderKind, model: &str, priority: i32) -> ProviderConfig {
        let new = NewProviderConfig::builder()
            .provider_kind(kind)
            .model(model)
            .secret_credential("sk-test")
            .priority(priority)
            .build()
            .unwrap();
        let config = self.registry.add_provider(new).await.unwrap();
        self.clock.advance(chrono::Duration::seconds(1));
        config
    }

    pub async fn active_ids(&self) -> Vec<i64> {
        self.registry
            .list_providers()
            .await
            .unwrap()
            .into_iter()
            .filter(|p| p.is_active)
            .map(|p| p.id.get())
            .collect()
    }
}
