//! End-to-end tests through the facade.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use studyforge::{
    DriverFactory, GenerateRequest, GenerateResponse, LimitPolicyUpdate, LimitSource,
    ManualClock, NewProviderConfig, Principal, ProviderConfig, ProviderDriver, ProviderKind,
    Stores, Studyforge, StudyforgeConfig, StudyforgeResult, SubscriptionTier, translate_failure,
};

/// Replies with a fixed text, except for models named "broke" which answer
/// with an out-of-credits error.
struct EchoFactory;

struct EchoDriver {
    model: String,
}

#[async_trait]
impl ProviderDriver for EchoDriver {
    async fn generate(&self, req: &GenerateRequest) -> StudyforgeResult<GenerateResponse> {
        if self.model == "broke" {
            return Err(translate_failure(402, "insufficient credits").into());
        }
        Ok(GenerateResponse::text(format!("echo: {}", req.prompt)))
    }

    fn provider_name(&self) -> &'static str {
        "echo"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

impl DriverFactory for EchoFactory {
    fn build(&self, config: &ProviderConfig) -> StudyforgeResult<Arc<dyn ProviderDriver>> {
        Ok(Arc::new(EchoDriver {
            model: config.model.clone(),
        }))
    }
}

fn core(clock: &ManualClock) -> Studyforge {
    Studyforge::new(
        &StudyforgeConfig::bundled().unwrap(),
        Stores::in_memory(),
        Arc::new(EchoFactory),
        Arc::new(clock.clone()),
    )
}

fn provider(model: &str, priority: i32) -> NewProviderConfig {
    NewProviderConfig::builder()
        .provider_kind(ProviderKind::OpenRouter)
        .model(model)
        .secret_credential("sk-or")
        .priority(priority)
        .build()
        .unwrap()
}

#[tokio::test]
async fn quiz_generation_flow_charges_the_student() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 10, 1, 14, 0, 0).unwrap());
    let core = core(&clock);
    core.add_provider(provider("broke", 1)).await.unwrap();
    let backup = core.add_provider(provider("backup", 2)).await.unwrap();
    let student = Principal::new("student-3", SubscriptionTier::Free);

    let result = core
        .dispatch_ai_call(&student, GenerateRequest::new("Quiz me on cells"))
        .await
        .unwrap();

    assert!(result.fell_back);
    assert_eq!(result.provider_id, backup.id);
    let usage = core.usage_snapshot(&student.id).await.unwrap();
    assert_eq!(usage.daily_tokens_used, *result.usage.total_tokens());

    let health = core.registry_health().await.unwrap();
    assert_eq!(health.exhausted, 1);
    assert_eq!(health.active, 1);
}

#[tokio::test]
async fn administrator_override_changes_quota_decisions() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 10, 1, 14, 0, 0).unwrap());
    let core = core(&clock);
    let student = Principal::new("student-4", SubscriptionTier::Free);
    core.consume_tokens(&student.id, 150, None, None)
        .await
        .unwrap();
    assert!(!core.check_quota(&student, 100).await.unwrap().allowed);

    core.update_limit_policy(
        SubscriptionTier::Free,
        LimitPolicyUpdate {
            daily_limit: 400,
            monthly_limit: 8_000,
            description: Some("exam week".to_string()),
        },
    )
    .await
    .unwrap();

    let status = core.check_quota(&student, 100).await.unwrap();
    assert!(status.allowed);
    assert_eq!(status.daily_remaining, 250);

    let free = core
        .list_limit_policies()
        .await
        .unwrap()
        .into_iter()
        .find(|row| row.tier == SubscriptionTier::Free)
        .unwrap();
    assert_eq!(free.source, LimitSource::Policy);

    assert!(core.deactivate_limit_policy(SubscriptionTier::Free).await.unwrap());
    assert!(!core.check_quota(&student, 100).await.unwrap().allowed);
}

#[tokio::test]
async fn midnight_restores_the_daily_budget() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 10, 1, 23, 59, 0).unwrap());
    let core = core(&clock);
    let student = Principal::new("student-5", SubscriptionTier::Free);
    core.consume_tokens(&student.id, 200, None, None)
        .await
        .unwrap();
    assert!(!core.check_quota(&student, 1).await.unwrap().allowed);

    clock.advance(Duration::minutes(2));

    let status = core.check_quota(&student, 1).await.unwrap();
    assert!(status.allowed);
    assert_eq!(status.daily_used, 0);
    assert_eq!(status.monthly_used, 200);
}

#[tokio::test]
async fn empty_registry_reports_configuration_missing() {
    let clock = ManualClock::new(Utc::now());
    let core = core(&clock);

    let err = core
        .dispatch_ai_call(
            &Principal::new("guest-1", SubscriptionTier::Guest),
            GenerateRequest::new("hi"),
        )
        .await
        .unwrap_err();

    assert!(err.is_configuration_missing());
    assert_eq!(err.http_status(), 503);
}
