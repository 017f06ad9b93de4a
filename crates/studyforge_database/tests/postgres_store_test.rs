//! Store tests against a live PostgreSQL database.
//!
//! Run with `DATABASE_URL` set and `--features postgres-tests`.

use chrono::{Duration, Utc};
use std::sync::Arc;
use studyforge_core::{
    LimitPolicyUpdate, NewProviderConfig, PrincipalId, ProviderKind, ProviderTransition,
    SubscriptionTier, TokenDelta,
};
use studyforge_database::{
    DbPool, PostgresLimitPolicyStore, PostgresProviderStore, PostgresUsageLedgerStore,
    database_url, establish_pool, run_migrations,
};
use studyforge_interface::{Activation, LimitPolicyStore, ProviderStore, UsageLedgerStore};

fn pool() -> DbPool {
    dotenvy::dotenv().ok();
    let pool = establish_pool(&database_url().unwrap()).unwrap();
    run_migrations(&pool).unwrap();
    pool
}

fn unique_principal(label: &str) -> PrincipalId {
    PrincipalId::new(format!(
        "{label}-{}",
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ))
}

#[tokio::test]
#[cfg_attr(not(feature = "postgres-tests"), ignore)]
async fn ledger_is_created_on_first_roll() {
    let store = PostgresUsageLedgerStore::new(pool());
    let principal = unique_principal("create");
    let now = Utc::now();

    assert!(store.find_one(&principal).await.unwrap().is_none());
    let (ledger, reset) = store.roll_windows(&principal, now).await.unwrap();

    assert_eq!(ledger.total_tokens_used, 0);
    assert!(!reset.any());
    assert!(store.find_one(&principal).await.unwrap().is_some());
}

#[tokio::test]
#[cfg_attr(not(feature = "postgres-tests"), ignore)]
async fn concurrent_increments_are_not_lost() {
    let store = Arc::new(PostgresUsageLedgerStore::new(pool()));
    let principal = unique_principal("concurrent");
    let now = Utc::now();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = store.clone();
            let principal = principal.clone();
            tokio::spawn(async move {
                store
                    .increment(&principal, TokenDelta::from_total(10), now)
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let ledger = store.find_one(&principal).await.unwrap().unwrap();
    assert_eq!(ledger.total_tokens_used, 160);
    assert_eq!(ledger.daily_tokens_used, 160);
}

#[tokio::test]
#[cfg_attr(not(feature = "postgres-tests"), ignore)]
async fn next_day_increment_resets_daily_counters() {
    let store = PostgresUsageLedgerStore::new(pool());
    let principal = unique_principal("rollover");
    let today = Utc::now();

    store
        .increment(&principal, TokenDelta::from_total(75), today)
        .await
        .unwrap();
    let ledger = store
        .increment(&principal, TokenDelta::from_total(5), today + Duration::days(1))
        .await
        .unwrap();

    assert_eq!(ledger.daily_tokens_used, 5);
    assert_eq!(ledger.total_tokens_used, 80);
}

#[tokio::test]
#[cfg_attr(not(feature = "postgres-tests"), ignore)]
async fn policy_upsert_then_deactivate() {
    let store = PostgresLimitPolicyStore::new(pool());
    let now = Utc::now();
    let policy = LimitPolicyUpdate {
        daily_limit: 300,
        monthly_limit: 6_000,
        description: Some("campaign".to_string()),
    }
    .into_policy(SubscriptionTier::Pro, now);

    let stored = store.upsert(&policy).await.unwrap();
    assert_eq!(stored.daily_limit, 300);
    assert!(
        store
            .find_active(SubscriptionTier::Pro)
            .await
            .unwrap()
            .is_some()
    );

    assert!(store.deactivate(SubscriptionTier::Pro, now).await.unwrap());
    assert!(
        store
            .find_active(SubscriptionTier::Pro)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
#[cfg_attr(not(feature = "postgres-tests"), ignore)]
async fn activation_is_exclusive() {
    let store = PostgresProviderStore::new(pool());
    let now = Utc::now();
    let new = |model: &str| {
        NewProviderConfig::builder()
            .provider_kind(ProviderKind::Groq)
            .model(model)
            .secret_credential("sk-test")
            .build()
            .unwrap()
    };
    let a = store.insert(new("model-a"), now).await.unwrap();
    let b = store.insert(new("model-b"), now).await.unwrap();

    store.activate_exclusive(a.id, now).await.unwrap();
    let Activation::Activated(promoted) = store.activate_exclusive(b.id, now).await.unwrap() else {
        panic!("provider b should be promoted");
    };
    assert!(promoted.is_active);

    let active: Vec<_> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .filter(|p| p.is_active)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, b.id);

    let exhausted = store
        .apply(
            b.id,
            ProviderTransition::MarkExhausted {
                reason: "quota".to_string(),
            },
            now,
        )
        .await
        .unwrap()
        .unwrap();
    assert!(exhausted.credits_exhausted);
    assert!(!exhausted.is_active);

    store.activate_exclusive(a.id, now).await.unwrap();
    let outcome = store.activate_exclusive(b.id, now).await.unwrap();
    assert!(matches!(outcome, Activation::Unavailable(ref c) if c.id == b.id));
    assert!(store.find_one(a.id).await.unwrap().unwrap().is_active);
    assert!(!store.find_one(b.id).await.unwrap().unwrap().is_active);

    assert!(store.remove(a.id).await.unwrap());
    assert!(store.remove(b.id).await.unwrap());
    assert!(!store.remove(b.id).await.unwrap());
}
