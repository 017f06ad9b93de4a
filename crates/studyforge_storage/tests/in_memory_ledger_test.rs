//! Tests for the in-memory usage ledger store.

use chrono::{TimeZone, Utc};
use studyforge_core::{PrincipalId, TokenDelta};
use studyforge_interface::UsageLedgerStore;
use studyforge_storage::InMemoryUsageLedgerStore;

#[tokio::test]
async fn roll_windows_creates_missing_ledger() {
    let store = InMemoryUsageLedgerStore::new();
    let principal = PrincipalId::new("new-user");
    let now = Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap();

    let (ledger, reset) = store.roll_windows(&principal, now).await.unwrap();

    assert_eq!(ledger.total_tokens_used, 0);
    assert!(!reset.any());
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn increment_resets_daily_counters_after_midnight() {
    let store = InMemoryUsageLedgerStore::new();
    let principal = PrincipalId::new("student");
    let evening = Utc.with_ymd_and_hms(2024, 5, 10, 23, 58, 0).unwrap();
    let morning = Utc.with_ymd_and_hms(2024, 5, 11, 0, 1, 0).unwrap();

    store
        .increment(&principal, TokenDelta::from_total(180), evening)
        .await
        .unwrap();
    let ledger = store
        .increment(&principal, TokenDelta::from_total(20), morning)
        .await
        .unwrap();

    assert_eq!(ledger.daily_tokens_used, 20);
    assert_eq!(ledger.monthly_tokens_used, 200);
    assert_eq!(ledger.total_tokens_used, 200);
}

#[tokio::test]
async fn concurrent_increments_are_not_lost() {
    let store = InMemoryUsageLedgerStore::new();
    let principal = PrincipalId::new("busy");
    let now = Utc::now();

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let store = store.clone();
            let principal = principal.clone();
            tokio::spawn(async move {
                store
                    .increment(&principal, TokenDelta::from_total(10), now)
                    .await
                    .unwrap();
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let ledger = store.find_one(&principal).await.unwrap().unwrap();
    assert_eq!(ledger.total_tokens_used, 320);
    assert_eq!(ledger.daily_tokens_used, 320);
}
