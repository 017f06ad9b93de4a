//! Tests for provider selection and the registry state machine.

mod common;

use common::harness;
use studyforge_core::{ProviderKind, ProviderState, TestStatus};
use studyforge_dispatch::RegistryHealth;

#[tokio::test]
async fn empty_registry_is_configuration_missing() {
    let h = harness();

    let err = h.dispatcher.select_provider().await.unwrap_err();

    assert!(err.is_configuration_missing());
    assert_eq!(err.http_status(), 503);
}

#[tokio::test]
async fn new_providers_start_untested_and_inactive() {
    let h = harness();
    let p = h.add(ProviderKind::Groq, "llama", 10).await;

    assert_eq!(p.state(), ProviderState::Untested);
    assert_eq!(p.test_status, TestStatus::NotTested);
    assert!(!p.is_active);
}

#[tokio::test]
async fn first_selection_promotes_highest_priority() {
    let h = harness();
    let low = h.add(ProviderKind::OpenAi, "gpt", 20).await;
    let high = h.add(ProviderKind::Groq, "llama", 5).await;

    let selected = h.dispatcher.select_provider().await.unwrap();

    assert_eq!(selected.id, high.id);
    assert!(selected.is_active);
    assert_eq!(h.active_ids().await, vec![high.id.get()]);
    assert_ne!(selected.id, low.id);
}

#[tokio::test]
async fn equal_priority_prefers_newest() {
    let h = harness();
    let older = h.add(ProviderKind::OpenAi, "gpt", 1).await;
    let newer = h.add(ProviderKind::Anthropic, "claude", 1).await;

    let listed: Vec<_> = h
        .registry
        .list_providers()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();

    assert_eq!(listed, vec![newer.id, older.id]);
}

#[tokio::test]
async fn active_provider_is_returned_unchanged() {
    let h = harness();
    let p1 = h.add(ProviderKind::Groq, "llama", 1).await;
    let p2 = h.add(ProviderKind::OpenAi, "gpt", 2).await;
    h.registry.set_enabled(p2.id, true).await.unwrap();

    let selected = h.dispatcher.select_provider().await.unwrap();

    assert_eq!(selected.id, p2.id);
    assert_eq!(h.active_ids().await, vec![p2.id.get()]);
    assert_ne!(selected.id, p1.id);
}

#[tokio::test]
async fn exhausted_active_provider_hands_over_to_next() {
    let h = harness();
    let p1 = h.add(ProviderKind::Groq, "llama", 1).await;
    let p2 = h.add(ProviderKind::OpenAi, "gpt", 2).await;
    h.dispatcher.select_provider().await.unwrap();

    let exhausted = h.registry.mark_exhausted(p1.id, "credits gone").await.unwrap();
    assert_eq!(exhausted.state(), ProviderState::Exhausted);
    assert!(!exhausted.is_active);
    assert!(exhausted.exhausted_at.is_some());

    let selected = h.dispatcher.select_provider().await.unwrap();
    assert_eq!(selected.id, p2.id);
    assert_eq!(h.active_ids().await, vec![p2.id.get()]);
}

#[tokio::test]
async fn degraded_mode_returns_first_exhausted_without_promotion() {
    let h = harness();
    let p1 = h.add(ProviderKind::Groq, "llama", 1).await;
    let p2 = h.add(ProviderKind::OpenAi, "gpt", 2).await;
    h.registry.mark_exhausted(p1.id, "quota").await.unwrap();
    h.registry.mark_exhausted(p2.id, "quota").await.unwrap();

    let selected = h.dispatcher.select_provider().await.unwrap();

    assert_eq!(selected.id, p1.id);
    assert!(h.active_ids().await.is_empty());
    assert!(h.registry.all_exhausted().await.unwrap());
}

#[tokio::test]
async fn failure_streak_exhausts_at_threshold() {
    let h = harness();
    let p = h.add(ProviderKind::Groq, "llama", 1).await;
    let threshold = h.registry.failure_threshold();

    for strike in 1..threshold {
        let config = h.registry.record_failure(p.id, "503").await.unwrap();
        assert_eq!(config.state(), ProviderState::Failing(strike));
        assert!(!config.credits_exhausted);
    }
    let config = h.registry.record_failure(p.id, "503").await.unwrap();

    assert_eq!(config.state(), ProviderState::Exhausted);
    assert_eq!(config.failure_count, threshold);
    assert!(config.test_error.unwrap().contains("503"));
}

#[tokio::test]
async fn success_clears_failure_streak() {
    let h = harness();
    let p = h.add(ProviderKind::Groq, "llama", 1).await;
    h.registry.record_failure(p.id, "timeout").await.unwrap();
    h.registry.record_failure(p.id, "timeout").await.unwrap();

    let config = h.registry.record_success(p.id).await.unwrap();

    assert_eq!(config.failure_count, 0);
    assert_eq!(config.success_count, 1);
    assert_eq!(config.test_status, TestStatus::Success);
    assert!(config.last_success_at.is_some());
}

#[tokio::test]
async fn restore_clears_exhaustion() {
    let h = harness();
    let p = h.add(ProviderKind::Groq, "llama", 1).await;
    for _ in 0..h.registry.failure_threshold() {
        h.registry.record_failure(p.id, "boom").await.unwrap();
    }

    let restored = h.registry.restore_provider(p.id).await.unwrap();

    assert!(!restored.credits_exhausted);
    assert!(restored.exhausted_at.is_none());
    assert_eq!(restored.failure_count, 0);
    assert_eq!(restored.test_status, TestStatus::NotTested);
    assert!(restored.test_error.is_none());
}

#[tokio::test]
async fn restored_higher_priority_provider_is_selected_next() {
    let h = harness();
    let p1 = h.add(ProviderKind::Groq, "llama", 1).await;
    let p2 = h.add(ProviderKind::OpenAi, "gpt", 2).await;
    h.dispatcher.select_provider().await.unwrap();
    h.registry.mark_exhausted(p1.id, "quota").await.unwrap();
    assert_eq!(h.dispatcher.select_provider().await.unwrap().id, p2.id);

    h.registry.restore_provider(p1.id).await.unwrap();

    assert_eq!(h.dispatcher.select_provider().await.unwrap().id, p1.id);
    assert_eq!(h.active_ids().await, vec![p1.id.get()]);
}

#[tokio::test]
async fn restored_lower_priority_provider_stays_in_reserve() {
    let h = harness();
    let p1 = h.add(ProviderKind::Groq, "llama", 1).await;
    let p2 = h.add(ProviderKind::OpenAi, "gpt", 2).await;
    h.dispatcher.select_provider().await.unwrap();
    h.registry.mark_exhausted(p2.id, "quota").await.unwrap();

    let restored = h.registry.restore_provider(p2.id).await.unwrap();

    assert!(!restored.is_active);
    assert_eq!(h.active_ids().await, vec![p1.id.get()]);
}

#[tokio::test]
async fn enabling_exhausted_provider_is_rejected() {
    let h = harness();
    let p = h.add(ProviderKind::Groq, "llama", 1).await;
    h.registry.mark_exhausted(p.id, "quota").await.unwrap();

    let err = h.registry.set_enabled(p.id, true).await.unwrap_err();

    assert_eq!(err.http_status(), 400);
}

#[tokio::test]
async fn at_most_one_provider_is_ever_active() {
    let h = harness();
    let p1 = h.add(ProviderKind::Groq, "llama", 1).await;
    let p2 = h.add(ProviderKind::OpenAi, "gpt", 2).await;
    let p3 = h.add(ProviderKind::Anthropic, "claude", 3).await;

    h.registry.set_enabled(p3.id, true).await.unwrap();
    assert!(h.active_ids().await.len() <= 1);
    h.registry.set_enabled(p2.id, true).await.unwrap();
    assert!(h.active_ids().await.len() <= 1);
    h.registry.mark_exhausted(p2.id, "quota").await.unwrap();
    assert!(h.active_ids().await.is_empty());
    h.dispatcher.select_provider().await.unwrap();
    assert_eq!(h.active_ids().await, vec![p1.id.get()]);
    h.registry.restore_provider(p2.id).await.unwrap();
    assert_eq!(h.active_ids().await, vec![p1.id.get()]);
    h.registry.set_enabled(p1.id, false).await.unwrap();
    assert!(h.active_ids().await.is_empty());
}

#[tokio::test]
async fn unknown_provider_is_not_found() {
    let h = harness();

    let err = h
        .registry
        .remove_provider(studyforge_core::ProviderId::new(42))
        .await
        .unwrap_err();

    assert_eq!(err.http_status(), 404);
}

#[tokio::test]
async fn invalid_provider_input_is_rejected() {
    let h = harness();
    let new = studyforge_core::NewProviderConfig::builder()
        .provider_kind(ProviderKind::OpenAi)
        .model("gpt")
        .secret_credential("   ")
        .build()
        .unwrap();

    let err = h.registry.add_provider(new).await.unwrap_err();

    assert_eq!(err.http_status(), 400);
    assert!(h.registry.list_providers().await.unwrap().is_empty());
}

#[tokio::test]
async fn health_summary_counts_states() {
    let h = harness();
    let p1 = h.add(ProviderKind::Groq, "llama", 1).await;
    let p2 = h.add(ProviderKind::OpenAi, "gpt", 2).await;
    h.add(ProviderKind::Anthropic, "claude", 3).await;
    h.registry.mark_exhausted(p1.id, "quota").await.unwrap();
    h.registry.record_failure(p2.id, "503").await.unwrap();
    h.registry.set_enabled(p2.id, true).await.unwrap();

    let health = h.registry.exhaustion_summary().await.unwrap();

    assert_eq!(
        health,
        RegistryHealth {
            total: 3,
            exhausted: 1,
            active: 1,
            failing: 1,
        }
    );
    assert!(!health.all_exhausted());
}
