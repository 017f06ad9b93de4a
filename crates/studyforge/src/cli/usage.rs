//! Usage, quota and prompt commands.

use super::output::{emit, print_usage};
use studyforge::{
    GenerateRequest, Principal, PrincipalId, Studyforge, StudyforgeResult, SubscriptionTier,
};

/// Show a principal's usage counters.
pub async fn show_usage(core: &Studyforge, principal: String, json: bool) -> StudyforgeResult<()> {
    let snapshot = core.usage_snapshot(&PrincipalId::new(principal)).await?;
    emit(json, &snapshot, print_usage)
}

/// Show a quota decision.
pub async fn show_quota(
    core: &Studyforge,
    principal: String,
    tier: SubscriptionTier,
    tokens: u64,
    json: bool,
) -> StudyforgeResult<()> {
    let status = core
        .check_quota(&Principal::new(principal, tier), tokens)
        .await?;
    emit(json, &status, |s| {
        println!("{}", if s.allowed { "allowed" } else { "denied" });
        println!(
            "  daily:   {} of {} left ({} used)",
            s.daily_remaining, s.daily_limit, s.daily_used
        );
        println!(
            "  monthly: {} of {} left ({} used)",
            s.monthly_remaining, s.monthly_limit, s.monthly_used
        );
    })
}

/// Send a prompt and print the answer.
pub async fn ask(
    core: &Studyforge,
    prompt: String,
    principal: Principal,
    unmetered: bool,
    max_tokens: Option<u32>,
    json: bool,
) -> StudyforgeResult<()> {
    let mut request = GenerateRequest::new(prompt);
    if let Some(max) = max_tokens {
        request = request.with_max_tokens(max);
    }
    let result = if unmetered {
        core.dispatch_unmetered(request).await?
    } else {
        core.dispatch_ai_call(&principal, request).await?
    };
    emit(json, &result, |r| {
        println!("{}", r.text);
        eprintln!(
            "[{} {} | {} tokens{}]",
            r.provider_kind,
            r.model,
            r.usage.total_tokens(),
            if r.fell_back { " | fallback" } else { "" }
        );
    })
}
