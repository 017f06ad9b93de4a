//! Printing command results.

use serde::Serialize;
use studyforge::{ProviderConfig, StudyforgeResult, UsageSnapshot};

/// Print `value` as pretty JSON, or hand it to `human` for plain text.
pub fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce(&T)) -> StudyforgeResult<()> {
    if json {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| studyforge::JsonError::new(e.to_string()))?;
        println!("{}", text);
    } else {
        human(value);
    }
    Ok(())
}

pub fn print_provider(p: &ProviderConfig) {
    println!(
        "{:>4}  {:<11} {:<40} prio {:>4}  {:<12} {}",
        p.id.get(),
        p.provider_kind,
        p.model,
        p.priority,
        p.state().to_string(),
        if p.is_active { "*" } else { "" }
    );
    if let Some(err) = &p.test_error {
        println!("      last error: {}", err);
    }
}

pub fn print_usage(u: &UsageSnapshot) {
    println!("Principal: {}", u.principal_id);
    println!(
        "  today:      {} tokens ({} in / {} out)",
        u.daily_tokens_used, u.daily_input_tokens, u.daily_output_tokens
    );
    println!(
        "  this month: {} tokens ({} in / {} out)",
        u.monthly_tokens_used, u.monthly_input_tokens, u.monthly_output_tokens
    );
    println!("  lifetime:   {} tokens", u.total_tokens_used);
}
