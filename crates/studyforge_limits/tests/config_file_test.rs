//! Tests for loading configuration files.

use std::io::Write;
use studyforge_core::{SubscriptionTier, TierLimits, TokenAccounting};
use studyforge_limits::StudyforgeConfig;
use tempfile::Builder;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

#[test]
fn from_file_reads_tiers_and_dispatch() {
    let file = write_config(
        r#"
[tiers.free]
daily_limit = 50
monthly_limit = 500

[dispatch]
failure_threshold = 3
call_timeout_secs = 15
token_accounting = "prefer_reported"
"#,
    );

    let config = StudyforgeConfig::from_file(file.path()).unwrap();

    assert_eq!(
        config.tier_limits(SubscriptionTier::Free),
        TierLimits::new(50, 500)
    );
    assert_eq!(
        config.tier_limits(SubscriptionTier::Guest),
        TierLimits::builtin(SubscriptionTier::Guest)
    );
    assert_eq!(config.dispatch.failure_threshold, 3);
    assert_eq!(config.dispatch.call_timeout().as_secs(), 15);
    assert_eq!(config.dispatch.advisory_overhead_tokens, 50);
    assert_eq!(config.dispatch.token_accounting, TokenAccounting::PreferReported);
}

#[test]
fn unknown_tier_is_rejected() {
    let file = write_config(
        r#"
[tiers.gold]
daily_limit = 1
monthly_limit = 2
"#,
    );
    let err = StudyforgeConfig::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("gold"));
}

#[test]
fn inverted_tier_limits_are_rejected() {
    let file = write_config(
        r#"
[tiers.pro]
daily_limit = 9000
monthly_limit = 10
"#,
    );
    assert!(StudyforgeConfig::from_file(file.path()).is_err());
}

#[test]
fn missing_file_is_an_error() {
    assert!(StudyforgeConfig::from_file("/nonexistent/studyforge.toml").is_err());
}
