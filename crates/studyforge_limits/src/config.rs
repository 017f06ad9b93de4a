//! Configuration for tier defaults and dispatch behaviour.
//!
//! The configuration system supports:
//! - Bundled defaults (include_str! from studyforge.toml)
//! - User overrides (~/.config/studyforge/studyforge.toml, then ./studyforge.toml)
//! - `STUDYFORGE__*` environment variables, highest precedence

use crate::TierDefaults;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use studyforge_core::{
    DEFAULT_ADVISORY_OVERHEAD_TOKENS, DEFAULT_FAILURE_THRESHOLD, SubscriptionTier, TierLimits,
    TokenAccounting,
};
use studyforge_error::{ConfigError, StudyforgeError, StudyforgeResult};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../studyforge.toml");

fn default_failure_threshold() -> u32 {
    DEFAULT_FAILURE_THRESHOLD
}

fn default_call_timeout_secs() -> u64 {
    60
}

fn default_advisory_overhead_tokens() -> u64 {
    DEFAULT_ADVISORY_OVERHEAD_TOKENS
}

fn default_probe_prompt() -> String {
    "Reply with the single word: ok".to_string()
}

/// Knobs for provider selection and call execution.
///
/// # Example
///
/// ```toml
/// [dispatch]
/// failure_threshold = 5
/// call_timeout_secs = 60
/// advisory_overhead_tokens = 50
/// token_accounting = "heuristic"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DispatchSettings {
    /// Consecutive failures that exhaust a provider
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Deadline for one provider call, in seconds
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Allowance added to the prompt estimate for quota pre-checks
    #[serde(default = "default_advisory_overhead_tokens")]
    pub advisory_overhead_tokens: u64,

    /// How completed calls are charged to the ledger
    #[serde(default)]
    pub token_accounting: TokenAccounting,

    /// Prompt sent by provider connectivity tests
    #[serde(default = "default_probe_prompt")]
    pub probe_prompt: String,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            call_timeout_secs: default_call_timeout_secs(),
            advisory_overhead_tokens: default_advisory_overhead_tokens(),
            token_accounting: TokenAccounting::default(),
            probe_prompt: default_probe_prompt(),
        }
    }
}

impl DispatchSettings {
    /// Call deadline as a duration.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

/// Top-level Studyforge configuration.
///
/// Loads configuration from TOML files with a precedence system:
/// 1. Bundled defaults (include_str! from studyforge.toml)
/// 2. User override (~/.config/studyforge/studyforge.toml, then ./studyforge.toml)
/// 3. Environment (`STUDYFORGE__DISPATCH__CALL_TIMEOUT_SECS=30`)
///
/// # Example
///
/// ```no_run
/// use studyforge_limits::StudyforgeConfig;
/// use studyforge_core::SubscriptionTier;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = StudyforgeConfig::load()?;
/// let free = config.tier_limits(SubscriptionTier::Free);
/// println!("Free tier: {} tokens/day", free.daily_limit);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct StudyforgeConfig {
    /// Map of tier name to default limits
    #[serde(default)]
    pub tiers: HashMap<String, TierDefaults>,

    /// Dispatch settings
    #[serde(default)]
    pub dispatch: DispatchSettings,
}

impl StudyforgeConfig {
    /// The bundled defaults alone, ignoring user files and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled file fails to parse or validate.
    pub fn bundled() -> StudyforgeResult<Self> {
        let config = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .map_err(|e| {
                StudyforgeError::from(ConfigError::new(format!(
                    "Failed to build bundled configuration: {}",
                    e
                )))
            })?;
        Self::finish(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> StudyforgeResult<Self> {
        debug!("Loading configuration from file");

        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                StudyforgeError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?;
        Self::finish(config)
    }

    /// Load configuration with precedence: environment > current dir > home dir > bundled.
    ///
    /// User config files are optional and will be silently skipped if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if a present source cannot be parsed or the merged
    /// configuration is invalid.
    #[instrument]
    pub fn load() -> StudyforgeResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(config_dir) = dirs::config_dir() {
            let home_config = config_dir.join("studyforge/studyforge.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("studyforge").required(false))
            .add_source(
                Environment::with_prefix("STUDYFORGE")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build().map_err(|e| {
            StudyforgeError::from(ConfigError::new(format!(
                "Failed to build configuration: {}",
                e
            )))
        })?;
        Self::finish(config)
    }

    fn finish(config: Config) -> StudyforgeResult<Self> {
        let parsed: Self = config.try_deserialize().map_err(|e| {
            StudyforgeError::from(ConfigError::new(format!(
                "Failed to parse configuration: {}",
                e
            )))
        })?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Check tier names and limit ordering.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown tier name, a daily limit
    /// above the monthly limit, a zero failure threshold or a zero timeout.
    pub fn validate(&self) -> StudyforgeResult<()> {
        for (name, defaults) in &self.tiers {
            SubscriptionTier::from_str(name)
                .map_err(|_| ConfigError::new(format!("Unknown tier '{}'", name)))?;
            defaults.limits().check()?;
        }
        if self.dispatch.failure_threshold == 0 {
            return Err(ConfigError::invalid_value("dispatch.failure_threshold", 0).into());
        }
        if self.dispatch.call_timeout_secs == 0 {
            return Err(ConfigError::invalid_value("dispatch.call_timeout_secs", 0).into());
        }
        Ok(())
    }

    /// Configured default limits for a tier, or the built-ins when absent.
    pub fn tier_limits(&self, tier: SubscriptionTier) -> TierLimits {
        self.tiers
            .iter()
            .find(|(name, _)| SubscriptionTier::from_str(name).ok() == Some(tier))
            .map(|(_, defaults)| defaults.limits())
            .unwrap_or_else(|| TierLimits::builtin(tier))
    }

    /// Configured description for a tier, if any.
    pub fn tier_description(&self, tier: SubscriptionTier) -> Option<&str> {
        self.tiers
            .iter()
            .find(|(name, _)| SubscriptionTier::from_str(name).ok() == Some(tier))
            .and_then(|(_, defaults)| defaults.description.as_deref())
    }
}

/// Extension for checking a limit pair.
pub(crate) trait LimitsCheck {
    fn check(&self) -> StudyforgeResult<()>;
}

impl LimitsCheck for TierLimits {
    fn check(&self) -> StudyforgeResult<()> {
        if self.daily_limit > self.monthly_limit {
            return Err(ConfigError::new(format!(
                "Daily limit {} exceeds monthly limit {}",
                self.daily_limit, self.monthly_limit
            ))
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn bundled_defaults_match_builtins() {
        let config = StudyforgeConfig::bundled().unwrap();
        for tier in SubscriptionTier::iter() {
            assert_eq!(config.tier_limits(tier), TierLimits::builtin(tier));
        }
        assert_eq!(config.dispatch, DispatchSettings::default());
    }

    #[test]
    fn missing_tier_falls_back_to_builtin() {
        let config = StudyforgeConfig::default();
        assert_eq!(
            config.tier_limits(SubscriptionTier::Pro),
            TierLimits::builtin(SubscriptionTier::Pro)
        );
    }

    #[test]
    fn inverted_limits_are_rejected() {
        assert!(TierLimits::new(10, 5).check().is_err());
        assert!(TierLimits::new(5, 5).check().is_ok());
    }
}
