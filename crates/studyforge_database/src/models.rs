//! Row types and their conversions to domain types.
//!
//! Counters are unsigned in the domain and `BIGINT`/`INTEGER` in Postgres;
//! a stored value that does not fit is reported as a corrupt record.

use crate::schema::{limit_policies, provider_configs, usage_ledgers};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::str::FromStr;
use studyforge_core::{
    LimitPolicy, NewProviderConfig, PrincipalId, ProviderConfig, ProviderId, ProviderKind,
    SubscriptionTier, TestStatus, UsageLedger,
};
use studyforge_error::{DatabaseError, DatabaseErrorKind};

fn corrupt(what: &str, value: impl std::fmt::Display) -> DatabaseError {
    DatabaseError::new(DatabaseErrorKind::Corrupt(format!("{what}: {value}")))
}

fn to_db(column: &str, value: u64) -> Result<i64, DatabaseError> {
    i64::try_from(value).map_err(|_| corrupt(column, value))
}

fn from_db(column: &str, value: i64) -> Result<u64, DatabaseError> {
    u64::try_from(value).map_err(|_| corrupt(column, value))
}

/// Row in `usage_ledgers`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset, Identifiable)]
#[diesel(table_name = usage_ledgers, primary_key(principal_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UsageLedgerRow {
    pub principal_id: String,
    pub total_tokens_used: i64,
    pub daily_input_tokens: i64,
    pub daily_output_tokens: i64,
    pub daily_tokens_used: i64,
    pub monthly_input_tokens: i64,
    pub monthly_output_tokens: i64,
    pub monthly_tokens_used: i64,
    pub last_daily_reset_at: DateTime<Utc>,
    pub last_monthly_reset_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&UsageLedger> for UsageLedgerRow {
    type Error = DatabaseError;

    fn try_from(ledger: &UsageLedger) -> Result<Self, Self::Error> {
        Ok(Self {
            principal_id: ledger.principal_id.as_str().to_string(),
            total_tokens_used: to_db("total_tokens_used", ledger.total_tokens_used)?,
            daily_input_tokens: to_db("daily_input_tokens", ledger.daily_input_tokens)?,
            daily_output_tokens: to_db("daily_output_tokens", ledger.daily_output_tokens)?,
            daily_tokens_used: to_db("daily_tokens_used", ledger.daily_tokens_used)?,
            monthly_input_tokens: to_db("monthly_input_tokens", ledger.monthly_input_tokens)?,
            monthly_output_tokens: to_db("monthly_output_tokens", ledger.monthly_output_tokens)?,
            monthly_tokens_used: to_db("monthly_tokens_used", ledger.monthly_tokens_used)?,
            last_daily_reset_at: ledger.last_daily_reset_at,
            last_monthly_reset_at: ledger.last_monthly_reset_at,
            created_at: ledger.created_at,
            updated_at: ledger.updated_at,
        })
    }
}

impl TryFrom<UsageLedgerRow> for UsageLedger {
    type Error = DatabaseError;

    fn try_from(row: UsageLedgerRow) -> Result<Self, Self::Error> {
        Ok(Self {
            principal_id: PrincipalId::new(row.principal_id),
            total_tokens_used: from_db("total_tokens_used", row.total_tokens_used)?,
            daily_input_tokens: from_db("daily_input_tokens", row.daily_input_tokens)?,
            daily_output_tokens: from_db("daily_output_tokens", row.daily_output_tokens)?,
            daily_tokens_used: from_db("daily_tokens_used", row.daily_tokens_used)?,
            monthly_input_tokens: from_db("monthly_input_tokens", row.monthly_input_tokens)?,
            monthly_output_tokens: from_db("monthly_output_tokens", row.monthly_output_tokens)?,
            monthly_tokens_used: from_db("monthly_tokens_used", row.monthly_tokens_used)?,
            last_daily_reset_at: row.last_daily_reset_at,
            last_monthly_reset_at: row.last_monthly_reset_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Row in `limit_policies`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = limit_policies, primary_key(tier), treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LimitPolicyRow {
    pub tier: String,
    pub daily_limit: i64,
    pub monthly_limit: i64,
    pub description: Option<String>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&LimitPolicy> for LimitPolicyRow {
    type Error = DatabaseError;

    fn try_from(policy: &LimitPolicy) -> Result<Self, Self::Error> {
        Ok(Self {
            tier: policy.tier.to_string(),
            daily_limit: to_db("daily_limit", policy.daily_limit)?,
            monthly_limit: to_db("monthly_limit", policy.monthly_limit)?,
            description: policy.description.clone(),
            is_active: policy.is_active,
            updated_at: policy.updated_at,
        })
    }
}

impl TryFrom<LimitPolicyRow> for LimitPolicy {
    type Error = DatabaseError;

    fn try_from(row: LimitPolicyRow) -> Result<Self, Self::Error> {
        Ok(Self {
            tier: SubscriptionTier::from_str(&row.tier).map_err(|_| corrupt("tier", &row.tier))?,
            daily_limit: from_db("daily_limit", row.daily_limit)?,
            monthly_limit: from_db("monthly_limit", row.monthly_limit)?,
            description: row.description,
            is_active: row.is_active,
            updated_at: row.updated_at,
        })
    }
}

/// Row in `provider_configs`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, AsChangeset, Identifiable)]
#[diesel(table_name = provider_configs, treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProviderConfigRow {
    pub id: i64,
    pub provider_kind: String,
    pub model: String,
    pub secret_credential: String,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub priority: i32,
    pub is_active: bool,
    pub credits_exhausted: bool,
    pub exhausted_at: Option<DateTime<Utc>>,
    pub failure_count: i32,
    pub success_count: i64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub test_status: String,
    pub test_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&ProviderConfig> for ProviderConfigRow {
    type Error = DatabaseError;

    fn try_from(config: &ProviderConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            id: config.id.get(),
            provider_kind: config.provider_kind.to_string(),
            model: config.model.clone(),
            secret_credential: config.secret_credential.clone(),
            base_url: config.base_url.clone(),
            temperature: config.temperature,
            priority: config.priority,
            is_active: config.is_active,
            credits_exhausted: config.credits_exhausted,
            exhausted_at: config.exhausted_at,
            failure_count: i32::try_from(config.failure_count)
                .map_err(|_| corrupt("failure_count", config.failure_count))?,
            success_count: to_db("success_count", config.success_count)?,
            last_success_at: config.last_success_at,
            last_failure_at: config.last_failure_at,
            test_status: config.test_status.to_string(),
            test_error: config.test_error.clone(),
            created_at: config.created_at,
            updated_at: config.updated_at,
        })
    }
}

impl TryFrom<ProviderConfigRow> for ProviderConfig {
    type Error = DatabaseError;

    fn try_from(row: ProviderConfigRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProviderId::new(row.id),
            provider_kind: ProviderKind::from_str(&row.provider_kind)
                .map_err(|_| corrupt("provider_kind", &row.provider_kind))?,
            model: row.model,
            secret_credential: row.secret_credential,
            base_url: row.base_url,
            temperature: row.temperature,
            priority: row.priority,
            is_active: row.is_active,
            credits_exhausted: row.credits_exhausted,
            exhausted_at: row.exhausted_at,
            failure_count: u32::try_from(row.failure_count)
                .map_err(|_| corrupt("failure_count", row.failure_count))?,
            success_count: from_db("success_count", row.success_count)?,
            last_success_at: row.last_success_at,
            last_failure_at: row.last_failure_at,
            test_status: TestStatus::from_str(&row.test_status)
                .map_err(|_| corrupt("test_status", &row.test_status))?,
            test_error: row.test_error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Insertable form of a new provider.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = provider_configs)]
pub struct NewProviderConfigRow {
    pub provider_kind: String,
    pub model: String,
    pub secret_credential: String,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub priority: i32,
    pub test_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewProviderConfigRow {
    /// Row for a freshly registered provider.
    pub fn new(new: NewProviderConfig, now: DateTime<Utc>) -> Self {
        Self {
            provider_kind: new.provider_kind.to_string(),
            model: new.model,
            secret_credential: new.secret_credential,
            base_url: new.base_url,
            temperature: new.temperature,
            priority: new.priority,
            test_status: TestStatus::NotTested.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
