//! PostgreSQL limit policies.

use crate::LimitPolicyRow;
use crate::connection::{DbPool, with_conn};
use crate::schema::limit_policies;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use studyforge_core::{LimitPolicy, SubscriptionTier};
use studyforge_error::StudyforgeResult;
use studyforge_interface::LimitPolicyStore;
use tracing::instrument;

/// Policy store backed by the `limit_policies` table, one row per tier.
#[derive(Clone)]
pub struct PostgresLimitPolicyStore {
    pool: DbPool,
}

impl PostgresLimitPolicyStore {
    /// Create a store over a connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LimitPolicyStore for PostgresLimitPolicyStore {
    #[instrument(skip(self))]
    async fn find_active(&self, tier: SubscriptionTier) -> StudyforgeResult<Option<LimitPolicy>> {
        with_conn(&self.pool, move |conn| {
            limit_policies::table
                .find(tier.as_ref())
                .filter(limit_policies::is_active.eq(true))
                .select(LimitPolicyRow::as_select())
                .first(conn)
                .optional()?
                .map(LimitPolicy::try_from)
                .transpose()
        })
        .await
    }

    async fn list(&self) -> StudyforgeResult<Vec<LimitPolicy>> {
        with_conn(&self.pool, |conn| {
            limit_policies::table
                .order(limit_policies::tier.asc())
                .select(LimitPolicyRow::as_select())
                .load(conn)?
                .into_iter()
                .map(LimitPolicy::try_from)
                .collect()
        })
        .await
    }

    #[instrument(skip(self, policy), fields(tier = %policy.tier))]
    async fn upsert(&self, policy: &LimitPolicy) -> StudyforgeResult<LimitPolicy> {
        let row = LimitPolicyRow::try_from(policy)?;
        with_conn(&self.pool, move |conn| {
            let stored: LimitPolicyRow = diesel::insert_into(limit_policies::table)
                .values(&row)
                .on_conflict(limit_policies::tier)
                .do_update()
                .set(&row)
                .returning(LimitPolicyRow::as_returning())
                .get_result(conn)?;
            LimitPolicy::try_from(stored)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn deactivate(
        &self,
        tier: SubscriptionTier,
        now: DateTime<Utc>,
    ) -> StudyforgeResult<bool> {
        with_conn(&self.pool, move |conn| {
            let updated = diesel::update(limit_policies::table.find(tier.as_ref()))
                .set((
                    limit_policies::is_active.eq(false),
                    limit_policies::updated_at.eq(now),
                ))
                .execute(conn)?;
            Ok(updated > 0)
        })
        .await
    }
}
