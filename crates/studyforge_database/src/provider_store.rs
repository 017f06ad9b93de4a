//! PostgreSQL provider configurations.

use crate::connection::{DbPool, with_conn};
use crate::schema::provider_configs;
use crate::{DatabaseResult, NewProviderConfigRow, ProviderConfigRow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use studyforge_core::{NewProviderConfig, ProviderConfig, ProviderId, ProviderTransition};
use studyforge_error::{DatabaseError, StudyforgeResult};
use studyforge_interface::{Activation, ProviderStore};
use tracing::{debug, instrument};

/// Provider store backed by the `provider_configs` table.
///
/// A partial unique index on `is_active` backs the single-active rule;
/// [`activate_exclusive`](ProviderStore::activate_exclusive) locks every row
/// so concurrent promotions serialize instead of tripping it.
#[derive(Clone)]
pub struct PostgresProviderStore {
    pool: DbPool,
}

impl PostgresProviderStore {
    /// Create a store over a connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn locked(conn: &mut PgConnection, id: i64) -> DatabaseResult<Option<ProviderConfig>> {
    provider_configs::table
        .find(id)
        .select(ProviderConfigRow::as_select())
        .for_update()
        .first(conn)
        .optional()?
        .map(ProviderConfig::try_from)
        .transpose()
}

fn store(conn: &mut PgConnection, config: &ProviderConfig) -> DatabaseResult<ProviderConfig> {
    let row = ProviderConfigRow::try_from(config)?;
    let stored: ProviderConfigRow = diesel::update(provider_configs::table.find(row.id))
        .set(&row)
        .returning(ProviderConfigRow::as_returning())
        .get_result(conn)?;
    ProviderConfig::try_from(stored)
}

#[async_trait]
impl ProviderStore for PostgresProviderStore {
    async fn list(&self) -> StudyforgeResult<Vec<ProviderConfig>> {
        with_conn(&self.pool, |conn| {
            provider_configs::table
                .order(provider_configs::id.asc())
                .select(ProviderConfigRow::as_select())
                .load(conn)?
                .into_iter()
                .map(ProviderConfig::try_from)
                .collect()
        })
        .await
    }

    async fn find_one(&self, id: ProviderId) -> StudyforgeResult<Option<ProviderConfig>> {
        with_conn(&self.pool, move |conn| {
            provider_configs::table
                .find(id.get())
                .select(ProviderConfigRow::as_select())
                .first(conn)
                .optional()?
                .map(ProviderConfig::try_from)
                .transpose()
        })
        .await
    }

    #[instrument(skip(self, new), fields(kind = %new.provider_kind, model = %new.model))]
    async fn insert(
        &self,
        new: NewProviderConfig,
        now: DateTime<Utc>,
    ) -> StudyforgeResult<ProviderConfig> {
        let row = NewProviderConfigRow::new(new, now);
        with_conn(&self.pool, move |conn| {
            let stored: ProviderConfigRow = diesel::insert_into(provider_configs::table)
                .values(&row)
                .returning(ProviderConfigRow::as_returning())
                .get_result(conn)?;
            ProviderConfig::try_from(stored)
        })
        .await
    }

    #[instrument(skip(self, transition))]
    async fn apply(
        &self,
        id: ProviderId,
        transition: ProviderTransition,
        now: DateTime<Utc>,
    ) -> StudyforgeResult<Option<ProviderConfig>> {
        with_conn(&self.pool, move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                let Some(mut config) = locked(conn, id.get())? else {
                    return Ok(None);
                };
                config.apply(&transition, now);
                store(conn, &config).map(Some)
            })
        })
        .await
    }

    #[instrument(skip(self))]
    async fn activate_exclusive(
        &self,
        id: ProviderId,
        now: DateTime<Utc>,
    ) -> StudyforgeResult<Activation> {
        with_conn(&self.pool, move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                provider_configs::table
                    .select(provider_configs::id)
                    .for_update()
                    .load::<i64>(conn)?;

                let Some(mut config) = locked(conn, id.get())? else {
                    return Ok(Activation::NotFound);
                };
                if !config.is_available() {
                    debug!(provider = %config.label(), "Refusing to activate exhausted provider");
                    return Ok(Activation::Unavailable(config));
                }

                let demoted = diesel::update(
                    provider_configs::table
                        .filter(provider_configs::is_active.eq(true))
                        .filter(provider_configs::id.ne(id.get())),
                )
                .set((
                    provider_configs::is_active.eq(false),
                    provider_configs::updated_at.eq(now),
                ))
                .execute(conn)?;
                debug!(demoted, "Cleared previous active provider");

                if config.is_active {
                    return Ok(Activation::Activated(config));
                }
                config.apply(&ProviderTransition::SetActive(true), now);
                store(conn, &config).map(Activation::Activated)
            })
        })
        .await
    }

    #[instrument(skip(self))]
    async fn remove(&self, id: ProviderId) -> StudyforgeResult<bool> {
        with_conn(&self.pool, move |conn| {
            let deleted = diesel::delete(provider_configs::table.find(id.get())).execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }
}
