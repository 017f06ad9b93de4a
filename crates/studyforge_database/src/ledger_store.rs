//! PostgreSQL usage ledgers.

use crate::connection::{DbPool, with_conn};
use crate::schema::usage_ledgers;
use crate::{DatabaseResult, UsageLedgerRow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use studyforge_core::{PrincipalId, TokenDelta, UsageLedger, WindowReset};
use studyforge_error::{DatabaseError, StudyforgeResult};
use studyforge_interface::UsageLedgerStore;
use tracing::instrument;

/// Ledger store backed by the `usage_ledgers` table.
///
/// Every mutation locks the principal's row (`SELECT ... FOR UPDATE`) for
/// the length of its transaction, so concurrent increments never lose
/// updates.
#[derive(Clone)]
pub struct PostgresUsageLedgerStore {
    pool: DbPool,
}

impl PostgresUsageLedgerStore {
    /// Create a store over a connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Insert an empty ledger if none exists, then lock and load it.
fn lock_or_create(
    conn: &mut PgConnection,
    principal: &PrincipalId,
    now: DateTime<Utc>,
) -> DatabaseResult<UsageLedger> {
    let fresh = UsageLedgerRow::try_from(&UsageLedger::new(principal.clone(), now))?;
    diesel::insert_into(usage_ledgers::table)
        .values(&fresh)
        .on_conflict_do_nothing()
        .execute(conn)?;

    let row = usage_ledgers::table
        .find(principal.as_str())
        .select(UsageLedgerRow::as_select())
        .for_update()
        .first(conn)?;
    UsageLedger::try_from(row)
}

fn write(conn: &mut PgConnection, ledger: &UsageLedger) -> DatabaseResult<()> {
    let row = UsageLedgerRow::try_from(ledger)?;
    diesel::update(usage_ledgers::table.find(&row.principal_id))
        .set(&row)
        .execute(conn)?;
    Ok(())
}

#[async_trait]
impl UsageLedgerStore for PostgresUsageLedgerStore {
    #[instrument(skip(self), fields(principal = %principal))]
    async fn find_one(&self, principal: &PrincipalId) -> StudyforgeResult<Option<UsageLedger>> {
        let principal = principal.as_str().to_string();
        with_conn(&self.pool, move |conn| {
            usage_ledgers::table
                .find(principal)
                .select(UsageLedgerRow::as_select())
                .first(conn)
                .optional()?
                .map(UsageLedger::try_from)
                .transpose()
        })
        .await
    }

    #[instrument(skip(self), fields(principal = %principal))]
    async fn roll_windows(
        &self,
        principal: &PrincipalId,
        now: DateTime<Utc>,
    ) -> StudyforgeResult<(UsageLedger, WindowReset)> {
        let principal = principal.clone();
        with_conn(&self.pool, move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                let mut ledger = lock_or_create(conn, &principal, now)?;
                let reset = ledger.roll_windows(now);
                if reset.any() {
                    write(conn, &ledger)?;
                }
                Ok((ledger, reset))
            })
        })
        .await
    }

    #[instrument(skip(self), fields(principal = %principal, tokens = delta.total))]
    async fn increment(
        &self,
        principal: &PrincipalId,
        delta: TokenDelta,
        now: DateTime<Utc>,
    ) -> StudyforgeResult<UsageLedger> {
        let principal = principal.clone();
        with_conn(&self.pool, move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                let mut ledger = lock_or_create(conn, &principal, now)?;
                ledger.roll_windows(now);
                ledger.add(delta, now);
                write(conn, &ledger)?;
                Ok(ledger)
            })
        })
        .await
    }
}
