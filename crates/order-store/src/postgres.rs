use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use common::{OrderId, RequestId};

use crate::{
    IntegrationEventRecord, LedgerEntry, OrderRecord, Result, StoreError, UnitOfWork, Version,
    outbox::EventPublishState, store::OrderStore, unit_of_work::OrderWrite,
};

/// PostgreSQL-backed order store.
///
/// The unit of work maps to a single database transaction; the order
/// row's version column and the primary key on `client_requests` provide
/// the conflict and dedup guarantees.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: PgRow) -> Result<OrderRecord> {
        Ok(OrderRecord {
            id: OrderId::new(row.try_get("id")?),
            payload: row.try_get("payload")?,
            version: Version::new(row.try_get("version")?),
        })
    }

    fn row_to_ledger_entry(row: PgRow) -> Result<LedgerEntry> {
        Ok(LedgerEntry {
            request_id: RequestId::from_uuid(row.try_get::<Uuid, _>("request_id")?),
            command_name: row.try_get("command_name")?,
            outcome: row.try_get("outcome")?,
            processed_at: row.try_get("processed_at")?,
        })
    }

    fn row_to_event(row: PgRow) -> Result<IntegrationEventRecord> {
        let state: String = row.try_get("state")?;
        let state = state.parse::<EventPublishState>().map_err(|e| {
            StoreError::Serialization(serde_json::Error::io(std::io::Error::other(e)))
        })?;

        Ok(IntegrationEventRecord {
            event_id: row.try_get("id")?,
            event_type: row.try_get("event_type")?,
            order_id: OrderId::new(row.try_get("order_id")?),
            payload: row.try_get("payload")?,
            occurred_at: row.try_get("occurred_at")?,
            state,
            times_sent: row.try_get("times_sent")?,
        })
    }

    fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
        if let sqlx::Error::Database(db_err) = err {
            db_err.constraint() == Some(constraint)
        } else {
            false
        }
    }

    async fn insert_ledger_entry(
        executor: impl sqlx::PgExecutor<'_>,
        entry: &LedgerEntry,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO client_requests (request_id, command_name, outcome, processed_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.request_id.as_uuid())
        .bind(&entry.command_name)
        .bind(&entry.outcome)
        .bind(entry.processed_at)
        .execute(executor)
        .await
        .map_err(|e| {
            if Self::is_unique_violation(&e, "client_requests_pkey") {
                tracing::warn!(
                    request_id = %entry.request_id,
                    "ledger insert rejected: request already recorded"
                );
                StoreError::DuplicateRequest(entry.request_id)
            } else {
                StoreError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn set_event_state(
        &self,
        event_id: Uuid,
        state: EventPublishState,
        bump_times_sent: bool,
    ) -> Result<()> {
        let sql = if bump_times_sent {
            "UPDATE integration_event_log SET state = $2, times_sent = times_sent + 1 WHERE id = $1"
        } else {
            "UPDATE integration_event_log SET state = $2 WHERE id = $1"
        };

        let result = sqlx::query(sql)
            .bind(event_id)
            .bind(state.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::EventNotFound(event_id));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn load(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let row = sqlx::query("SELECT id, payload, version FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn find_request(&self, request_id: RequestId) -> Result<Option<LedgerEntry>> {
        let row = sqlx::query(
            r#"
            SELECT request_id, command_name, outcome, processed_at
            FROM client_requests
            WHERE request_id = $1
            "#,
        )
        .bind(request_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_ledger_entry).transpose()
    }

    async fn record_request(&self, entry: LedgerEntry) -> Result<()> {
        Self::insert_ledger_entry(&self.pool, &entry).await
    }

    async fn commit(&self, uow: UnitOfWork) -> Result<()> {
        let (order_write, staged_events, ledger_entry) = uow.into_parts();

        let mut tx = self.pool.begin().await?;

        // The ledger entry goes in first: a concurrent delivery of the
        // same request must fail as a duplicate, not as a version conflict.
        if let Some(entry) = &ledger_entry {
            Self::insert_ledger_entry(&mut *tx, entry).await?;
        }

        match order_write {
            Some(OrderWrite::Insert(record)) => {
                sqlx::query("INSERT INTO orders (id, payload, version) VALUES ($1, $2, $3)")
                    .bind(record.id.as_i64())
                    .bind(&record.payload)
                    .bind(Version::first().as_i64())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        if Self::is_unique_violation(&e, "orders_pkey") {
                            tracing::warn!(
                                order_id = %record.id,
                                "commit rejected: order already exists"
                            );
                            StoreError::ConcurrencyConflict {
                                order_id: record.id,
                                expected: Version::initial(),
                                actual: Version::first(),
                            }
                        } else {
                            StoreError::Database(e)
                        }
                    })?;
            }
            Some(OrderWrite::Update { record, expected }) => {
                let result = sqlx::query(
                    "UPDATE orders SET payload = $2, version = $3 WHERE id = $1 AND version = $4",
                )
                .bind(record.id.as_i64())
                .bind(&record.payload)
                .bind(expected.next().as_i64())
                .bind(expected.as_i64())
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    let actual: Option<i64> =
                        sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                            .bind(record.id.as_i64())
                            .fetch_optional(&mut *tx)
                            .await?;

                    let actual = Version::new(actual.unwrap_or(0));
                    tracing::warn!(
                        order_id = %record.id,
                        expected = %expected,
                        actual = %actual,
                        "commit rejected: stale version"
                    );
                    return Err(StoreError::ConcurrencyConflict {
                        order_id: record.id,
                        expected,
                        actual,
                    });
                }
            }
            None => {}
        }

        for event in &staged_events {
            sqlx::query(
                r#"
                INSERT INTO integration_event_log
                    (id, event_type, order_id, payload, occurred_at, state, times_sent)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(event.event_id)
            .bind(&event.event_type)
            .bind(event.order_id.as_i64())
            .bind(&event.payload)
            .bind(event.occurred_at)
            .bind(event.state.as_str())
            .bind(event.times_sent)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn pending_integration_events(&self) -> Result<Vec<IntegrationEventRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, event_type, order_id, payload, occurred_at, state, times_sent
            FROM integration_event_log
            WHERE state = 'NotPublished'
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_event).collect()
    }

    async fn mark_event_in_progress(&self, event_id: Uuid) -> Result<()> {
        self.set_event_state(event_id, EventPublishState::InProgress, true)
            .await
    }

    async fn mark_event_published(&self, event_id: Uuid) -> Result<()> {
        self.set_event_state(event_id, EventPublishState::Published, false)
            .await
    }

    async fn mark_event_failed(&self, event_id: Uuid) -> Result<()> {
        self.set_event_state(event_id, EventPublishState::PublishFailed, false)
            .await
    }
}
