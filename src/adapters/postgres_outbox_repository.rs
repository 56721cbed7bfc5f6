use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::notifications::{EmailMessage, OutboxEntry, OutboxMessage};
use crate::ports::{OutboxRepository, RepositoryResult};

/// How long a claimed row stays invisible to other dispatchers.
const CLAIM_LEASE_SECS: i64 = 300;

#[derive(Clone)]
pub struct PostgresOutboxRepository {
    pool: PgPool,
}

impl PostgresOutboxRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Inserts on the caller's connection so the message commits with the state change.
pub(crate) async fn insert_outbox(
    conn: &mut PgConnection,
    message: &OutboxMessage,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO notification_outbox (id, idempotency_key, payload)
        VALUES ($1, $2, $3)
        ON CONFLICT (idempotency_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&message.idempotency_key)
    .bind(Json(&message.email))
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

#[async_trait]
impl OutboxRepository for PostgresOutboxRepository {
    async fn enqueue(&self, message: &OutboxMessage) -> RepositoryResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Ok(insert_outbox(&mut conn, message).await?)
    }

    async fn claim_due(&self, now: DateTime<Utc>, limit: i64) -> RepositoryResult<Vec<OutboxEntry>> {
        let rows = sqlx::query_as::<_, OutboxRow>(
            r#"
            UPDATE notification_outbox
            SET next_attempt_at = $3
            WHERE id IN (
                SELECT id FROM notification_outbox
                WHERE delivered_at IS NULL AND failed_at IS NULL AND next_attempt_at <= $1
                ORDER BY next_attempt_at
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, idempotency_key, payload, attempts
            "#,
        )
        .bind(now)
        .bind(limit)
        .bind(now + Duration::seconds(CLAIM_LEASE_SECS))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OutboxRow::into_entry).collect())
    }

    async fn mark_delivered(&self, id: Uuid, at: DateTime<Utc>) -> RepositoryResult<()> {
        sqlx::query("UPDATE notification_outbox SET delivered_at = $2, last_error = NULL WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        retry_at: Option<DateTime<Utc>>,
    ) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            UPDATE notification_outbox
            SET attempts = attempts + 1,
                last_error = $2,
                next_attempt_at = COALESCE($3, next_attempt_at),
                failed_at = CASE WHEN $3::timestamptz IS NULL THEN NOW() ELSE NULL END
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(retry_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OutboxRow {
    id: Uuid,
    idempotency_key: String,
    payload: Json<EmailMessage>,
    attempts: i32,
}

impl OutboxRow {
    fn into_entry(self) -> OutboxEntry {
        OutboxEntry {
            id: self.id,
            attempts: self.attempts,
            message: OutboxMessage {
                idempotency_key: self.idempotency_key,
                email: self.payload.0,
            },
        }
    }
}
