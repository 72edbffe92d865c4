use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

// ============================================================================
// Outbox Store
// ============================================================================
//
// Notification side effects are enqueued here inside the same transaction as
// the state change that caused them. The relay drains undispatched rows in
// order; rows that exhaust their attempts are copied to dead_letters and
// marked dispatched so they cannot wedge the queue.
//
// ============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub aggregate_id: Uuid,
    pub event_type: String,
    pub payload: String,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeadLetterRecord {
    pub id: Uuid,
    pub aggregate_id: Uuid,
    pub event_type: String,
    pub payload: String,
    pub error_message: String,
    pub failure_count: i32,
    pub first_failed_at: DateTime<Utc>,
    pub last_failed_at: DateTime<Utc>,
}

/// Enqueue inside an open transaction; commits with the caller's write.
pub async fn enqueue(
    tx: &mut Transaction<'_, Postgres>,
    aggregate_id: Uuid,
    event_type: &str,
    payload: &str,
) -> sqlx::Result<Uuid> {
    let id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO outbox_messages (id, aggregate_id, event_type, payload, attempts, created_at)
         VALUES ($1, $2, $3, $4, 0, NOW())",
    )
    .bind(id)
    .bind(aggregate_id)
    .bind(event_type)
    .bind(payload)
    .execute(&mut **tx)
    .await?;

    Ok(id)
}

#[derive(Clone)]
pub struct OutboxStore {
    pool: PgPool,
}

impl OutboxStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Oldest undispatched messages first.
    pub async fn fetch_undispatched(&self, limit: i64) -> anyhow::Result<Vec<OutboxMessage>> {
        let rows = sqlx::query_as::<_, OutboxMessage>(
            "SELECT id, aggregate_id, event_type, payload, attempts, created_at
             FROM outbox_messages
             WHERE dispatched_at IS NULL
             ORDER BY created_at ASC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn mark_dispatched(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE outbox_messages SET dispatched_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn record_attempt(&self, id: Uuid) -> anyhow::Result<i32> {
        let attempts: i32 = sqlx::query_scalar(
            "UPDATE outbox_messages SET attempts = attempts + 1 WHERE id = $1 RETURNING attempts",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(attempts)
    }

    /// Park a poisoned message: copy to dead_letters and mark dispatched in
    /// one transaction so it is either parked or still pending, never both.
    pub async fn dead_letter(&self, message: &OutboxMessage, error: &str) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO dead_letters (id, aggregate_id, event_type, payload, error_message,
                                       failure_count, first_failed_at, last_failed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())",
        )
        .bind(message.id)
        .bind(message.aggregate_id)
        .bind(&message.event_type)
        .bind(&message.payload)
        .bind(error)
        .bind(message.attempts)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE outbox_messages SET dispatched_at = NOW() WHERE id = $1")
            .bind(message.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::error!(
            message_id = %message.id,
            event_type = %message.event_type,
            error = %error,
            "💀 Outbox message moved to dead letters"
        );

        Ok(())
    }

    pub async fn dead_letters(&self, limit: i64) -> anyhow::Result<Vec<DeadLetterRecord>> {
        let rows = sqlx::query_as::<_, DeadLetterRecord>(
            "SELECT id, aggregate_id, event_type, payload, error_message,
                    failure_count, first_failed_at, last_failed_at
             FROM dead_letters
             ORDER BY last_failed_at DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn pending_count(&self) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM outbox_messages WHERE dispatched_at IS NULL",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
