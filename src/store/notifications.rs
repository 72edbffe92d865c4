use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::notification::{Notification, NotificationDraft};

// ============================================================================
// Notification Store
// ============================================================================

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    recipient_user_id: Option<Uuid>,
    title: String,
    body: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: row.id,
            recipient_user_id: row.recipient_user_id,
            title: row.title,
            body: row.body,
            read: row.read,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone)]
pub struct NotificationStore {
    pool: PgPool,
}

impl NotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, draft: &NotificationDraft) -> anyhow::Result<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            "INSERT INTO notifications (id, recipient_user_id, title, body, read, created_at)
             VALUES ($1, $2, $3, $4, FALSE, NOW())
             RETURNING id, recipient_user_id, title, body, read, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(draft.recipient_user_id)
        .bind(&draft.title)
        .bind(&draft.body)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// A user's own notifications; admins additionally see the broadcast
    /// rows (recipient NULL).
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        include_broadcasts: bool,
        limit: i64,
    ) -> anyhow::Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT id, recipient_user_id, title, body, read, created_at
             FROM notifications
             WHERE recipient_user_id = $1
                OR ($2 AND recipient_user_id IS NULL)
             ORDER BY created_at DESC
             LIMIT $3",
        )
        .bind(user_id)
        .bind(include_broadcasts)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Mark read, but only rows the caller is allowed to see: their own,
    /// plus broadcasts for admins.
    pub async fn mark_read(
        &self,
        id: Uuid,
        user_id: Uuid,
        is_admin: bool,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE
             WHERE id = $1
               AND (recipient_user_id = $2 OR ($3 AND recipient_user_id IS NULL))",
        )
        .bind(id)
        .bind(user_id)
        .bind(is_admin)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
