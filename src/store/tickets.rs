use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::support::{SupportError, Ticket, TicketReplied, TicketReply, TicketStatus};
use crate::store::outbox;

// ============================================================================
// Ticket Store
// ============================================================================

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    user_id: Uuid,
    subject: String,
    body: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = SupportError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Ticket {
            id: row.id,
            user_id: row.user_id,
            subject: row.subject,
            body: row.body,
            status: TicketStatus::parse(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReplyRow {
    id: Uuid,
    ticket_id: Uuid,
    author_user_id: Uuid,
    body: String,
    created_at: DateTime<Utc>,
}

const TICKET_COLS: &str = "id, user_id, subject, body, status, created_at, updated_at";

#[derive(Clone)]
pub struct TicketStore {
    pool: PgPool,
}

impl TicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn open(&self, user_id: Uuid, subject: &str, body: &str) -> anyhow::Result<Ticket> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "INSERT INTO tickets (id, user_id, subject, body, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, 'OPEN', NOW(), NOW())
             RETURNING {TICKET_COLS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(subject)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;

        Ticket::try_from(row).map_err(Into::into)
    }

    pub async fn get(&self, ticket_id: Uuid) -> anyhow::Result<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLS} FROM tickets WHERE id = $1"
        ))
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Ticket::try_from).transpose().map_err(Into::into)
    }

    pub async fn list(
        &self,
        user_id: Option<Uuid>,
        status: Option<TicketStatus>,
        limit: i64,
    ) -> anyhow::Result<Vec<Ticket>> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLS} FROM tickets
             WHERE ($1::uuid IS NULL OR user_id = $1)
               AND ($2::text IS NULL OR status = $2)
             ORDER BY updated_at DESC
             LIMIT $3"
        ))
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| Ticket::try_from(r).map_err(Into::into))
            .collect()
    }

    /// Insert the reply, move the ticket status, and (for staff replies)
    /// enqueue the opener's notification, all in one transaction.
    pub async fn add_reply(
        &self,
        ticket: &Ticket,
        author_user_id: Uuid,
        body: &str,
        new_status: TicketStatus,
        notify_opener: bool,
    ) -> anyhow::Result<TicketReply> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ReplyRow>(
            "INSERT INTO ticket_replies (id, ticket_id, author_user_id, body, created_at)
             VALUES ($1, $2, $3, $4, NOW())
             RETURNING id, ticket_id, author_user_id, body, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(ticket.id)
        .bind(author_user_id)
        .bind(body)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE tickets SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(new_status.as_str())
            .bind(ticket.id)
            .execute(&mut *tx)
            .await?;

        if notify_opener {
            let event = TicketReplied {
                ticket_id: ticket.id,
                opener_user_id: ticket.user_id,
                subject: ticket.subject.clone(),
            };

            outbox::enqueue(
                &mut tx,
                ticket.id,
                TicketReplied::EVENT_TYPE,
                &serde_json::to_string(&event)?,
            )
            .await?;
        }

        tx.commit().await?;

        Ok(TicketReply {
            id: row.id,
            ticket_id: row.ticket_id,
            author_user_id: row.author_user_id,
            body: row.body,
            created_at: row.created_at,
        })
    }

    pub async fn replies(&self, ticket_id: Uuid) -> anyhow::Result<Vec<TicketReply>> {
        let rows = sqlx::query_as::<_, ReplyRow>(
            "SELECT id, ticket_id, author_user_id, body, created_at
             FROM ticket_replies WHERE ticket_id = $1
             ORDER BY created_at ASC",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TicketReply {
                id: r.id,
                ticket_id: r.ticket_id,
                author_user_id: r.author_user_id,
                body: r.body,
                created_at: r.created_at,
            })
            .collect())
    }

    pub async fn close(&self, ticket_id: Uuid) -> anyhow::Result<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "UPDATE tickets SET status = 'CLOSED', updated_at = NOW()
             WHERE id = $1 AND status <> 'CLOSED'
             RETURNING {TICKET_COLS}"
        ))
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Ticket::try_from).transpose().map_err(Into::into)
    }
}
