use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::payment::{
    Payment, PaymentError, PaymentStatus, Payout, PayoutDecided, PayoutStatus,
};
use crate::domain::promo::{commission_cents, resolve_commission_bps};
use crate::store::outbox;

// ============================================================================
// Payment & Payout Store
// ============================================================================

#[derive(sqlx::FromRow)]
struct PaymentRow {
    order_id: Uuid,
    status: String,
    amount_cents: i64,
    method: String,
    paid_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = PaymentError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            order_id: row.order_id,
            status: PaymentStatus::parse(&row.status)?,
            amount_cents: row.amount_cents,
            method: row.method,
            paid_at: row.paid_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PayoutRow {
    id: Uuid,
    vendor_id: Uuid,
    amount_cents: i64,
    status: String,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PayoutRow> for Payout {
    type Error = PaymentError;

    fn try_from(row: PayoutRow) -> Result<Self, Self::Error> {
        Ok(Payout {
            id: row.id,
            vendor_id: row.vendor_id,
            amount_cents: row.amount_cents,
            status: PayoutStatus::parse(&row.status)?,
            note: row.note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const PAYOUT_COLS: &str = "id, vendor_id, amount_cents, status, note, created_at, updated_at";

#[derive(Clone)]
pub struct PaymentStore {
    pool: PgPool,
}

impl PaymentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_for_order(&self, order_id: Uuid) -> anyhow::Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(
            "SELECT order_id, status, amount_cents, method, paid_at
             FROM payments WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payment::try_from).transpose().map_err(Into::into)
    }

    /// CAS on the previous status, same shape as order transitions.
    pub async fn set_status(
        &self,
        order_id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> anyhow::Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(
            "UPDATE payments
             SET status = $1,
                 paid_at = CASE WHEN $1 = 'PAID' THEN NOW() ELSE paid_at END
             WHERE order_id = $2 AND status = $3
             RETURNING order_id, status, amount_cents, method, paid_at",
        )
        .bind(to.as_str())
        .bind(order_id)
        .bind(from.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payment::try_from).transpose().map_err(Into::into)
    }

    /// Paid revenue for a vendor's delivered orders, net of commission,
    /// minus everything already requested or paid out.
    pub async fn available_balance_cents(
        &self,
        vendor_id: Uuid,
        commission_override_bps: Option<i32>,
    ) -> anyhow::Result<i64> {
        let gross: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(p.amount_cents)
             FROM payments p
             JOIN orders o ON o.id = p.order_id
             WHERE o.vendor_id = $1 AND p.status = 'PAID' AND o.status = 'DELIVERED'",
        )
        .bind(vendor_id)
        .fetch_one(&self.pool)
        .await?;
        let gross = gross.unwrap_or(0);

        let committed: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_cents) FROM payouts
             WHERE vendor_id = $1 AND status IN ('REQUESTED', 'APPROVED', 'PAID')",
        )
        .bind(vendor_id)
        .fetch_one(&self.pool)
        .await?;
        let committed = committed.unwrap_or(0);

        let rate_bps = resolve_commission_bps(commission_override_bps, None);
        let net = gross - commission_cents(gross, rate_bps);

        Ok(net - committed)
    }

    pub async fn request_payout(
        &self,
        vendor_id: Uuid,
        amount_cents: i64,
        note: Option<&str>,
    ) -> anyhow::Result<Payout> {
        let row = sqlx::query_as::<_, PayoutRow>(&format!(
            "INSERT INTO payouts (id, vendor_id, amount_cents, status, note, created_at, updated_at)
             VALUES ($1, $2, $3, 'REQUESTED', $4, NOW(), NOW())
             RETURNING {PAYOUT_COLS}"
        ))
        .bind(Uuid::new_v4())
        .bind(vendor_id)
        .bind(amount_cents)
        .bind(note)
        .fetch_one(&self.pool)
        .await?;

        Payout::try_from(row).map_err(Into::into)
    }

    pub async fn get_payout(&self, payout_id: Uuid) -> anyhow::Result<Option<Payout>> {
        let row = sqlx::query_as::<_, PayoutRow>(&format!(
            "SELECT {PAYOUT_COLS} FROM payouts WHERE id = $1"
        ))
        .bind(payout_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payout::try_from).transpose().map_err(Into::into)
    }

    pub async fn list_payouts(
        &self,
        vendor_id: Option<Uuid>,
        status: Option<PayoutStatus>,
        limit: i64,
    ) -> anyhow::Result<Vec<Payout>> {
        let rows = sqlx::query_as::<_, PayoutRow>(&format!(
            "SELECT {PAYOUT_COLS} FROM payouts
             WHERE ($1::uuid IS NULL OR vendor_id = $1)
               AND ($2::text IS NULL OR status = $2)
             ORDER BY created_at DESC
             LIMIT $3"
        ))
        .bind(vendor_id)
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| Payout::try_from(r).map_err(Into::into))
            .collect()
    }

    /// Persist a validated payout decision plus the owner notification.
    pub async fn apply_payout_decision(
        &self,
        payout: &Payout,
        owner_user_id: Uuid,
        decision: PayoutStatus,
        note: Option<&str>,
    ) -> anyhow::Result<Payout> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, PayoutRow>(&format!(
            "UPDATE payouts
             SET status = $1, note = COALESCE($2, note), updated_at = NOW()
             WHERE id = $3 AND status = $4
             RETURNING {PAYOUT_COLS}"
        ))
        .bind(decision.as_str())
        .bind(note)
        .bind(payout.id)
        .bind(payout.status.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            tx.rollback().await?;
            anyhow::bail!("payout {} was modified concurrently", payout.id);
        };

        let event = PayoutDecided {
            payout_id: payout.id,
            vendor_id: payout.vendor_id,
            owner_user_id,
            decision,
            amount_cents: payout.amount_cents,
        };

        outbox::enqueue(
            &mut tx,
            payout.id,
            PayoutDecided::EVENT_TYPE,
            &serde_json::to_string(&event)?,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            payout_id = %payout.id,
            decision = %decision,
            "Payout decision committed"
        );

        Payout::try_from(updated).map_err(Into::into)
    }
}
