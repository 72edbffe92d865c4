use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::order::{
    GeoPoint, Order, OrderError, OrderStatus, OrderTrackingEntry, Transition,
};
use crate::store::outbox;

// ============================================================================
// Order Store
// ============================================================================
//
// Orders are never deleted, only transitioned. `apply_transition` is the one
// write path for status changes: a compare-and-swap on the current status,
// the append-only tracking row and the outbox enqueue all commit in the same
// transaction, so a lost race or a failed insert leaves no partial state.
//
// ============================================================================

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    vendor_id: Uuid,
    customer_id: Uuid,
    status: String,
    subtotal_cents: i64,
    shipping_cents: i64,
    total_cents: i64,
    tracking_partner: Option<String>,
    tracking_number: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = OrderError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            vendor_id: row.vendor_id,
            customer_id: row.customer_id,
            status: OrderStatus::parse(&row.status)?,
            subtotal_cents: row.subtotal_cents,
            shipping_cents: row.shipping_cents,
            total_cents: row.total_cents,
            tracking_partner: row.tracking_partner,
            tracking_number: row.tracking_number,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TrackingRow {
    id: Uuid,
    order_id: Uuid,
    status: String,
    message: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TrackingRow> for OrderTrackingEntry {
    type Error = OrderError;

    fn try_from(row: TrackingRow) -> Result<Self, Self::Error> {
        Ok(OrderTrackingEntry {
            id: row.id,
            order_id: row.order_id,
            status: OrderStatus::parse(&row.status)?,
            message: row.message,
            latitude: row.latitude,
            longitude: row.longitude,
            created_at: row.created_at,
        })
    }
}

#[derive(Clone)]
pub struct OrderStore {
    pool: PgPool,
}

impl OrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Customer checkout: the PENDING order and its UNPAID payment row are
    /// born in the same transaction.
    pub async fn create(
        &self,
        vendor_id: Uuid,
        customer_id: Uuid,
        subtotal_cents: i64,
        shipping_cents: i64,
        payment_method: &str,
    ) -> anyhow::Result<Order> {
        let total_cents = subtotal_cents + shipping_cents;
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(
            "INSERT INTO orders (id, vendor_id, customer_id, status, subtotal_cents,
                                 shipping_cents, total_cents, version, created_at, updated_at)
             VALUES ($1, $2, $3, 'PENDING', $4, $5, $6, 1, NOW(), NOW())
             RETURNING id, vendor_id, customer_id, status, subtotal_cents, shipping_cents,
                       total_cents, tracking_partner, tracking_number, version,
                       created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(vendor_id)
        .bind(customer_id)
        .bind(subtotal_cents)
        .bind(shipping_cents)
        .bind(total_cents)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO payments (order_id, status, amount_cents, method)
             VALUES ($1, 'UNPAID', $2, $3)",
        )
        .bind(row.id)
        .bind(total_cents)
        .bind(payment_method)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(order_id = %row.id, vendor_id = %vendor_id, "Order created");

        Order::try_from(row).map_err(Into::into)
    }

    pub async fn get(&self, order_id: Uuid) -> anyhow::Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT id, vendor_id, customer_id, status, subtotal_cents, shipping_cents,
                    total_cents, tracking_partner, tracking_number, version,
                    created_at, updated_at
             FROM orders WHERE id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose().map_err(Into::into)
    }

    pub async fn list(
        &self,
        vendor_id: Option<Uuid>,
        status: Option<OrderStatus>,
        limit: i64,
    ) -> anyhow::Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, vendor_id, customer_id, status, subtotal_cents, shipping_cents,
                    total_cents, tracking_partner, tracking_number, version,
                    created_at, updated_at
             FROM orders
             WHERE ($1::uuid IS NULL OR vendor_id = $1)
               AND ($2::text IS NULL OR status = $2)
             ORDER BY created_at DESC
             LIMIT $3",
        )
        .bind(vendor_id)
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| Order::try_from(r).map_err(Into::into))
            .collect()
    }

    /// Shipped orders carrying a tracking number, for the courier poller.
    pub async fn list_shipped_with_tracking(&self, limit: i64) -> anyhow::Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, vendor_id, customer_id, status, subtotal_cents, shipping_cents,
                    total_cents, tracking_partner, tracking_number, version,
                    created_at, updated_at
             FROM orders
             WHERE status = 'SHIPPED' AND tracking_number IS NOT NULL
             ORDER BY updated_at ASC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| Order::try_from(r).map_err(Into::into))
            .collect()
    }

    /// Commit a validated transition atomically. The status column acts as
    /// the CAS guard: when another request already moved the order, zero
    /// rows match and the whole transaction rolls back untouched.
    pub async fn apply_transition(&self, transition: &Transition) -> anyhow::Result<Order> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, OrderRow>(
            "UPDATE orders
             SET status = $1,
                 tracking_partner = $2,
                 tracking_number = $3,
                 version = version + 1,
                 updated_at = NOW()
             WHERE id = $4 AND status = $5
             RETURNING id, vendor_id, customer_id, status, subtotal_cents, shipping_cents,
                       total_cents, tracking_partner, tracking_number, version,
                       created_at, updated_at",
        )
        .bind(transition.to.as_str())
        .bind(&transition.tracking_partner)
        .bind(&transition.tracking_number)
        .bind(transition.order_id)
        .bind(transition.from.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            tx.rollback().await?;
            return Err(OrderError::ConcurrentModification.into());
        };

        sqlx::query(
            "INSERT INTO order_tracking (id, order_id, status, message, latitude, longitude, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, NOW())",
        )
        .bind(Uuid::new_v4())
        .bind(transition.order_id)
        .bind(transition.to.as_str())
        .bind(&transition.log_message)
        .bind(transition.location.map(|p| p.latitude))
        .bind(transition.location.map(|p| p.longitude))
        .execute(&mut *tx)
        .await?;

        outbox::enqueue(
            &mut tx,
            transition.order_id,
            transition.event.event_type(),
            &serde_json::to_string(&transition.event)?,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %transition.order_id,
            from = %transition.from,
            to = %transition.to,
            "Order transition committed"
        );

        Order::try_from(updated).map_err(Into::into)
    }

    /// Append a courier-reported tracking event without touching the order
    /// row. Used by the tracking poller for intermediate movement updates.
    pub async fn append_tracking(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        message: &str,
        location: Option<GeoPoint>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO order_tracking (id, order_id, status, message, latitude, longitude, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, NOW())",
        )
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(status.as_str())
        .bind(message)
        .bind(location.map(|p| p.latitude))
        .bind(location.map(|p| p.longitude))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn tracking_history(
        &self,
        order_id: Uuid,
    ) -> anyhow::Result<Vec<OrderTrackingEntry>> {
        let rows = sqlx::query_as::<_, TrackingRow>(
            "SELECT id, order_id, status, message, latitude, longitude, created_at
             FROM order_tracking
             WHERE order_id = $1
             ORDER BY created_at ASC",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| OrderTrackingEntry::try_from(r).map_err(Into::into))
            .collect()
    }

    /// Latest tracking row with the given message, used by the poller to
    /// avoid re-appending courier events it already recorded.
    pub async fn has_tracking_message(
        &self,
        order_id: Uuid,
        message: &str,
    ) -> anyhow::Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM order_tracking WHERE order_id = $1 AND message = $2",
        )
        .bind(order_id)
        .bind(message)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}

// ============================================================================
// Integration Test Notes
// ============================================================================
//
// The store's behavior against a live PostgreSQL is exercised in integration
// environments, not here:
//
// - apply_transition commits order update + tracking row + outbox message
//   atomically, and rolls all three back on any failure
// - apply_transition returns ConcurrentModification when the CAS misses
// - tracking_history returns rows in insertion order
// - list filters compose (vendor + status)
//
// Unit coverage for the transition rules themselves lives in
// domain/order/commands.rs, which this store trusts.
//
// ============================================================================
