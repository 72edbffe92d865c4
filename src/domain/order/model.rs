use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::OrderStatus;

// ============================================================================
// Order Models
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub customer_id: Uuid,
    pub status: OrderStatus,

    // Monetary amounts are integer cents
    pub subtotal_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,

    pub tracking_partner: Option<String>,
    pub tracking_number: Option<String>,

    // Bumped on every transition; the CAS guard in the store uses it too
    pub version: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only tracking log entry. Created on every status change and on
/// every courier poll that reports movement; never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTrackingEntry {
    pub id: Uuid,
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub message: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_order(status: OrderStatus) -> Order {
        Order {
            id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            status,
            subtotal_cents: 4_500,
            shipping_cents: 500,
            total_cents: 5_000,
            tracking_partner: None,
            tracking_number: None,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_order_serialization() {
        let order = sample_order(OrderStatus::Pending);
        let json = serde_json::to_string(&order).unwrap();
        assert!(json.contains("\"PENDING\""));

        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, order.id);
        assert_eq!(back.status, OrderStatus::Pending);
        assert_eq!(back.total_cents, 5_000);
    }
}
