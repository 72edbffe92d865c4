use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Order Events - Outbox Payloads
// ============================================================================
//
// Emitted inside the same transaction as the status write; the notification
// relay decodes them later to fan out admin and customer notifications.
//
// ============================================================================

/// Union type for all order events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Shipped(OrderShipped),
    Delivered(OrderDelivered),
    Cancelled(OrderCancelled),
    Returned(OrderReturned),
}

impl OrderEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Shipped(_) => "OrderShipped",
            OrderEvent::Delivered(_) => "OrderDelivered",
            OrderEvent::Cancelled(_) => "OrderCancelled",
            OrderEvent::Returned(_) => "OrderReturned",
        }
    }

    pub fn order_id(&self) -> Uuid {
        match self {
            OrderEvent::Shipped(e) => e.order_id,
            OrderEvent::Delivered(e) => e.order_id,
            OrderEvent::Cancelled(e) => e.order_id,
            OrderEvent::Returned(e) => e.order_id,
        }
    }

    pub fn customer_id(&self) -> Uuid {
        match self {
            OrderEvent::Shipped(e) => e.customer_id,
            OrderEvent::Delivered(e) => e.customer_id,
            OrderEvent::Cancelled(e) => e.customer_id,
            OrderEvent::Returned(e) => e.customer_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderShipped {
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub customer_id: Uuid,
    pub tracking_partner: String,
    pub tracking_number: String,
    pub shipped_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDelivered {
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub customer_id: Uuid,
    pub delivered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub customer_id: Uuid,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReturned {
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub customer_id: Uuid,
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = OrderEvent::Shipped(OrderShipped {
            order_id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            tracking_partner: "BlueDart".to_string(),
            tracking_number: "BD123".to_string(),
            shipped_at: Utc::now(),
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Shipped\""));
        assert!(json.contains("BD123"));

        let back: OrderEvent = serde_json::from_str(&json).unwrap();
        match back {
            OrderEvent::Shipped(shipped) => assert_eq!(shipped.tracking_number, "BD123"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_event_type_names() {
        let cancelled = OrderEvent::Cancelled(OrderCancelled {
            order_id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            reason: None,
        });
        assert_eq!(cancelled.event_type(), "OrderCancelled");
    }
}
