use chrono::Utc;
use uuid::Uuid;

use super::errors::OrderError;
use super::events::{
    OrderCancelled, OrderDelivered, OrderEvent, OrderReturned, OrderShipped,
};
use super::model::{GeoPoint, Order};
use super::status::OrderStatus;

// ============================================================================
// Status Change Command
// ============================================================================
//
// A requested transition, validated against the current order before any
// write happens. `plan` is the single place that decides whether a move is
// legal; the store then commits the resulting Transition atomically.
//
// ============================================================================

/// Who is asking for the transition
#[derive(Debug, Clone, PartialEq)]
pub enum OrderActor {
    Admin,
    Vendor(Uuid),
    /// Background jobs (courier tracking poller)
    System,
}

#[derive(Debug, Clone)]
pub struct StatusChange {
    pub target: OrderStatus,
    pub tracking_partner: Option<String>,
    pub tracking_number: Option<String>,
    pub note: Option<String>,
    pub location: Option<GeoPoint>,
}

/// A validated transition, ready to persist.
#[derive(Debug, Clone)]
pub struct Transition {
    pub order_id: Uuid,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub tracking_partner: Option<String>,
    pub tracking_number: Option<String>,
    pub log_message: String,
    pub location: Option<GeoPoint>,
    pub event: OrderEvent,
}

impl StatusChange {
    pub fn plan(&self, order: &Order, actor: &OrderActor) -> Result<Transition, OrderError> {
        if let OrderActor::Vendor(vendor_id) = actor {
            if *vendor_id != order.vendor_id {
                return Err(OrderError::VendorMismatch {
                    order_id: order.id,
                    vendor_id: *vendor_id,
                });
            }
        }

        if self.target == OrderStatus::Shipped
            && (self.tracking_partner.is_none() || self.tracking_number.is_none())
        {
            return Err(OrderError::MissingTrackingInfo);
        }

        if order.status == self.target {
            return Err(OrderError::AlreadyInStatus(self.target));
        }

        if !order.status.can_transition_to(self.target) {
            return Err(OrderError::IllegalTransition {
                from: order.status,
                to: self.target,
            });
        }

        let occurred_at = Utc::now();

        let event = match self.target {
            OrderStatus::Shipped => OrderEvent::Shipped(OrderShipped {
                order_id: order.id,
                vendor_id: order.vendor_id,
                customer_id: order.customer_id,
                tracking_partner: self.tracking_partner.clone().unwrap_or_default(),
                tracking_number: self.tracking_number.clone().unwrap_or_default(),
                shipped_at: occurred_at,
            }),
            OrderStatus::Delivered => OrderEvent::Delivered(OrderDelivered {
                order_id: order.id,
                vendor_id: order.vendor_id,
                customer_id: order.customer_id,
                delivered_at: occurred_at,
            }),
            OrderStatus::Cancelled => OrderEvent::Cancelled(OrderCancelled {
                order_id: order.id,
                vendor_id: order.vendor_id,
                customer_id: order.customer_id,
                reason: self.note.clone(),
            }),
            OrderStatus::Returned => OrderEvent::Returned(OrderReturned {
                order_id: order.id,
                vendor_id: order.vendor_id,
                customer_id: order.customer_id,
                reason: self.note.clone(),
            }),
            // Nothing transitions back to Pending; the table above rejects it
            OrderStatus::Pending => {
                return Err(OrderError::IllegalTransition {
                    from: order.status,
                    to: self.target,
                })
            }
        };

        Ok(Transition {
            order_id: order.id,
            from: order.status,
            to: self.target,
            tracking_partner: if self.target == OrderStatus::Shipped {
                self.tracking_partner.clone()
            } else {
                order.tracking_partner.clone()
            },
            tracking_number: if self.target == OrderStatus::Shipped {
                self.tracking_number.clone()
            } else {
                order.tracking_number.clone()
            },
            log_message: self.log_message(),
            location: self.location,
            event,
        })
    }

    fn log_message(&self) -> String {
        let mut message = match self.target {
            OrderStatus::Shipped => format!(
                "Shipped via {} ({})",
                self.tracking_partner.as_deref().unwrap_or("unknown"),
                self.tracking_number.as_deref().unwrap_or("unknown"),
            ),
            OrderStatus::Delivered => "Order delivered".to_string(),
            OrderStatus::Cancelled => "Order cancelled".to_string(),
            OrderStatus::Returned => "Order returned".to_string(),
            OrderStatus::Pending => "Order pending".to_string(),
        };

        if let Some(note) = &self.note {
            message.push_str(": ");
            message.push_str(note);
        }

        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn order_with(status: OrderStatus, vendor_id: Uuid) -> Order {
        Order {
            id: Uuid::new_v4(),
            vendor_id,
            customer_id: Uuid::new_v4(),
            status,
            subtotal_cents: 1_000,
            shipping_cents: 200,
            total_cents: 1_200,
            tracking_partner: None,
            tracking_number: None,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ship_change(partner: &str, number: &str) -> StatusChange {
        StatusChange {
            target: OrderStatus::Shipped,
            tracking_partner: Some(partner.to_string()),
            tracking_number: Some(number.to_string()),
            note: None,
            location: None,
        }
    }

    #[test]
    fn test_ship_produces_tracking_message_with_number() {
        let vendor_id = Uuid::new_v4();
        let order = order_with(OrderStatus::Pending, vendor_id);

        let transition = ship_change("BlueDart", "BD123")
            .plan(&order, &OrderActor::Vendor(vendor_id))
            .unwrap();

        assert_eq!(transition.from, OrderStatus::Pending);
        assert_eq!(transition.to, OrderStatus::Shipped);
        assert!(transition.log_message.contains("BD123"));
        assert_eq!(transition.tracking_partner.as_deref(), Some("BlueDart"));
        assert!(matches!(transition.event, OrderEvent::Shipped(_)));
    }

    #[test]
    fn test_vendor_mismatch_is_rejected() {
        let order = order_with(OrderStatus::Pending, Uuid::new_v4());
        let stranger = Uuid::new_v4();

        let err = ship_change("BlueDart", "BD123")
            .plan(&order, &OrderActor::Vendor(stranger))
            .unwrap_err();

        assert!(matches!(err, OrderError::VendorMismatch { .. }));
    }

    #[test]
    fn test_admin_may_act_on_any_order() {
        let order = order_with(OrderStatus::Pending, Uuid::new_v4());
        let result = ship_change("BlueDart", "BD123").plan(&order, &OrderActor::Admin);
        assert!(result.is_ok());
    }

    #[test]
    fn test_ship_without_tracking_info_is_rejected() {
        let vendor_id = Uuid::new_v4();
        let order = order_with(OrderStatus::Pending, vendor_id);

        let change = StatusChange {
            target: OrderStatus::Shipped,
            tracking_partner: None,
            tracking_number: None,
            note: None,
            location: None,
        };

        let err = change.plan(&order, &OrderActor::Vendor(vendor_id)).unwrap_err();
        assert!(matches!(err, OrderError::MissingTrackingInfo));
    }

    #[test]
    fn test_delivered_cannot_be_reshipped() {
        let order = order_with(OrderStatus::Delivered, Uuid::new_v4());

        let err = ship_change("BlueDart", "BD123")
            .plan(&order, &OrderActor::Admin)
            .unwrap_err();

        assert!(matches!(
            err,
            OrderError::IllegalTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Shipped,
            }
        ));
    }

    #[test]
    fn test_same_status_is_reported_distinctly() {
        let order = order_with(OrderStatus::Cancelled, Uuid::new_v4());

        let change = StatusChange {
            target: OrderStatus::Cancelled,
            tracking_partner: None,
            tracking_number: None,
            note: None,
            location: None,
        };

        let err = change.plan(&order, &OrderActor::Admin).unwrap_err();
        assert!(matches!(err, OrderError::AlreadyInStatus(OrderStatus::Cancelled)));
    }

    #[test]
    fn test_cancel_note_lands_in_log_and_event() {
        let vendor_id = Uuid::new_v4();
        let order = order_with(OrderStatus::Pending, vendor_id);

        let change = StatusChange {
            target: OrderStatus::Cancelled,
            tracking_partner: None,
            tracking_number: None,
            note: Some("customer request".to_string()),
            location: None,
        };

        let transition = change.plan(&order, &OrderActor::Vendor(vendor_id)).unwrap();
        assert!(transition.log_message.contains("customer request"));
        match transition.event {
            OrderEvent::Cancelled(ref cancelled) => {
                assert_eq!(cancelled.reason.as_deref(), Some("customer request"));
            }
            ref other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_system_actor_can_deliver_shipped_order() {
        let order = order_with(OrderStatus::Shipped, Uuid::new_v4());

        let change = StatusChange {
            target: OrderStatus::Delivered,
            tracking_partner: None,
            tracking_number: None,
            note: Some("courier confirmed delivery".to_string()),
            location: None,
        };

        let transition = change.plan(&order, &OrderActor::System).unwrap();
        assert_eq!(transition.to, OrderStatus::Delivered);
        assert!(matches!(transition.event, OrderEvent::Delivered(_)));
    }
}
