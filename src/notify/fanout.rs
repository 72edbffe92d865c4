use crate::domain::notification::{EmailDraft, NotificationDraft, NotificationFanout};
use crate::domain::order::OrderEvent;
use crate::domain::payment::{PayoutDecided, PayoutStatus};
use crate::domain::support::TicketReplied;
use crate::domain::vendor::{KycStatus, VendorKycDecided};

// ============================================================================
// Fan-Out Planning
// ============================================================================

/// Decode an outbox payload into the notifications it owes. Unknown event
/// types are an error so they land in the dead letter table instead of
/// being silently swallowed.
pub fn plan_fanout(event_type: &str, payload: &str) -> anyhow::Result<NotificationFanout> {
    match event_type {
        "OrderShipped" | "OrderDelivered" | "OrderCancelled" | "OrderReturned" => {
            let event: OrderEvent = serde_json::from_str(payload)?;
            Ok(order_fanout(&event))
        }
        VendorKycDecided::EVENT_TYPE => {
            let event: VendorKycDecided = serde_json::from_str(payload)?;
            Ok(kyc_fanout(&event))
        }
        PayoutDecided::EVENT_TYPE => {
            let event: PayoutDecided = serde_json::from_str(payload)?;
            Ok(payout_fanout(&event))
        }
        TicketReplied::EVENT_TYPE => {
            let event: TicketReplied = serde_json::from_str(payload)?;
            Ok(ticket_fanout(&event))
        }
        other => anyhow::bail!("unknown outbox event type: {other}"),
    }
}

fn order_fanout(event: &OrderEvent) -> NotificationFanout {
    let order_id = event.order_id();
    let customer_id = event.customer_id();

    let (title, body) = match event {
        OrderEvent::Shipped(e) => (
            "Order shipped".to_string(),
            format!(
                "Order {} is on its way via {} (tracking {}).",
                order_id, e.tracking_partner, e.tracking_number
            ),
        ),
        OrderEvent::Delivered(_) => (
            "Order delivered".to_string(),
            format!("Order {} was delivered.", order_id),
        ),
        OrderEvent::Cancelled(e) => (
            "Order cancelled".to_string(),
            match &e.reason {
                Some(reason) => format!("Order {} was cancelled: {}.", order_id, reason),
                None => format!("Order {} was cancelled.", order_id),
            },
        ),
        OrderEvent::Returned(e) => (
            "Order returned".to_string(),
            match &e.reason {
                Some(reason) => format!("Order {} was returned: {}.", order_id, reason),
                None => format!("Order {} was returned.", order_id),
            },
        ),
    };

    NotificationFanout {
        admin_broadcast: Some(NotificationDraft {
            recipient_user_id: None,
            title: format!("[{}] {}", event.event_type(), order_id),
            body: body.clone(),
        }),
        user: Some(NotificationDraft {
            recipient_user_id: Some(customer_id),
            title: title.clone(),
            body: body.clone(),
        }),
        email: Some(EmailDraft {
            to_user_id: customer_id,
            subject: title,
            body,
        }),
    }
}

fn kyc_fanout(event: &VendorKycDecided) -> NotificationFanout {
    let (title, body) = match event.decision {
        KycStatus::Approved => (
            "Vendor application approved".to_string(),
            "Your vendor application was approved. You can start listing products.".to_string(),
        ),
        KycStatus::Rejected => (
            "Vendor application rejected".to_string(),
            match &event.note {
                Some(note) => format!("Your vendor application was rejected: {}.", note),
                None => "Your vendor application was rejected.".to_string(),
            },
        ),
        KycStatus::Suspended => (
            "Vendor account suspended".to_string(),
            match &event.note {
                Some(note) => format!("Your vendor account was suspended: {}.", note),
                None => "Your vendor account was suspended.".to_string(),
            },
        ),
        KycStatus::Applied => (
            "Vendor application received".to_string(),
            "Your vendor application is under review.".to_string(),
        ),
    };

    NotificationFanout {
        admin_broadcast: None,
        user: Some(NotificationDraft {
            recipient_user_id: Some(event.owner_user_id),
            title: title.clone(),
            body: body.clone(),
        }),
        email: Some(EmailDraft {
            to_user_id: event.owner_user_id,
            subject: title,
            body,
        }),
    }
}

fn payout_fanout(event: &PayoutDecided) -> NotificationFanout {
    let amount = format_cents(event.amount_cents);
    let (title, body) = match event.decision {
        PayoutStatus::Approved => (
            "Payout approved".to_string(),
            format!("Your payout request for {} was approved.", amount),
        ),
        PayoutStatus::Rejected => (
            "Payout rejected".to_string(),
            format!("Your payout request for {} was rejected.", amount),
        ),
        PayoutStatus::Paid => (
            "Payout sent".to_string(),
            format!("Your payout of {} has been sent.", amount),
        ),
        PayoutStatus::Requested => (
            "Payout requested".to_string(),
            format!("A payout for {} was requested.", amount),
        ),
    };

    NotificationFanout {
        admin_broadcast: None,
        user: Some(NotificationDraft {
            recipient_user_id: Some(event.owner_user_id),
            title: title.clone(),
            body: body.clone(),
        }),
        email: Some(EmailDraft {
            to_user_id: event.owner_user_id,
            subject: title,
            body,
        }),
    }
}

fn ticket_fanout(event: &TicketReplied) -> NotificationFanout {
    let title = "Support replied to your ticket".to_string();
    let body = format!("There is a new reply on \"{}\".", event.subject);

    NotificationFanout {
        admin_broadcast: None,
        user: Some(NotificationDraft {
            recipient_user_id: Some(event.opener_user_id),
            title: title.clone(),
            body: body.clone(),
        }),
        email: Some(EmailDraft {
            to_user_id: event.opener_user_id,
            subject: title,
            body,
        }),
    }
}

fn format_cents(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, (cents % 100).abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderShipped;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_shipped_fanout_targets_admins_and_customer() {
        let customer_id = Uuid::new_v4();
        let event = OrderEvent::Shipped(OrderShipped {
            order_id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            customer_id,
            tracking_partner: "BlueDart".to_string(),
            tracking_number: "BD123".to_string(),
            shipped_at: Utc::now(),
        });
        let payload = serde_json::to_string(&event).unwrap();

        let fanout = plan_fanout("OrderShipped", &payload).unwrap();

        let broadcast = fanout.admin_broadcast.unwrap();
        assert_eq!(broadcast.recipient_user_id, None);
        assert!(broadcast.body.contains("BD123"));

        let user = fanout.user.unwrap();
        assert_eq!(user.recipient_user_id, Some(customer_id));

        let email = fanout.email.unwrap();
        assert_eq!(email.to_user_id, customer_id);
        assert!(email.body.contains("BlueDart"));
    }

    #[test]
    fn test_kyc_rejection_carries_note() {
        let owner = Uuid::new_v4();
        let event = VendorKycDecided {
            vendor_id: Uuid::new_v4(),
            owner_user_id: owner,
            decision: KycStatus::Rejected,
            note: Some("document illegible".to_string()),
        };
        let payload = serde_json::to_string(&event).unwrap();

        let fanout = plan_fanout(VendorKycDecided::EVENT_TYPE, &payload).unwrap();
        assert!(fanout.admin_broadcast.is_none());
        assert!(fanout.user.unwrap().body.contains("document illegible"));
    }

    #[test]
    fn test_payout_amount_formatting() {
        let event = PayoutDecided {
            payout_id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            owner_user_id: Uuid::new_v4(),
            decision: PayoutStatus::Paid,
            amount_cents: 123_450,
        };
        let payload = serde_json::to_string(&event).unwrap();

        let fanout = plan_fanout(PayoutDecided::EVENT_TYPE, &payload).unwrap();
        assert!(fanout.user.unwrap().body.contains("1234.50"));
    }

    #[test]
    fn test_unknown_event_type_is_an_error() {
        assert!(plan_fanout("SomethingElse", "{}").is_err());
    }

    #[test]
    fn test_garbled_payload_is_an_error() {
        assert!(plan_fanout("OrderShipped", "not json").is_err());
    }
}
