use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Payment & Payout Domain
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, PaymentError> {
        match s {
            "UNPAID" => Ok(PaymentStatus::Unpaid),
            "PAID" => Ok(PaymentStatus::Paid),
            "REFUNDED" => Ok(PaymentStatus::Refunded),
            other => Err(PaymentError::UnknownStatus(other.to_string())),
        }
    }

    pub fn can_transition_to(&self, target: PaymentStatus) -> bool {
        matches!(
            (self, target),
            (PaymentStatus::Unpaid, PaymentStatus::Paid)
                | (PaymentStatus::Paid, PaymentStatus::Refunded)
        )
    }
}

/// One-to-one with an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub order_id: Uuid,
    pub status: PaymentStatus,
    pub amount_cents: i64,
    pub method: String,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    Requested,
    Approved,
    Rejected,
    Paid,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Requested => "REQUESTED",
            PayoutStatus::Approved => "APPROVED",
            PayoutStatus::Rejected => "REJECTED",
            PayoutStatus::Paid => "PAID",
        }
    }

    pub fn parse(s: &str) -> Result<Self, PaymentError> {
        match s {
            "REQUESTED" => Ok(PayoutStatus::Requested),
            "APPROVED" => Ok(PayoutStatus::Approved),
            "REJECTED" => Ok(PayoutStatus::Rejected),
            "PAID" => Ok(PayoutStatus::Paid),
            other => Err(PaymentError::UnknownStatus(other.to_string())),
        }
    }

    pub fn can_transition_to(&self, target: PayoutStatus) -> bool {
        matches!(
            (self, target),
            (PayoutStatus::Requested, PayoutStatus::Approved)
                | (PayoutStatus::Requested, PayoutStatus::Rejected)
                | (PayoutStatus::Approved, PayoutStatus::Paid)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub amount_cents: i64,
    pub status: PayoutStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payout {
    pub fn decide(&self, target: PayoutStatus) -> Result<(), PaymentError> {
        if !self.status.can_transition_to(target) {
            return Err(PaymentError::IllegalPayoutTransition {
                from: self.status,
                to: target,
            });
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment not found for order {0}")]
    NotFound(Uuid),

    #[error("Payout not found: {0}")]
    PayoutNotFound(Uuid),

    #[error("Illegal payment transition: {from} -> {to}")]
    IllegalTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("Illegal payout transition: {from} -> {to}")]
    IllegalPayoutTransition {
        from: PayoutStatus,
        to: PayoutStatus,
    },

    #[error("Payout amount {requested_cents} exceeds available balance {available_cents}")]
    InsufficientBalance {
        requested_cents: i64,
        available_cents: i64,
    },

    #[error("Payout amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    #[error("Unknown payment status: {0}")]
    UnknownStatus(String),
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbox payload emitted when an admin decides a payout request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutDecided {
    pub payout_id: Uuid,
    pub vendor_id: Uuid,
    pub owner_user_id: Uuid,
    pub decision: PayoutStatus,
    pub amount_cents: i64,
}

impl PayoutDecided {
    pub const EVENT_TYPE: &'static str = "PayoutDecided";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_transitions() {
        assert!(PaymentStatus::Unpaid.can_transition_to(PaymentStatus::Paid));
        assert!(PaymentStatus::Paid.can_transition_to(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Unpaid.can_transition_to(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Refunded.can_transition_to(PaymentStatus::Paid));
    }

    #[test]
    fn test_payout_lifecycle() {
        assert!(PayoutStatus::Requested.can_transition_to(PayoutStatus::Approved));
        assert!(PayoutStatus::Requested.can_transition_to(PayoutStatus::Rejected));
        assert!(PayoutStatus::Approved.can_transition_to(PayoutStatus::Paid));
        assert!(!PayoutStatus::Rejected.can_transition_to(PayoutStatus::Paid));
        assert!(!PayoutStatus::Paid.can_transition_to(PayoutStatus::Requested));
    }

    #[test]
    fn test_payout_decide() {
        let payout = Payout {
            id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            amount_cents: 10_000,
            status: PayoutStatus::Requested,
            note: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(payout.decide(PayoutStatus::Approved).is_ok());
        assert!(matches!(
            payout.decide(PayoutStatus::Paid),
            Err(PaymentError::IllegalPayoutTransition { .. })
        ));
    }
}
