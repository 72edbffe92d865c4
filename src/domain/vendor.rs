use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Vendor Domain - Onboarding & KYC
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycStatus {
    Applied,
    Approved,
    Rejected,
    Suspended,
}

impl KycStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KycStatus::Applied => "APPLIED",
            KycStatus::Approved => "APPROVED",
            KycStatus::Rejected => "REJECTED",
            KycStatus::Suspended => "SUSPENDED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, VendorError> {
        match s {
            "APPLIED" => Ok(KycStatus::Applied),
            "APPROVED" => Ok(KycStatus::Approved),
            "REJECTED" => Ok(KycStatus::Rejected),
            "SUSPENDED" => Ok(KycStatus::Suspended),
            other => Err(VendorError::UnknownKycStatus(other.to_string())),
        }
    }

    /// A rejected application is terminal; a suspended vendor can be
    /// reinstated after review.
    pub fn can_transition_to(&self, target: KycStatus) -> bool {
        matches!(
            (self, target),
            (KycStatus::Applied, KycStatus::Approved)
                | (KycStatus::Applied, KycStatus::Rejected)
                | (KycStatus::Approved, KycStatus::Suspended)
                | (KycStatus::Suspended, KycStatus::Approved)
        )
    }
}

impl std::fmt::Display for KycStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub display_name: String,
    pub contact_email: String,
    pub kyc_status: KycStatus,
    pub kyc_note: Option<String>,
    /// Overrides category commission rules when set (basis points)
    pub commission_override_bps: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vendor {
    pub fn kyc_transition(&self, target: KycStatus) -> Result<(), VendorError> {
        if self.kyc_status == target {
            return Err(VendorError::AlreadyInStatus(target));
        }
        if !self.kyc_status.can_transition_to(target) {
            return Err(VendorError::IllegalKycTransition {
                from: self.kyc_status,
                to: target,
            });
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.kyc_status == KycStatus::Approved
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VendorError {
    #[error("Vendor not found: {0}")]
    NotFound(Uuid),

    #[error("Illegal KYC transition: {from} -> {to}")]
    IllegalKycTransition { from: KycStatus, to: KycStatus },

    #[error("Vendor is already in status {0}")]
    AlreadyInStatus(KycStatus),

    #[error("Unknown KYC status: {0}")]
    UnknownKycStatus(String),
}

/// Outbox payload emitted when an admin decides a KYC application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorKycDecided {
    pub vendor_id: Uuid,
    pub owner_user_id: Uuid,
    pub decision: KycStatus,
    pub note: Option<String>,
}

impl VendorKycDecided {
    pub const EVENT_TYPE: &'static str = "VendorKycDecided";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor(status: KycStatus) -> Vendor {
        Vendor {
            id: Uuid::new_v4(),
            owner_user_id: Uuid::new_v4(),
            display_name: "Acme Spices".to_string(),
            contact_email: "ops@acmespices.test".to_string(),
            kyc_status: status,
            kyc_note: None,
            commission_override_bps: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_applied_can_be_decided() {
        assert!(vendor(KycStatus::Applied).kyc_transition(KycStatus::Approved).is_ok());
        assert!(vendor(KycStatus::Applied).kyc_transition(KycStatus::Rejected).is_ok());
    }

    #[test]
    fn test_rejected_is_terminal() {
        let v = vendor(KycStatus::Rejected);
        assert!(v.kyc_transition(KycStatus::Approved).is_err());
        assert!(v.kyc_transition(KycStatus::Suspended).is_err());
    }

    #[test]
    fn test_suspension_round_trip() {
        assert!(vendor(KycStatus::Approved).kyc_transition(KycStatus::Suspended).is_ok());
        assert!(vendor(KycStatus::Suspended).kyc_transition(KycStatus::Approved).is_ok());
    }

    #[test]
    fn test_only_approved_vendors_are_active() {
        assert!(vendor(KycStatus::Approved).is_active());
        assert!(!vendor(KycStatus::Suspended).is_active());
        assert!(!vendor(KycStatus::Applied).is_active());
    }

    #[test]
    fn test_same_status_rejected() {
        let err = vendor(KycStatus::Approved)
            .kyc_transition(KycStatus::Approved)
            .unwrap_err();
        assert!(matches!(err, VendorError::AlreadyInStatus(KycStatus::Approved)));
    }
}
