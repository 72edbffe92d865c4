use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Promotions & Commission / Tax Rules
// ============================================================================
//
// Rates are basis points (1/100th of a percent) so arithmetic stays integral.
//
// ============================================================================

pub const DEFAULT_COMMISSION_BPS: i32 = 1_000; // 10%

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    pub id: Uuid,
    pub code: String,
    pub percent_off_bps: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub active: bool,
}

impl Promotion {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active && self.starts_at <= now && now < self.ends_at
    }

    pub fn discount_cents(&self, amount_cents: i64) -> i64 {
        amount_cents * i64::from(self.percent_off_bps) / 10_000
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionRule {
    pub id: Uuid,
    pub category: String,
    pub rate_bps: i32,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRule {
    pub id: Uuid,
    pub category: String,
    pub region: String,
    pub rate_bps: i32,
    pub active: bool,
}

/// Commission resolution order: vendor override, then the category rule,
/// then the platform default.
pub fn resolve_commission_bps(
    vendor_override_bps: Option<i32>,
    category_rule: Option<&CommissionRule>,
) -> i32 {
    if let Some(bps) = vendor_override_bps {
        return bps;
    }
    if let Some(rule) = category_rule {
        if rule.active {
            return rule.rate_bps;
        }
    }
    DEFAULT_COMMISSION_BPS
}

pub fn commission_cents(amount_cents: i64, rate_bps: i32) -> i64 {
    amount_cents * i64::from(rate_bps) / 10_000
}

#[derive(Debug, thiserror::Error)]
pub enum PromoError {
    #[error("Promotion not found: {0}")]
    NotFound(Uuid),

    #[error("Promotion code cannot be empty")]
    EmptyCode,

    #[error("Rate out of range: {0} bps")]
    RateOutOfRange(i32),

    #[error("Promotion window is inverted (ends before it starts)")]
    InvertedWindow,
}

pub fn validate_rate_bps(rate_bps: i32) -> Result<(), PromoError> {
    if !(0..=10_000).contains(&rate_bps) {
        return Err(PromoError::RateOutOfRange(rate_bps));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn promo(active: bool) -> Promotion {
        let now = Utc::now();
        Promotion {
            id: Uuid::new_v4(),
            code: "LAUNCH10".to_string(),
            percent_off_bps: 1_000,
            starts_at: now - Duration::hours(1),
            ends_at: now + Duration::hours(1),
            active,
        }
    }

    #[test]
    fn test_promotion_window() {
        let p = promo(true);
        assert!(p.is_live(Utc::now()));
        assert!(!p.is_live(Utc::now() + Duration::hours(2)));
        assert!(!promo(false).is_live(Utc::now()));
    }

    #[test]
    fn test_discount_arithmetic() {
        let p = promo(true);
        // 10% of 2350 cents
        assert_eq!(p.discount_cents(2_350), 235);
    }

    #[test]
    fn test_commission_resolution_order() {
        let rule = CommissionRule {
            id: Uuid::new_v4(),
            category: "spices".to_string(),
            rate_bps: 800,
            active: true,
        };

        assert_eq!(resolve_commission_bps(Some(500), Some(&rule)), 500);
        assert_eq!(resolve_commission_bps(None, Some(&rule)), 800);
        assert_eq!(resolve_commission_bps(None, None), DEFAULT_COMMISSION_BPS);

        let inactive = CommissionRule { active: false, ..rule };
        assert_eq!(resolve_commission_bps(None, Some(&inactive)), DEFAULT_COMMISSION_BPS);
    }

    #[test]
    fn test_commission_cents() {
        assert_eq!(commission_cents(10_000, 1_000), 1_000);
        assert_eq!(commission_cents(9_999, 1_000), 999);
    }

    #[test]
    fn test_rate_validation() {
        assert!(validate_rate_bps(0).is_ok());
        assert!(validate_rate_bps(10_000).is_ok());
        assert!(matches!(validate_rate_bps(10_001), Err(PromoError::RateOutOfRange(_))));
        assert!(matches!(validate_rate_bps(-1), Err(PromoError::RateOutOfRange(_))));
    }
}
