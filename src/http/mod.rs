use actix_web::web;
use std::sync::Arc;

use crate::metrics::Metrics;
use crate::shipping::CourierClient;
use crate::store::{
    NotificationStore, OrderStore, OutboxStore, PaymentStore, ProductStore, PromoStore,
    SessionStore, TicketStore, VendorStore,
};

// ============================================================================
// HTTP Layer - JSON API
// ============================================================================
//
// Thin route handlers under /api/v1: validate, query, return JSON. Errors
// flow through ApiError; authentication through the AuthSession extractor.
//
// ============================================================================

pub mod auth;
pub mod error;

mod notifications;
mod ops;
mod orders;
mod payments;
mod products;
mod promos;
mod tickets;
mod vendors;

pub use error::ApiError;

/// Shared handler state, one instance behind web::Data.
pub struct AppState {
    pub orders: OrderStore,
    pub vendors: VendorStore,
    pub products: ProductStore,
    pub payments: PaymentStore,
    pub promos: PromoStore,
    pub tickets: TicketStore,
    pub notifications: NotificationStore,
    pub outbox: OutboxStore,
    pub sessions: SessionStore,
    pub courier: Arc<CourierClient>,
    pub metrics: Arc<Metrics>,
}

/// Mount every route group under /api/v1.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(orders::configure)
            .configure(vendors::configure)
            .configure(products::configure)
            .configure(payments::configure)
            .configure(promos::configure)
            .configure(tickets::configure)
            .configure(notifications::configure)
            .configure(ops::configure),
    );
}

/// Listing endpoints cap their page size here.
pub(crate) fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 50);
        assert_eq!(clamp_limit(Some(10)), 10);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(10_000)), 200);
    }
}
