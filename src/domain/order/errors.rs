use uuid::Uuid;

use super::status::OrderStatus;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Order {order_id} does not belong to vendor {vendor_id}")]
    VendorMismatch { order_id: Uuid, vendor_id: Uuid },

    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order is already in status {0}")]
    AlreadyInStatus(OrderStatus),

    #[error("Shipping requires a tracking partner and tracking number")]
    MissingTrackingInfo,

    #[error("Unknown order status: {0}")]
    UnknownStatus(String),

    #[error("Order was modified concurrently, transition lost")]
    ConcurrentModification,
}
