// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Domain-specific models, state machines and typed errors, separate from the
// storage and HTTP layers. The order module carries the full transition
// machinery; the remaining modules are the thin CRUD models the admin API
// manages.
//
// ============================================================================

pub mod catalog;
pub mod notification;
pub mod order;
pub mod payment;
pub mod promo;
pub mod support;
pub mod vendor;
