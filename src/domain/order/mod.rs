// ============================================================================
// Order Domain - Status Workflow
// ============================================================================
//
// Everything order-specific lives here:
// - Status enum with the explicit transition table
// - Order / tracking models
// - Transition commands and their validation
// - Outbox event payloads emitted on each transition
// - Typed errors (OrderError)
//
// ============================================================================

pub mod commands;
pub mod errors;
pub mod events;
pub mod model;
pub mod status;

pub use commands::*;
pub use errors::*;
pub use events::*;
pub use model::*;
pub use status::*;
