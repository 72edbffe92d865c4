// ============================================================================
// Actors Module
// ============================================================================
//
// Actor-based infrastructure for the background side of the system.
//
// Structure:
// - core/           - Abstract health types shared by the workers
// - infrastructure/ - Concrete workers (outbox relay, tracking poller,
//                     health monitor) under one coordinator
//
// Note: Domain logic (order transitions, KYC decisions, ...) lives in the
//       domain and store layers; actors are reserved for scheduled and
//       fire-and-forget infrastructure work.
//
// ============================================================================

// Private module declarations
mod core;
mod infrastructure;

// Re-export only what's needed in the public API
pub use infrastructure::{CoordinatorActor, WorkerSettings};
