// ============================================================================
// Infrastructure Actors
// ============================================================================

mod coordinator;
mod health_monitor;
mod outbox_relay;
mod tracking_poller;

pub use coordinator::{CoordinatorActor, WorkerSettings};
