// ============================================================================
// Store Layer - sqlx Repositories
// ============================================================================
//
// One repository per aggregate, all speaking plain SQL over a shared PgPool.
// Multi-step writes (status transition + tracking append + outbox enqueue)
// are committed in a single transaction; nothing here dispatches
// notifications inline.
//
// ============================================================================

pub mod notifications;
pub mod orders;
pub mod outbox;
pub mod payments;
pub mod products;
pub mod promos;
pub mod sessions;
pub mod tickets;
pub mod tokens;
pub mod vendors;

pub use notifications::NotificationStore;
pub use orders::OrderStore;
pub use outbox::{DeadLetterRecord, OutboxMessage, OutboxStore};
pub use payments::PaymentStore;
pub use products::ProductStore;
pub use promos::PromoStore;
pub use sessions::SessionStore;
pub use tickets::TicketStore;
pub use tokens::ApiTokenStore;
pub use vendors::VendorStore;
