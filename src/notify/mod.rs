// ============================================================================
// Notification Fan-Out
// ============================================================================
//
// The outbox relay hands each drained message to `plan_fanout`, which turns
// the event payload into notification drafts and an optional email. Actual
// writes and sends stay in the relay so this stays pure and testable.
//
// ============================================================================

mod fanout;
mod mailer;

pub use fanout::plan_fanout;
pub use mailer::{Mailer, SmtpMailer};
