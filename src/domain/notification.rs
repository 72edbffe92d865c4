use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Notifications
// ============================================================================

/// A persisted notification. `recipient_user_id = None` is the admin
/// broadcast channel: every admin client reads the same row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_user_id: Option<Uuid>,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// What the relay writes for one outbox message: at most one broadcast row
/// and one user row, plus an optional plain-text email.
#[derive(Debug, Clone)]
pub struct NotificationFanout {
    pub admin_broadcast: Option<NotificationDraft>,
    pub user: Option<NotificationDraft>,
    pub email: Option<EmailDraft>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub recipient_user_id: Option<Uuid>,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailDraft {
    pub to_user_id: Uuid,
    pub subject: String,
    pub body: String,
}
