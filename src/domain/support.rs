use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Support Tickets
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Open,
    Answered,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "OPEN",
            TicketStatus::Answered => "ANSWERED",
            TicketStatus::Closed => "CLOSED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, SupportError> {
        match s {
            "OPEN" => Ok(TicketStatus::Open),
            "ANSWERED" => Ok(TicketStatus::Answered),
            "CLOSED" => Ok(TicketStatus::Closed),
            other => Err(SupportError::UnknownStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub body: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// A staff reply answers the ticket; a reply from the opener reopens it.
    /// Closed tickets take no further replies.
    pub fn status_after_reply(&self, author_is_staff: bool) -> Result<TicketStatus, SupportError> {
        if self.status == TicketStatus::Closed {
            return Err(SupportError::TicketClosed(self.id));
        }
        Ok(if author_is_staff {
            TicketStatus::Answered
        } else {
            TicketStatus::Open
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketReply {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author_user_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum SupportError {
    #[error("Ticket not found: {0}")]
    NotFound(Uuid),

    #[error("Ticket {0} is closed")]
    TicketClosed(Uuid),

    #[error("Ticket subject and body are required")]
    MissingFields,

    #[error("Unknown ticket status: {0}")]
    UnknownStatus(String),
}

/// Outbox payload emitted when staff reply to a ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketReplied {
    pub ticket_id: Uuid,
    pub opener_user_id: Uuid,
    pub subject: String,
}

impl TicketReplied {
    pub const EVENT_TYPE: &'static str = "TicketReplied";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(status: TicketStatus) -> Ticket {
        Ticket {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            subject: "Order never arrived".to_string(),
            body: "It has been two weeks.".to_string(),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_staff_reply_answers() {
        let t = ticket(TicketStatus::Open);
        assert_eq!(t.status_after_reply(true).unwrap(), TicketStatus::Answered);
    }

    #[test]
    fn test_user_reply_reopens() {
        let t = ticket(TicketStatus::Answered);
        assert_eq!(t.status_after_reply(false).unwrap(), TicketStatus::Open);
    }

    #[test]
    fn test_closed_ticket_rejects_replies() {
        let t = ticket(TicketStatus::Closed);
        assert!(matches!(
            t.status_after_reply(true),
            Err(SupportError::TicketClosed(_))
        ));
    }
}
