use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

// ============================================================================
// Session Store
// ============================================================================
//
// Session rows are issued by the external auth service; this API only
// verifies the presented bearer token and reads the role.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Vendor,
    Customer,
}

impl Role {
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "ADMIN" => Some(Role::Admin),
            "VENDOR" => Some(Role::Vendor),
            "CUSTOMER" => Some(Role::Customer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Vendor => "VENDOR",
            Role::Customer => "CUSTOMER",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    token: String,
    user_id: Uuid,
    role: String,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionStore {
    pool: PgPool,
}

impl SessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Unexpired session for the token, if any.
    pub async fn verify(&self, token: &str) -> anyhow::Result<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT token, user_id, role, expires_at
             FROM sessions WHERE token = $1 AND expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let Some(role) = Role::parse(&row.role) else {
            tracing::warn!(user_id = %row.user_id, role = %row.role, "Session carries unknown role");
            return Ok(None);
        };

        Ok(Some(Session {
            token: row.token,
            user_id: row.user_id,
            role,
            expires_at: row.expires_at,
        }))
    }

    /// Email address for a user, for the outbound mailer.
    pub async fn email_for_user(&self, user_id: Uuid) -> anyhow::Result<Option<String>> {
        let email: Option<String> =
            sqlx::query_scalar("SELECT email FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("VENDOR"), Some(Role::Vendor));
        assert_eq!(Role::parse("CUSTOMER"), Some(Role::Customer));
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let session = Session {
            token: "tok".to_string(),
            user_id: Uuid::new_v4(),
            role: Role::Vendor,
            expires_at: now + Duration::minutes(5),
        };
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::minutes(6)));
    }
}
