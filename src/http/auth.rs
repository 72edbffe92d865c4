use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use std::future::Future;
use std::pin::Pin;

use crate::domain::order::OrderActor;
use crate::domain::vendor::Vendor;
use crate::store::sessions::{Role, Session};

use super::error::ApiError;
use super::AppState;

// ============================================================================
// Session Authentication
// ============================================================================
//
// The bearer token arrives either as the session_token cookie or an
// Authorization: Bearer header; both are verified against the sessions
// table on every request. Issuing sessions is the auth service's job, not
// this API's.
//
// ============================================================================

const SESSION_COOKIE: &str = "session_token";

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session: Session,
}

impl AuthSession {
    pub fn user_id(&self) -> uuid::Uuid {
        self.session.user_id
    }

    pub fn role(&self) -> Role {
        self.session.role
    }

    pub fn is_admin(&self) -> bool {
        self.session.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin access required".to_string()))
        }
    }

    /// The vendor record behind a vendor session.
    pub async fn vendor(&self, state: &AppState) -> Result<Vendor, ApiError> {
        if self.session.role != Role::Vendor {
            return Err(ApiError::Forbidden("Vendor access required".to_string()));
        }

        state
            .vendors
            .get_by_owner(self.session.user_id)
            .await?
            .ok_or_else(|| ApiError::Forbidden("No vendor account for this user".to_string()))
    }

    /// Who this session acts as in the order workflow.
    pub async fn order_actor(&self, state: &AppState) -> Result<OrderActor, ApiError> {
        match self.session.role {
            Role::Admin => Ok(OrderActor::Admin),
            Role::Vendor => {
                let vendor = self.vendor(state).await?;
                Ok(OrderActor::Vendor(vendor.id))
            }
            Role::Customer => Err(ApiError::Forbidden(
                "Customers cannot change order status".to_string(),
            )),
        }
    }
}

fn extract_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    let header = req.headers().get("Authorization")?.to_str().ok()?;
    header
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

impl FromRequest for AuthSession {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let token = extract_token(&req).ok_or(ApiError::Unauthorized)?;

            let state = req
                .app_data::<web::Data<AppState>>()
                .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("app state not configured")))?;

            let session = state
                .sessions
                .verify(&token)
                .await?
                .ok_or(ApiError::Unauthorized)?;

            Ok(AuthSession { session })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn session(role: Role) -> AuthSession {
        AuthSession {
            session: Session {
                token: "tok".to_string(),
                user_id: Uuid::new_v4(),
                role,
                expires_at: Utc::now() + Duration::hours(1),
            },
        }
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let req = TestRequest::default()
            .cookie(actix_web::cookie::Cookie::new(SESSION_COOKIE, "abc123"))
            .to_http_request();
        assert_eq!(extract_token(&req).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_extract_token_from_bearer_header() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer xyz789"))
            .to_http_request();
        assert_eq!(extract_token(&req).as_deref(), Some("xyz789"));
    }

    #[test]
    fn test_extract_token_missing() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(extract_token(&req), None);

        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert_eq!(extract_token(&req), None);
    }

    #[test]
    fn test_require_admin() {
        assert!(session(Role::Admin).require_admin().is_ok());
        assert!(session(Role::Vendor).require_admin().is_err());
        assert!(session(Role::Customer).require_admin().is_err());
    }
}
