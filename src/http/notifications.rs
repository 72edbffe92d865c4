use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::auth::AuthSession;
use super::error::ApiError;
use super::{clamp_limit, AppState};

// ============================================================================
// Notification Routes
// ============================================================================

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notifications")
            .route("", web::get().to(list_notifications))
            .route("/{id}/read", web::post().to(mark_read)),
    );
}

#[derive(Deserialize)]
struct NotificationListQuery {
    limit: Option<i64>,
}

/// A user's own notifications; admin sessions also see the broadcast rows.
async fn list_notifications(
    auth: AuthSession,
    state: web::Data<AppState>,
    query: web::Query<NotificationListQuery>,
) -> Result<HttpResponse, ApiError> {
    let notifications = state
        .notifications
        .list_for_user(auth.user_id(), auth.is_admin(), clamp_limit(query.limit))
        .await?;

    Ok(HttpResponse::Ok().json(notifications))
}

async fn mark_read(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let found = state
        .notifications
        .mark_read(*path, auth.user_id(), auth.is_admin())
        .await?;
    if !found {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    Ok(HttpResponse::NoContent().finish())
}
