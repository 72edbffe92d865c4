use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::auth::AuthSession;
use super::error::ApiError;
use super::{clamp_limit, AppState};

// ============================================================================
// Ops Routes - Manual Intervention
// ============================================================================

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/ops")
            .route("/dead-letters", web::get().to(list_dead_letters))
            .route("/outbox/pending", web::get().to(pending_outbox))
            .route("/courier/circuit/reset", web::post().to(reset_courier_circuit)),
    );
}

#[derive(Deserialize)]
struct DeadLetterQuery {
    limit: Option<i64>,
}

/// Notification messages that exhausted their retries, for manual review.
async fn list_dead_letters(
    auth: AuthSession,
    state: web::Data<AppState>,
    query: web::Query<DeadLetterQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let records = state.outbox.dead_letters(clamp_limit(query.limit)).await?;

    Ok(HttpResponse::Ok().json(
        records
            .into_iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id,
                    "aggregate_id": r.aggregate_id,
                    "event_type": r.event_type,
                    "payload": r.payload,
                    "error_message": r.error_message,
                    "failure_count": r.failure_count,
                    "first_failed_at": r.first_failed_at,
                    "last_failed_at": r.last_failed_at,
                })
            })
            .collect::<Vec<_>>(),
    ))
}

async fn pending_outbox(
    auth: AuthSession,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let pending = state.outbox.pending_count().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "pending": pending })))
}

async fn reset_courier_circuit(
    auth: AuthSession,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    state.courier.reset_circuit_breaker().await;
    Ok(HttpResponse::NoContent().finish())
}
