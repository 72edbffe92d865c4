use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::support::{SupportError, Ticket, TicketStatus};
use crate::store::sessions::Role;

use super::auth::AuthSession;
use super::error::ApiError;
use super::{clamp_limit, AppState};

// ============================================================================
// Support Ticket Routes
// ============================================================================

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tickets")
            .route("", web::post().to(open_ticket))
            .route("", web::get().to(list_tickets))
            .route("/{id}", web::get().to(get_ticket))
            .route("/{id}/replies", web::post().to(add_reply))
            .route("/{id}/close", web::post().to(close_ticket)),
    );
}

#[derive(Deserialize)]
struct OpenTicketRequest {
    subject: String,
    body: String,
}

#[derive(Deserialize)]
struct TicketListQuery {
    status: Option<String>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct ReplyRequest {
    body: String,
}

async fn open_ticket(
    auth: AuthSession,
    state: web::Data<AppState>,
    body: web::Json<OpenTicketRequest>,
) -> Result<HttpResponse, ApiError> {
    if body.subject.trim().is_empty() || body.body.trim().is_empty() {
        return Err(SupportError::MissingFields.into());
    }

    let ticket = state
        .tickets
        .open(auth.user_id(), body.subject.trim(), body.body.trim())
        .await?;

    Ok(HttpResponse::Created().json(ticket))
}

async fn list_tickets(
    auth: AuthSession,
    state: web::Data<AppState>,
    query: web::Query<TicketListQuery>,
) -> Result<HttpResponse, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(TicketStatus::parse)
        .transpose()?;

    // Admins triage all tickets; everyone else sees their own
    let user_filter = if auth.is_admin() {
        None
    } else {
        Some(auth.user_id())
    };

    let tickets = state
        .tickets
        .list(user_filter, status, clamp_limit(query.limit))
        .await?;

    Ok(HttpResponse::Ok().json(tickets))
}

async fn get_ticket(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let ticket = load_ticket(&auth, &state, *path).await?;
    let replies = state.tickets.replies(ticket.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ticket": ticket,
        "replies": replies,
    })))
}

/// Staff replies move the ticket to ANSWERED and notify the opener; opener
/// replies reopen it. Closed tickets take no replies.
async fn add_reply(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ReplyRequest>,
) -> Result<HttpResponse, ApiError> {
    if body.body.trim().is_empty() {
        return Err(SupportError::MissingFields.into());
    }

    let ticket = load_ticket(&auth, &state, *path).await?;

    let author_is_staff = auth.role() == Role::Admin;
    let new_status = ticket.status_after_reply(author_is_staff)?;

    let reply = state
        .tickets
        .add_reply(
            &ticket,
            auth.user_id(),
            body.body.trim(),
            new_status,
            author_is_staff,
        )
        .await?;

    Ok(HttpResponse::Created().json(reply))
}

async fn close_ticket(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let ticket = load_ticket(&auth, &state, *path).await?;

    let closed = state
        .tickets
        .close(ticket.id)
        .await?
        .ok_or(SupportError::TicketClosed(ticket.id))?;

    Ok(HttpResponse::Ok().json(closed))
}

async fn load_ticket(
    auth: &AuthSession,
    state: &AppState,
    ticket_id: Uuid,
) -> Result<Ticket, ApiError> {
    let ticket = state
        .tickets
        .get(ticket_id)
        .await?
        .ok_or(SupportError::NotFound(ticket_id))?;

    if !auth.is_admin() && ticket.user_id != auth.user_id() {
        return Err(ApiError::Forbidden(
            "Ticket belongs to another user".to_string(),
        ));
    }

    Ok(ticket)
}
