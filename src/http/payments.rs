use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::order::OrderError;
use crate::domain::payment::{PaymentError, PaymentStatus, PayoutStatus};
use crate::domain::vendor::VendorError;
use crate::store::sessions::Role;

use super::auth::AuthSession;
use super::error::ApiError;
use super::{clamp_limit, AppState};

// ============================================================================
// Payment & Payout Routes
// ============================================================================

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("/order/{order_id}", web::get().to(get_payment))
            .route("/order/{order_id}/mark-paid", web::post().to(mark_paid))
            .route("/order/{order_id}/refund", web::post().to(refund)),
    );
    cfg.service(
        web::scope("/payouts")
            .route("", web::post().to(request_payout))
            .route("", web::get().to(list_payouts))
            .route("/{id}/decide", web::post().to(decide_payout)),
    );
}

async fn get_payment(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order_id = *path;
    let order = state
        .orders
        .get(order_id)
        .await?
        .ok_or(OrderError::NotFound(order_id))?;

    match auth.role() {
        Role::Admin => {}
        Role::Vendor => {
            let vendor = auth.vendor(&state).await?;
            if vendor.id != order.vendor_id {
                return Err(OrderError::VendorMismatch {
                    order_id,
                    vendor_id: vendor.id,
                }
                .into());
            }
        }
        Role::Customer => {
            if auth.user_id() != order.customer_id {
                return Err(ApiError::Forbidden(
                    "Order belongs to another customer".to_string(),
                ));
            }
        }
    }

    let payment = state
        .payments
        .get_for_order(order_id)
        .await?
        .ok_or(PaymentError::NotFound(order_id))?;

    Ok(HttpResponse::Ok().json(payment))
}

async fn mark_paid(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    transition_payment(&state, *path, PaymentStatus::Unpaid, PaymentStatus::Paid).await
}

async fn refund(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    transition_payment(&state, *path, PaymentStatus::Paid, PaymentStatus::Refunded).await
}

async fn transition_payment(
    state: &AppState,
    order_id: Uuid,
    from: PaymentStatus,
    to: PaymentStatus,
) -> Result<HttpResponse, ApiError> {
    let payment = state
        .payments
        .get_for_order(order_id)
        .await?
        .ok_or(PaymentError::NotFound(order_id))?;

    if !payment.status.can_transition_to(to) {
        return Err(PaymentError::IllegalTransition {
            from: payment.status,
            to,
        }
        .into());
    }

    let updated = state
        .payments
        .set_status(order_id, from, to)
        .await?
        .ok_or_else(|| {
            // CAS missed: the payment moved between our read and write
            ApiError::Conflict("Payment was modified concurrently".to_string())
        })?;

    Ok(HttpResponse::Ok().json(updated))
}

#[derive(Deserialize)]
struct PayoutRequest {
    amount_cents: i64,
    note: Option<String>,
}

#[derive(Deserialize)]
struct PayoutListQuery {
    vendor_id: Option<Uuid>,
    status: Option<String>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct PayoutDecisionRequest {
    decision: String,
    note: Option<String>,
}

/// Vendors request payouts against their delivered, paid balance net of
/// commission; requests beyond it are rejected up front.
async fn request_payout(
    auth: AuthSession,
    state: web::Data<AppState>,
    body: web::Json<PayoutRequest>,
) -> Result<HttpResponse, ApiError> {
    let vendor = auth.vendor(&state).await?;

    if body.amount_cents <= 0 {
        return Err(PaymentError::NonPositiveAmount(body.amount_cents).into());
    }

    let available = state
        .payments
        .available_balance_cents(vendor.id, vendor.commission_override_bps)
        .await?;

    if body.amount_cents > available {
        return Err(PaymentError::InsufficientBalance {
            requested_cents: body.amount_cents,
            available_cents: available.max(0),
        }
        .into());
    }

    let payout = state
        .payments
        .request_payout(vendor.id, body.amount_cents, body.note.as_deref())
        .await?;

    Ok(HttpResponse::Created().json(payout))
}

async fn list_payouts(
    auth: AuthSession,
    state: web::Data<AppState>,
    query: web::Query<PayoutListQuery>,
) -> Result<HttpResponse, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(PayoutStatus::parse)
        .transpose()?;

    let vendor_filter = match auth.role() {
        Role::Admin => query.vendor_id,
        Role::Vendor => Some(auth.vendor(&state).await?.id),
        Role::Customer => {
            return Err(ApiError::Forbidden(
                "Payouts require a vendor or admin session".to_string(),
            ))
        }
    };

    let payouts = state
        .payments
        .list_payouts(vendor_filter, status, clamp_limit(query.limit))
        .await?;

    Ok(HttpResponse::Ok().json(payouts))
}

/// Admin decision on a payout request (approve / reject / pay), committed
/// together with the vendor owner's notification.
async fn decide_payout(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<PayoutDecisionRequest>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let decision = PayoutStatus::parse(&body.decision)?;

    let payout = state
        .payments
        .get_payout(*path)
        .await?
        .ok_or(PaymentError::PayoutNotFound(*path))?;

    payout.decide(decision)?;

    let vendor = state
        .vendors
        .get(payout.vendor_id)
        .await?
        .ok_or(VendorError::NotFound(payout.vendor_id))?;

    let updated = state
        .payments
        .apply_payout_decision(&payout, vendor.owner_user_id, decision, body.note.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(updated))
}
