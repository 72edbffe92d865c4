use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

use crate::domain::order::{
    GeoPoint, Order, OrderActor, OrderError, OrderStatus, StatusChange,
};
use crate::store::sessions::Role;

use super::auth::AuthSession;
use super::error::ApiError;
use super::{clamp_limit, AppState};

// ============================================================================
// Order Routes
// ============================================================================

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::post().to(create_order))
            .route("", web::get().to(list_orders))
            .route("/{id}", web::get().to(get_order))
            .route("/{id}/status", web::post().to(update_status))
            .route("/{id}/tracking", web::get().to(tracking_history))
            .route("/{id}/tracking/live", web::get().to(live_tracking)),
    );
}

#[derive(Deserialize)]
struct OrderListQuery {
    vendor_id: Option<Uuid>,
    status: Option<String>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct StatusChangeRequest {
    status: String,
    tracking_partner: Option<String>,
    tracking_number: Option<String>,
    note: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Serialize)]
struct StatusChangeResponse {
    order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

#[derive(Deserialize)]
struct CreateOrderRequest {
    vendor_id: Uuid,
    subtotal_cents: i64,
    shipping_cents: i64,
    payment_method: String,
}

/// Mobile checkout: a customer places a PENDING order against an approved
/// vendor; the unpaid payment row is created with it.
async fn create_order(
    auth: AuthSession,
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, ApiError> {
    if auth.role() != Role::Customer {
        return Err(ApiError::Forbidden(
            "Orders are placed by customer sessions".to_string(),
        ));
    }

    if body.subtotal_cents <= 0 || body.shipping_cents < 0 {
        return Err(ApiError::BadRequest("Invalid order amounts".to_string()));
    }
    if body.payment_method.trim().is_empty() {
        return Err(ApiError::BadRequest("payment_method is required".to_string()));
    }

    let vendor = state
        .vendors
        .get(body.vendor_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Vendor not found".to_string()))?;

    if !vendor.is_active() {
        return Err(ApiError::BadRequest(
            "Vendor is not accepting orders".to_string(),
        ));
    }

    let order = state
        .orders
        .create(
            vendor.id,
            auth.user_id(),
            body.subtotal_cents,
            body.shipping_cents,
            body.payment_method.trim(),
        )
        .await?;

    Ok(HttpResponse::Created().json(order))
}

/// Admins see everything; vendors are pinned to their own orders.
async fn list_orders(
    auth: AuthSession,
    state: web::Data<AppState>,
    query: web::Query<OrderListQuery>,
) -> Result<HttpResponse, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(OrderStatus::parse)
        .transpose()?;

    let vendor_filter = match auth.role() {
        Role::Admin => query.vendor_id,
        Role::Vendor => Some(auth.vendor(&state).await?.id),
        Role::Customer => {
            return Err(ApiError::Forbidden(
                "Order listing requires a vendor or admin session".to_string(),
            ))
        }
    };

    let orders = state
        .orders
        .list(vendor_filter, status, clamp_limit(query.limit))
        .await?;

    Ok(HttpResponse::Ok().json(orders))
}

async fn get_order(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order = load_order(&state, *path).await?;
    ensure_can_view(&auth, &state, &order).await?;

    Ok(HttpResponse::Ok().json(order))
}

/// The status transition handler. Ownership, required tracking fields and
/// the transition table are all checked before the transactional write; the
/// courier call comes after the commit and can only degrade the response to
/// a warning, never roll the transition back.
async fn update_status(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<StatusChangeRequest>,
) -> Result<HttpResponse, ApiError> {
    let order_id = *path;
    let target = OrderStatus::parse(&body.status)?;

    let order = load_order(&state, order_id).await?;
    let actor = auth.order_actor(&state).await?;

    let change = StatusChange {
        target,
        tracking_partner: body.tracking_partner.clone(),
        tracking_number: body.tracking_number.clone(),
        note: body.note.clone(),
        location: match (body.latitude, body.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        },
    };

    let transition = change.plan(&order, &actor).map_err(|err| {
        state
            .metrics
            .record_rejected_transition(rejection_label(&err));
        ApiError::from(err)
    })?;

    let updated = state
        .orders
        .apply_transition(&transition)
        .await
        .map_err(map_order_store_error)?;

    state
        .metrics
        .record_transition(transition.from.as_str(), transition.to.as_str());

    // Shipment registration is best-effort after the commit; the tracking
    // poller reconciles if the courier was down
    let mut warning = None;
    if transition.to == OrderStatus::Shipped {
        let partner = transition.tracking_partner.as_deref().unwrap_or_default();
        let number = transition.tracking_number.as_deref().unwrap_or_default();

        let started = Instant::now();
        match state.courier.create_shipment(order_id, partner, number).await {
            Ok(shipment) => {
                state
                    .metrics
                    .record_courier_call("create_shipment", started.elapsed().as_secs_f64());
                tracing::info!(
                    order_id = %order_id,
                    reference = %shipment.reference,
                    "Courier shipment registered"
                );
            }
            Err(error) => {
                tracing::warn!(
                    order_id = %order_id,
                    error = %error,
                    "Order shipped but courier registration failed"
                );
                warning = Some("Shipment registration with courier failed; tracking will reconcile later".to_string());
            }
        }
    }

    Ok(HttpResponse::Ok().json(StatusChangeResponse {
        order: updated,
        warning,
    }))
}

async fn tracking_history(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order = load_order(&state, *path).await?;
    ensure_can_view(&auth, &state, &order).await?;

    let history = state.orders.tracking_history(order.id).await?;
    Ok(HttpResponse::Ok().json(history))
}

/// Live courier tracking, proxied synchronously. A courier outage surfaces
/// as 502 here; the stored tracking history stays available either way.
async fn live_tracking(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order = load_order(&state, *path).await?;
    ensure_can_view(&auth, &state, &order).await?;

    let Some(tracking_number) = order.tracking_number.as_deref() else {
        return Err(ApiError::BadRequest(
            "Order has no tracking number".to_string(),
        ));
    };

    let started = Instant::now();
    let events = state.courier.track(tracking_number).await?;
    state
        .metrics
        .record_courier_call("track", started.elapsed().as_secs_f64());

    Ok(HttpResponse::Ok().json(events))
}

// ------------------------------------------------------------------
// Helpers
// ------------------------------------------------------------------

async fn load_order(state: &AppState, order_id: Uuid) -> Result<Order, ApiError> {
    state
        .orders
        .get(order_id)
        .await?
        .ok_or_else(|| OrderError::NotFound(order_id).into())
}

async fn ensure_can_view(
    auth: &AuthSession,
    state: &AppState,
    order: &Order,
) -> Result<(), ApiError> {
    match auth.role() {
        Role::Admin => Ok(()),
        Role::Vendor => {
            let vendor = auth.vendor(state).await?;
            if vendor.id == order.vendor_id {
                Ok(())
            } else {
                Err(OrderError::VendorMismatch {
                    order_id: order.id,
                    vendor_id: vendor.id,
                }
                .into())
            }
        }
        Role::Customer => {
            if auth.user_id() == order.customer_id {
                Ok(())
            } else {
                Err(ApiError::Forbidden(
                    "Order belongs to another customer".to_string(),
                ))
            }
        }
    }
}

/// apply_transition reports a lost CAS as a domain error inside anyhow;
/// everything else is a real database failure.
fn map_order_store_error(err: anyhow::Error) -> ApiError {
    match err.downcast::<OrderError>() {
        Ok(order_err) => order_err.into(),
        Err(other) => ApiError::Internal(other),
    }
}

fn rejection_label(err: &OrderError) -> &'static str {
    match err {
        OrderError::NotFound(_) => "not_found",
        OrderError::VendorMismatch { .. } => "vendor_mismatch",
        OrderError::IllegalTransition { .. } => "illegal_transition",
        OrderError::AlreadyInStatus(_) => "already_in_status",
        OrderError::MissingTrackingInfo => "missing_tracking_info",
        OrderError::UnknownStatus(_) => "unknown_status",
        OrderError::ConcurrentModification => "concurrent_modification",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_change_request_deserializes() {
        let body = r#"{
            "status": "SHIPPED",
            "tracking_partner": "BlueDart",
            "tracking_number": "BD123"
        }"#;

        let request: StatusChangeRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.status, "SHIPPED");
        assert_eq!(request.tracking_partner.as_deref(), Some("BlueDart"));
        assert_eq!(request.note, None);
    }

    #[test]
    fn test_rejection_labels_are_stable() {
        assert_eq!(
            rejection_label(&OrderError::MissingTrackingInfo),
            "missing_tracking_info"
        );
        assert_eq!(
            rejection_label(&OrderError::IllegalTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Shipped,
            }),
            "illegal_transition"
        );
    }

    #[test]
    fn test_map_order_store_error_unwraps_domain_error() {
        let err = map_order_store_error(anyhow::Error::new(OrderError::ConcurrentModification));
        assert!(matches!(err, ApiError::Conflict(_)));

        let err = map_order_store_error(anyhow::anyhow!("connection refused"));
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
