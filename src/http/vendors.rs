use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::vendor::{KycStatus, VendorError};

use super::auth::AuthSession;
use super::error::ApiError;
use super::{clamp_limit, AppState};

// ============================================================================
// Vendor Routes - Onboarding & KYC
// ============================================================================

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/vendors")
            .route("", web::post().to(onboard))
            .route("", web::get().to(list_vendors))
            .route("/me", web::get().to(my_vendor))
            .route("/{id}", web::get().to(get_vendor))
            .route("/{id}/kyc", web::post().to(decide_kyc)),
    );
}

#[derive(Deserialize)]
struct OnboardRequest {
    display_name: String,
    contact_email: String,
}

#[derive(Deserialize)]
struct VendorListQuery {
    kyc_status: Option<String>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct KycDecisionRequest {
    decision: String,
    note: Option<String>,
}

/// Any authenticated user may apply once; the application starts in APPLIED.
async fn onboard(
    auth: AuthSession,
    state: web::Data<AppState>,
    body: web::Json<OnboardRequest>,
) -> Result<HttpResponse, ApiError> {
    if body.display_name.trim().is_empty() || body.contact_email.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "display_name and contact_email are required".to_string(),
        ));
    }

    if state
        .vendors
        .get_by_owner(auth.user_id())
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "A vendor application already exists for this user".to_string(),
        ));
    }

    let vendor = state
        .vendors
        .onboard(auth.user_id(), body.display_name.trim(), body.contact_email.trim())
        .await?;

    Ok(HttpResponse::Created().json(vendor))
}

async fn list_vendors(
    auth: AuthSession,
    state: web::Data<AppState>,
    query: web::Query<VendorListQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let kyc_status = query
        .kyc_status
        .as_deref()
        .map(KycStatus::parse)
        .transpose()?;

    let vendors = state
        .vendors
        .list(kyc_status, clamp_limit(query.limit))
        .await?;

    Ok(HttpResponse::Ok().json(vendors))
}

async fn my_vendor(
    auth: AuthSession,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let vendor = auth.vendor(&state).await?;
    Ok(HttpResponse::Ok().json(vendor))
}

async fn get_vendor(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let vendor = state
        .vendors
        .get(*path)
        .await?
        .ok_or(VendorError::NotFound(*path))?;

    if !auth.is_admin() && vendor.owner_user_id != auth.user_id() {
        return Err(ApiError::Forbidden(
            "Vendor record belongs to another user".to_string(),
        ));
    }

    Ok(HttpResponse::Ok().json(vendor))
}

/// Admin-only KYC decision, validated against the KYC transition table and
/// committed together with the owner's notification.
async fn decide_kyc(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<KycDecisionRequest>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let decision = KycStatus::parse(&body.decision)?;
    if decision == KycStatus::Applied {
        return Err(ApiError::BadRequest(
            "APPLIED is not a reviewable decision".to_string(),
        ));
    }

    let vendor = state
        .vendors
        .get(*path)
        .await?
        .ok_or(VendorError::NotFound(*path))?;

    vendor.kyc_transition(decision)?;

    let updated = state
        .vendors
        .apply_kyc_decision(&vendor, decision, body.note.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(updated))
}
