use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::promo::{resolve_commission_bps, validate_rate_bps, PromoError};
use crate::domain::vendor::VendorError;

use super::auth::AuthSession;
use super::error::ApiError;
use super::{clamp_limit, AppState};

// ============================================================================
// Promotion & Rule Routes (admin)
// ============================================================================

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/promotions")
            .route("", web::post().to(create_promotion))
            .route("", web::get().to(list_promotions))
            .route("/validate/{code}", web::get().to(validate_promotion))
            .route("/{id}", web::get().to(get_promotion))
            .route("/{id}/active", web::post().to(set_promotion_active))
            .route("/{id}", web::delete().to(delete_promotion)),
    );
    cfg.service(
        web::scope("/rules")
            .route("/commission", web::put().to(upsert_commission_rule))
            .route("/commission", web::get().to(list_commission_rules))
            .route("/commission/effective", web::get().to(effective_commission))
            .route("/tax", web::put().to(upsert_tax_rule))
            .route("/tax", web::get().to(list_tax_rules)),
    );
}

#[derive(Deserialize)]
struct PromotionRequest {
    code: String,
    percent_off_bps: i32,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct ListQuery {
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct ActiveRequest {
    active: bool,
}

async fn create_promotion(
    auth: AuthSession,
    state: web::Data<AppState>,
    body: web::Json<PromotionRequest>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    if body.code.trim().is_empty() {
        return Err(PromoError::EmptyCode.into());
    }
    validate_rate_bps(body.percent_off_bps)?;
    if body.ends_at <= body.starts_at {
        return Err(PromoError::InvertedWindow.into());
    }

    let promotion = state
        .promos
        .create_promotion(
            &body.code.trim().to_uppercase(),
            body.percent_off_bps,
            body.starts_at,
            body.ends_at,
        )
        .await?;

    Ok(HttpResponse::Created().json(promotion))
}

async fn list_promotions(
    auth: AuthSession,
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let promotions = state.promos.list_promotions(clamp_limit(query.limit)).await?;
    Ok(HttpResponse::Ok().json(promotions))
}

#[derive(Deserialize)]
struct ValidateQuery {
    amount_cents: Option<i64>,
}

/// Checkout-time promotion check: is the code live right now, and what
/// would it take off the given amount.
async fn validate_promotion(
    _auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ValidateQuery>,
) -> Result<HttpResponse, ApiError> {
    let code = path.trim().to_uppercase();

    let Some(promotion) = state.promos.get_promotion_by_code(&code).await? else {
        return Ok(HttpResponse::Ok().json(serde_json::json!({ "valid": false })));
    };

    let valid = promotion.is_live(Utc::now());
    let discount_cents = query
        .amount_cents
        .filter(|_| valid)
        .map(|amount| promotion.discount_cents(amount));

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "valid": valid,
        "code": promotion.code,
        "percent_off_bps": promotion.percent_off_bps,
        "discount_cents": discount_cents,
    })))
}

async fn get_promotion(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let promotion = state
        .promos
        .get_promotion(*path)
        .await?
        .ok_or(PromoError::NotFound(*path))?;

    Ok(HttpResponse::Ok().json(promotion))
}

async fn set_promotion_active(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ActiveRequest>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let found = state.promos.set_promotion_active(*path, body.active).await?;
    if !found {
        return Err(PromoError::NotFound(*path).into());
    }

    Ok(HttpResponse::NoContent().finish())
}

async fn delete_promotion(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let found = state.promos.delete_promotion(*path).await?;
    if !found {
        return Err(PromoError::NotFound(*path).into());
    }

    Ok(HttpResponse::NoContent().finish())
}

#[derive(Deserialize)]
struct CommissionRuleRequest {
    category: String,
    rate_bps: i32,
}

#[derive(Deserialize)]
struct TaxRuleRequest {
    category: String,
    region: String,
    rate_bps: i32,
}

async fn upsert_commission_rule(
    auth: AuthSession,
    state: web::Data<AppState>,
    body: web::Json<CommissionRuleRequest>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    if body.category.trim().is_empty() {
        return Err(ApiError::BadRequest("category is required".to_string()));
    }
    validate_rate_bps(body.rate_bps)?;

    let rule = state
        .promos
        .upsert_commission_rule(body.category.trim(), body.rate_bps)
        .await?;

    Ok(HttpResponse::Ok().json(rule))
}

async fn list_commission_rules(
    auth: AuthSession,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let rules = state.promos.list_commission_rules().await?;
    Ok(HttpResponse::Ok().json(rules))
}

#[derive(Deserialize)]
struct EffectiveCommissionQuery {
    category: String,
    vendor_id: Option<Uuid>,
}

/// Resolve the commission a sale would pay: vendor override first, then the
/// category rule, then the platform default.
async fn effective_commission(
    auth: AuthSession,
    state: web::Data<AppState>,
    query: web::Query<EffectiveCommissionQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let vendor_override = match query.vendor_id {
        Some(vendor_id) => {
            let vendor = state
                .vendors
                .get(vendor_id)
                .await?
                .ok_or(VendorError::NotFound(vendor_id))?;
            vendor.commission_override_bps
        }
        None => None,
    };

    let rule = state.promos.commission_rule_for(&query.category).await?;
    let rate_bps = resolve_commission_bps(vendor_override, rule.as_ref());

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "category": query.category,
        "rate_bps": rate_bps,
    })))
}

async fn upsert_tax_rule(
    auth: AuthSession,
    state: web::Data<AppState>,
    body: web::Json<TaxRuleRequest>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    if body.category.trim().is_empty() || body.region.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "category and region are required".to_string(),
        ));
    }
    validate_rate_bps(body.rate_bps)?;

    let rule = state
        .promos
        .upsert_tax_rule(body.category.trim(), body.region.trim(), body.rate_bps)
        .await?;

    Ok(HttpResponse::Ok().json(rule))
}

async fn list_tax_rules(
    auth: AuthSession,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let rules = state.promos.list_tax_rules().await?;
    Ok(HttpResponse::Ok().json(rules))
}
