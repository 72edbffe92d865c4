use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::catalog::{CatalogError, ProductDraft};
use crate::store::sessions::Role;

use super::auth::AuthSession;
use super::error::ApiError;
use super::{clamp_limit, AppState};

// ============================================================================
// Product Routes - Catalog Management
// ============================================================================

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/products")
            .route("", web::post().to(create_product))
            .route("", web::get().to(list_products))
            .route("/{id}", web::get().to(get_product))
            .route("/{id}", web::put().to(update_product))
            .route("/{id}", web::delete().to(delete_product))
            .route("/{id}/approve", web::post().to(approve_product)),
    );
}

#[derive(Deserialize)]
struct ProductListQuery {
    vendor_id: Option<Uuid>,
    category: Option<String>,
    limit: Option<i64>,
}

/// Only active (KYC-approved) vendors may list products.
async fn create_product(
    auth: AuthSession,
    state: web::Data<AppState>,
    body: web::Json<ProductDraft>,
) -> Result<HttpResponse, ApiError> {
    let vendor = auth.vendor(&state).await?;
    if !vendor.is_active() {
        return Err(ApiError::Forbidden(
            "Vendor account is not approved for selling".to_string(),
        ));
    }

    body.validate()?;

    let product = state.products.create(vendor.id, &body).await?;
    Ok(HttpResponse::Created().json(product))
}

/// Buyers see only approved products; admins and the owning vendor see all.
async fn list_products(
    auth: AuthSession,
    state: web::Data<AppState>,
    query: web::Query<ProductListQuery>,
) -> Result<HttpResponse, ApiError> {
    let (vendor_filter, approved_only) = match auth.role() {
        Role::Admin => (query.vendor_id, false),
        Role::Vendor => {
            let vendor = auth.vendor(&state).await?;
            (Some(vendor.id), false)
        }
        Role::Customer => (query.vendor_id, true),
    };

    let products = state
        .products
        .list(
            vendor_filter,
            query.category.as_deref(),
            approved_only,
            clamp_limit(query.limit),
        )
        .await?;

    Ok(HttpResponse::Ok().json(products))
}

async fn get_product(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let product = state
        .products
        .get(*path)
        .await?
        .ok_or(CatalogError::NotFound(*path))?;

    if !product.approved && auth.role() == Role::Customer {
        return Err(CatalogError::NotFound(product.id).into());
    }

    Ok(HttpResponse::Ok().json(product))
}

async fn update_product(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ProductDraft>,
) -> Result<HttpResponse, ApiError> {
    let product = state
        .products
        .get(*path)
        .await?
        .ok_or(CatalogError::NotFound(*path))?;

    if !auth.is_admin() {
        let vendor = auth.vendor(&state).await?;
        if vendor.id != product.vendor_id {
            return Err(CatalogError::VendorMismatch {
                product_id: product.id,
                vendor_id: vendor.id,
            }
            .into());
        }
    }

    body.validate()?;

    let updated = state
        .products
        .update(product.id, &body)
        .await?
        .ok_or(CatalogError::NotFound(product.id))?;

    Ok(HttpResponse::Ok().json(updated))
}

async fn delete_product(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let product = state
        .products
        .get(*path)
        .await?
        .ok_or(CatalogError::NotFound(*path))?;

    if !auth.is_admin() {
        let vendor = auth.vendor(&state).await?;
        if vendor.id != product.vendor_id {
            return Err(CatalogError::VendorMismatch {
                product_id: product.id,
                vendor_id: vendor.id,
            }
            .into());
        }
    }

    state.products.delete(product.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn approve_product(
    auth: AuthSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let product = state
        .products
        .set_approved(*path, true)
        .await?
        .ok_or(CatalogError::NotFound(*path))?;

    Ok(HttpResponse::Ok().json(product))
}
