use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::domain::catalog::CatalogError;
use crate::domain::order::OrderError;
use crate::domain::payment::PaymentError;
use crate::domain::promo::PromoError;
use crate::domain::support::SupportError;
use crate::domain::vendor::VendorError;
use crate::shipping::CourierError;

// ============================================================================
// API Error - HTTP Error Taxonomy
// ============================================================================
//
// Every handler funnels failures through this enum:
//   400 validation, 401 missing/expired session, 403 ownership/role,
//   404 missing row, 409 illegal transition or lost race,
//   502 courier failure, 500 everything else (generic body, details logged).
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Courier service unavailable")]
    CourierUnavailable,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::CourierUnavailable => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(source) = self {
            // Detail stays in the logs, the body stays generic
            tracing::error!(error = %source, "Request failed with internal error");
        }

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(_) => ApiError::NotFound(err.to_string()),
            OrderError::VendorMismatch { .. } => ApiError::Forbidden(err.to_string()),
            OrderError::IllegalTransition { .. }
            | OrderError::AlreadyInStatus(_)
            | OrderError::ConcurrentModification => ApiError::Conflict(err.to_string()),
            OrderError::MissingTrackingInfo | OrderError::UnknownStatus(_) => {
                ApiError::BadRequest(err.to_string())
            }
        }
    }
}

impl From<VendorError> for ApiError {
    fn from(err: VendorError) -> Self {
        match err {
            VendorError::NotFound(_) => ApiError::NotFound(err.to_string()),
            VendorError::IllegalKycTransition { .. } | VendorError::AlreadyInStatus(_) => {
                ApiError::Conflict(err.to_string())
            }
            VendorError::UnknownKycStatus(_) => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) => ApiError::NotFound(err.to_string()),
            CatalogError::VendorMismatch { .. } => ApiError::Forbidden(err.to_string()),
            CatalogError::EmptyName
            | CatalogError::EmptyCategory
            | CatalogError::InvalidPrice(_)
            | CatalogError::InvalidStock(_) => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotFound(_) | PaymentError::PayoutNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            PaymentError::IllegalTransition { .. }
            | PaymentError::IllegalPayoutTransition { .. } => ApiError::Conflict(err.to_string()),
            PaymentError::InsufficientBalance { .. }
            | PaymentError::NonPositiveAmount(_)
            | PaymentError::UnknownStatus(_) => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<SupportError> for ApiError {
    fn from(err: SupportError) -> Self {
        match err {
            SupportError::NotFound(_) => ApiError::NotFound(err.to_string()),
            SupportError::TicketClosed(_) => ApiError::Conflict(err.to_string()),
            SupportError::MissingFields | SupportError::UnknownStatus(_) => {
                ApiError::BadRequest(err.to_string())
            }
        }
    }
}

impl From<PromoError> for ApiError {
    fn from(err: PromoError) -> Self {
        match err {
            PromoError::NotFound(_) => ApiError::NotFound(err.to_string()),
            PromoError::EmptyCode
            | PromoError::RateOutOfRange(_)
            | PromoError::InvertedWindow => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<CourierError> for ApiError {
    fn from(err: CourierError) -> Self {
        match err {
            CourierError::Unavailable => ApiError::CourierUnavailable,
            CourierError::Request(_) | CourierError::Token(_) => {
                tracing::error!(error = %err, "Courier call failed");
                ApiError::CourierUnavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(OrderError::NotFound(Uuid::new_v4())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(OrderError::VendorMismatch {
                order_id: Uuid::new_v4(),
                vendor_id: Uuid::new_v4(),
            })
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(OrderError::IllegalTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Shipped,
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(OrderError::MissingTrackingInfo).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(CourierError::Unavailable).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_error_body_has_error_field() {
        let response = ApiError::NotFound("Order not found".to_string()).error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_error_body_is_generic() {
        let err = ApiError::Internal(anyhow::anyhow!("connection pool exhausted"));
        // The client-visible message must not leak the cause
        assert_eq!(err.to_string(), "Internal server error");
    }
}
