//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catalog::CatalogError;
use orders::OrderError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Webhook token missing or wrong. Carries no detail so callers learn
    /// nothing about order existence.
    Unauthorized,
    /// Domain precondition failed (illegal status transition).
    Conflict(String),
    /// The payment gateway failed; the caller may retry.
    Upstream(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Conflict(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Upstream(msg) => {
                tracing::warn!(error = %msg, "gateway failure surfaced to caller");
                (StatusCode::BAD_GATEWAY, msg)
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match &err {
            OrderError::EmptyOrder
            | OrderError::InvalidQuantity { .. }
            | OrderError::UnknownProducts { .. } => ApiError::BadRequest(err.to_string()),

            OrderError::NotFound(_)
            | OrderError::UnknownReference(_)
            | OrderError::MissingPaymentRequest(_) => ApiError::NotFound(err.to_string()),

            OrderError::NotPaid(_) | OrderError::NotProcessing { .. } => {
                ApiError::Conflict(err.to_string())
            }

            OrderError::GatewayTimeout | OrderError::Gateway(_) => {
                ApiError::Upstream(err.to_string())
            }

            OrderError::Catalog(catalog_err) => catalog_error_to_api(catalog_err, &err),

            OrderError::Ledger(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        catalog_error_to_api(&err, &err)
    }
}

fn catalog_error_to_api(err: &CatalogError, display: &dyn std::fmt::Display) -> ApiError {
    match err {
        CatalogError::NameTooShort { .. } | CatalogError::PriceBelowMinimum { .. } => {
            ApiError::BadRequest(display.to_string())
        }
        CatalogError::ProductNotFound(_) | CatalogError::CategoryNotFound(_) => {
            ApiError::NotFound(display.to_string())
        }
        CatalogError::CategoryInUse(_) => ApiError::Conflict(display.to_string()),
    }
}
