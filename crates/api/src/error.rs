//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::{CheckoutError, GatewayError};
use domain::{OrderError, ProfileError, ReviewError};
use reports::ReportError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
///
/// Every variant renders as `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed input.
    BadRequest(String),
    /// Missing or invalid identity.
    Unauthorized(String),
    /// Authenticated but not allowed.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Checkout operation error.
    Checkout(CheckoutError),
    /// Report error.
    Report(ReportError),
    /// Store error outside checkout.
    Store(StoreError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Report(ReportError::Store(err)) | ApiError::Store(err) => {
                store_error_to_response(err)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        metrics::counter!("api_errors_total", "status" => status.as_u16().to_string())
            .increment(1);
        if status.is_server_error() {
            tracing::error!(%status, error = %message, "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match err {
        CheckoutError::Store(err) => store_error_to_response(err),
        CheckoutError::OrderNotFound(_)
        | CheckoutError::ProductNotFound(_)
        | CheckoutError::CouponNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CheckoutError::PaymentVerification(_) | CheckoutError::InvalidThreshold(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        CheckoutError::Gateway(GatewayError::InvalidAmount(_)) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        CheckoutError::Gateway(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
        CheckoutError::Order(OrderError::InvalidTransition { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        CheckoutError::Order(_) | CheckoutError::Coupon(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
    }
}

fn store_error_to_response(err: StoreError) -> (StatusCode, String) {
    match &err {
        StoreError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        StoreError::ConcurrencyConflict { .. }
        | StoreError::DuplicateOrder(_)
        | StoreError::DuplicateCoupon(_) => (StatusCode::CONFLICT, err.to_string()),
        StoreError::Database(_) | StoreError::Migration(_) | StoreError::Serialization(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        ApiError::Report(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
