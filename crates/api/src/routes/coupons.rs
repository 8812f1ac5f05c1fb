//! Coupon validation and administration endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::CreateCoupon;
use common::CouponId;
use domain::{Coupon, CouponEvaluation, Discount, Money};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ValidateCouponRequest {
    pub code: String,
    /// Minor currency units.
    pub cart_total: Money,
}

#[derive(Debug, Serialize)]
pub struct ValidateCouponResponse {
    pub valid: bool,
    #[serde(flatten)]
    pub evaluation: CouponEvaluation,
}

#[derive(Debug, Deserialize)]
pub struct CreateCouponRequest {
    pub code: String,
    /// `{"type": "fixed", "value": <minor units>}` or
    /// `{"type": "percentage", "value": <0-100>}`.
    pub discount: Discount,
    #[serde(default)]
    pub min_purchase: Money,
    /// RFC 3339.
    #[serde(default)]
    pub expiry_date: Option<String>,
}

/// POST /coupons/validate (public dry run).
#[tracing::instrument(skip(state, req), fields(code = %req.code))]
pub async fn validate<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<ValidateCouponRequest>,
) -> Result<Json<ValidateCouponResponse>, ApiError> {
    if req.cart_total.is_negative() {
        return Err(ApiError::BadRequest("cart_total must not be negative".to_string()));
    }

    let evaluation = state
        .lifecycle
        .coupons()
        .validate(req.cart_total, &req.code)
        .await?;

    Ok(Json(ValidateCouponResponse {
        valid: evaluation.is_applied(),
        evaluation,
    }))
}

/// GET /coupons (admin)
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
) -> Result<Json<Vec<Coupon>>, ApiError> {
    Ok(Json(state.lifecycle.coupons().list().await?))
}

/// POST /coupons (admin)
#[tracing::instrument(skip(state, _admin, req), fields(code = %req.code))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Json(req): Json<CreateCouponRequest>,
) -> Result<(StatusCode, Json<Coupon>), ApiError> {
    let coupon = state
        .lifecycle
        .coupons()
        .create(CreateCoupon {
            code: req.code,
            discount: req.discount,
            min_purchase: req.min_purchase,
            expiry_date: req.expiry_date,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(coupon)))
}

/// DELETE /coupons/{id} (admin)
#[tracing::instrument(skip(state, _admin))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let coupon_id = CouponId::parse(&id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid coupon id: {e}")))?;
    state.lifecycle.coupons().delete(coupon_id).await?;

    Ok(Json(serde_json::json!({ "message": "Coupon deleted successfully" })))
}
