//! Checkout, payment verification and order management endpoints.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use checkout::{CartLine, CreateOrder, UpdateStatus, VerifyPayment};
use common::OrderId;
use domain::{Money, Order, OrderStatus, ShippingAddress};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    #[serde(alias = "razorpay_order_id")]
    pub gateway_order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    pub gateway_payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
    pub tracking_number: Option<String>,
    pub courier: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    pub status: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order_id: OrderId,
    pub gateway_order_id: String,
    /// Minor currency units, exactly what the gateway was asked to charge.
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
    pub total_amount: Money,
    pub discount_amount: Money,
    pub final_amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: &'static str,
    pub order: Order,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdatedResponse {
    pub message: &'static str,
    pub order: Order,
}

// -- Handlers --

/// POST /orders/create-gateway-order
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.0.user_id))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    let AuthUser(identity) = user;
    let created = state
        .lifecycle
        .create_order(CreateOrder {
            user_id: identity.user_id,
            user_email: identity.email,
            lines: req.items,
            shipping_address: req.shipping_address,
            coupon_code: req.coupon_code,
        })
        .await?;

    let order = &created.order;
    let response = CreateOrderResponse {
        order_id: order.id(),
        gateway_order_id: created.gateway_order.id.clone(),
        amount: created.gateway_order.amount,
        currency: created.gateway_order.currency.clone(),
        key_id: created.key_id.clone(),
        total_amount: order.total_amount(),
        discount_amount: order.discount_amount(),
        final_amount: order.final_amount(),
        coupon_message: created.coupon_message.clone(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /orders/verify-payment
#[tracing::instrument(skip(state, user, req), fields(order_id = %req.order_id))]
pub async fn verify_payment<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, ApiError> {
    let order_id = parse_order_id(&req.order_id)?;
    let confirmation = state
        .lifecycle
        .verify_payment(VerifyPayment {
            user_id: user.0.user_id,
            order_id,
            gateway_order_id: req.gateway_order_id,
            gateway_payment_id: req.gateway_payment_id,
            signature: req.signature,
        })
        .await?;

    Ok(Json(VerifyPaymentResponse {
        success: true,
        message: "Payment verified successfully",
        order: confirmation.order,
    }))
}

/// GET /orders/my-orders: the caller's orders, newest first.
#[tracing::instrument(skip(state, user))]
pub async fn my_orders<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.lifecycle.list_for_user(user.0.user_id).await?))
}

/// GET /orders: every order (admin), optionally filtered by `?status=`.
#[tracing::instrument(skip(state, _admin))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = match params.status.as_deref() {
        Some(status) => state.lifecycle.list_by_status(parse_status(status)?).await?,
        None => state.lifecycle.list_all().await?,
    };
    Ok(Json(orders))
}

/// GET /orders/{id}: visible to the owner and the admin.
#[tracing::instrument(skip(state, user))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.lifecycle.get(order_id).await?;

    let AuthUser(identity) = user;
    if order.user_id() != identity.user_id && !state.is_admin(&identity) {
        return Err(ApiError::NotFound(format!("Order not found: {order_id}")));
    }
    Ok(Json(order))
}

/// PUT /orders/{id}/status (admin).
///
/// The status comes from the JSON body or, as the admin UI sends it, from
/// `?status=`. Body fields win over query fields.
#[tracing::instrument(skip(state, _admin, query, body))]
pub async fn update_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Query(query): Query<UpdateStatusRequest>,
    body: Bytes,
) -> Result<Json<StatusUpdatedResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let body: UpdateStatusRequest = if body.iter().all(u8::is_ascii_whitespace) {
        UpdateStatusRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))?
    };

    let status = body
        .status
        .or(query.status)
        .ok_or_else(|| ApiError::BadRequest("Missing status".to_string()))?;

    let mut cmd = UpdateStatus::new(order_id, parse_status(&status)?);
    cmd.tracking_number = body.tracking_number.or(query.tracking_number);
    cmd.courier = body.courier.or(query.courier);

    let order = state.lifecycle.update_status(cmd).await?;
    Ok(Json(StatusUpdatedResponse {
        message: "Order status updated successfully",
        order,
    }))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    OrderId::parse(id).map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))
}

fn parse_status(status: &str) -> Result<OrderStatus, ApiError> {
    status
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid status: {status}")))
}
