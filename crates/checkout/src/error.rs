//! Checkout error types.

use common::{CouponId, OrderId, ProductId};
use domain::{CouponError, OrderError};
use store::StoreError;
use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can occur during checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Order does not exist or is not visible to the caller.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A cart line references a product missing from the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Coupon not found: {0}")]
    CouponNotFound(CouponId),

    /// Abandonment threshold is negative or reaches past the clock's range.
    #[error("Invalid abandonment threshold: {0}")]
    InvalidThreshold(chrono::Duration),

    /// The gateway rejected the payment signature.
    #[error("Payment verification failed: {0}")]
    PaymentVerification(String),

    /// The gateway could not be reached or refused the request.
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Order rule violation.
    #[error("{0}")]
    Order(#[from] OrderError),

    /// Coupon rule violation.
    #[error("{0}")]
    Coupon(#[from] CouponError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
