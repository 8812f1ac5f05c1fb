//! Domain error types.

use thiserror::Error;

use crate::coupon::CouponError;
use crate::order::OrderError;

/// Errors raised by domain rules.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Coupon error: {0}")]
    Coupon(#[from] CouponError),
}
