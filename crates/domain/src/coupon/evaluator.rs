//! Pure coupon evaluation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::money::Money;

use super::Coupon;

/// Why a coupon did or did not apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CouponOutcome {
    Applied,
    /// No coupon with that code, or it is switched off.
    NotFound,
    Expired,
    MinimumNotMet { min_purchase: Money },
}

/// Result of evaluating a coupon against a cart total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CouponEvaluation {
    pub code: String,
    pub outcome: CouponOutcome,
    pub discount_amount: Money,
    pub final_amount: Money,
    pub message: String,
}

impl CouponEvaluation {
    pub fn is_applied(&self) -> bool {
        self.outcome == CouponOutcome::Applied
    }

    fn rejected(code: &str, cart_total: Money, rejection: Rejection) -> Self {
        let (outcome, message) = match rejection {
            Rejection::NotFound => (
                CouponOutcome::NotFound,
                format!("Coupon '{code}' not found or inactive"),
            ),
            Rejection::Expired => (
                CouponOutcome::Expired,
                format!("Coupon '{code}' has expired"),
            ),
            Rejection::MinimumNotMet(min_purchase) => (
                CouponOutcome::MinimumNotMet { min_purchase },
                format!("Minimum purchase of {min_purchase} required to use coupon '{code}'"),
            ),
        };

        Self {
            code: code.to_string(),
            outcome,
            discount_amount: Money::zero(),
            final_amount: cart_total,
            message,
        }
    }
}

/// The non-applied outcomes.
#[derive(Debug, Clone, Copy)]
enum Rejection {
    NotFound,
    Expired,
    MinimumNotMet(Money),
}

/// Computes the discount `coupon` grants on `cart_total` at `now`.
///
/// Rules are checked in order: missing/inactive, expired, minimum purchase.
/// Never fails; a rejected coupon yields a zero discount and the full cart
/// total. `final_amount` is floored at zero.
pub fn evaluate(
    cart_total: Money,
    code: &str,
    coupon: Option<&Coupon>,
    now: DateTime<Utc>,
) -> CouponEvaluation {
    let Some(coupon) = coupon.filter(|c| c.is_active) else {
        return CouponEvaluation::rejected(code, cart_total, Rejection::NotFound);
    };

    if coupon.expires_at().is_some_and(|expiry| now > expiry) {
        return CouponEvaluation::rejected(code, cart_total, Rejection::Expired);
    }

    if cart_total < coupon.min_purchase {
        return CouponEvaluation::rejected(
            code,
            cart_total,
            Rejection::MinimumNotMet(coupon.min_purchase),
        );
    }

    let discount_amount = coupon.discount.amount_for(cart_total);

    CouponEvaluation {
        code: code.to_string(),
        outcome: CouponOutcome::Applied,
        discount_amount,
        final_amount: cart_total.saturating_sub_floor(discount_amount),
        message: format!("Coupon '{code}' applied successfully"),
    }
}
