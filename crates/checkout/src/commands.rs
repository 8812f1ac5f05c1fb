//! Inputs to the checkout operations.

use common::{OrderId, ProductId, UserId};
use domain::{Discount, Money, OrderStatus, ShippingAddress};
use serde::{Deserialize, Serialize};

/// One cart line as submitted by the client.
///
/// Prices are not accepted from the client; they are read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub color: String,
    pub size: String,
    pub quantity: u32,
}

/// Places an order for the authenticated user.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub user_id: UserId,
    pub user_email: String,
    pub lines: Vec<CartLine>,
    pub shipping_address: ShippingAddress,
    pub coupon_code: Option<String>,
}

/// Confirms a gateway payment for an order.
#[derive(Debug, Clone)]
pub struct VerifyPayment {
    /// Caller; must own the order.
    pub user_id: UserId,
    pub order_id: OrderId,
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
}

/// Admin status change.
#[derive(Debug, Clone)]
pub struct UpdateStatus {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub courier: Option<String>,
}

impl UpdateStatus {
    pub fn new(order_id: OrderId, status: OrderStatus) -> Self {
        Self {
            order_id,
            status,
            tracking_number: None,
            courier: None,
        }
    }

    pub fn with_tracking(mut self, tracking_number: impl Into<String>, courier: impl Into<String>) -> Self {
        self.tracking_number = Some(tracking_number.into());
        self.courier = Some(courier.into());
        self
    }
}

/// Admin coupon creation.
#[derive(Debug, Clone)]
pub struct CreateCoupon {
    pub code: String,
    pub discount: Discount,
    pub min_purchase: Money,
    /// RFC 3339 timestamp.
    pub expiry_date: Option<String>,
}
