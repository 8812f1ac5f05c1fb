//! Order record and its lifecycle rules.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId, Version};
use serde::{Deserialize, Serialize};

use crate::catalog::StockDecrement;
use crate::money::Money;

use super::{OrderError, OrderItem, OrderPricing, OrderStatus, ShippingAddress};

/// Everything needed to place an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_email: String,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub discount_amount: Money,
    /// Upper-cased code of the coupon that produced `discount_amount`.
    pub coupon_code: Option<String>,
    pub gateway_order_id: String,
    pub placed_at: DateTime<Utc>,
}

/// A customer order.
///
/// The item list and pricing are fixed at creation. Status only moves along
/// the [`OrderStatus`] transition table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    user_email: String,
    items: Vec<OrderItem>,
    shipping_address: ShippingAddress,
    #[serde(flatten)]
    pricing: OrderPricing,
    coupon_code: Option<String>,
    payment_id: Option<String>,
    gateway_order_id: Option<String>,
    status: OrderStatus,
    tracking_number: Option<String>,
    courier: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    version: Version,
}

impl Order {
    /// Prices a list of items with the given discount.
    ///
    /// A line or running total that overflows [`Money`] is reported as an
    /// invalid quantity on the offending item.
    pub fn price(items: &[OrderItem], discount_amount: Money) -> Result<OrderPricing, OrderError> {
        let mut total = Money::zero();
        for item in items {
            total = item
                .line_total()
                .and_then(|line| total.checked_add(line))
                .ok_or_else(|| OrderError::InvalidQuantity {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                })?;
        }
        Ok(OrderPricing::new(total, discount_amount))
    }

    /// Validates the items and builds a `pending` order.
    pub fn place(new: NewOrder) -> Result<Self, OrderError> {
        if new.items.is_empty() {
            return Err(OrderError::NoItems);
        }

        for item in &new.items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                });
            }
            if item.price.is_negative() {
                return Err(OrderError::InvalidPrice {
                    product_id: item.product_id.clone(),
                    price: item.price.minor(),
                });
            }
        }

        let pricing = Self::price(&new.items, new.discount_amount)?;

        Ok(Self {
            id: new.id,
            user_id: new.user_id,
            user_email: new.user_email,
            items: new.items,
            shipping_address: new.shipping_address,
            pricing,
            coupon_code: new.coupon_code,
            payment_id: None,
            gateway_order_id: Some(new.gateway_order_id),
            status: OrderStatus::Pending,
            tracking_number: None,
            courier: None,
            created_at: new.placed_at,
            updated_at: new.placed_at,
            version: Version::initial(),
        })
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    pub fn pricing(&self) -> OrderPricing {
        self.pricing
    }

    pub fn total_amount(&self) -> Money {
        self.pricing.total_amount()
    }

    pub fn discount_amount(&self) -> Money {
        self.pricing.discount_amount()
    }

    /// Amount actually charged.
    pub fn final_amount(&self) -> Money {
        self.pricing.final_amount()
    }

    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_code.as_deref()
    }

    pub fn payment_id(&self) -> Option<&str> {
        self.payment_id.as_deref()
    }

    pub fn gateway_order_id(&self) -> Option<&str> {
        self.gateway_order_id.as_deref()
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn tracking_number(&self) -> Option<&str> {
        self.tracking_number.as_deref()
    }

    pub fn courier(&self) -> Option<&str> {
        self.courier.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Set by the store after a successful write.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// Returns true for a `pending` order created at or before `cutoff`.
    pub fn is_stale(&self, cutoff: DateTime<Utc>) -> bool {
        self.status == OrderStatus::Pending && self.created_at <= cutoff
    }

    /// One stock decrement per item, in item order.
    pub fn stock_decrements(&self) -> Vec<StockDecrement> {
        self.items
            .iter()
            .map(|item| StockDecrement {
                product_id: item.product_id.clone(),
                color: item.color.clone(),
                size: item.size.clone(),
                quantity: item.quantity,
            })
            .collect()
    }
}

// Transitions
impl Order {
    /// Records a verified gateway payment and moves the order to `processing`.
    pub fn record_payment(
        &mut self,
        gateway_order_id: &str,
        payment_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if !self.status.awaits_payment() {
            return Err(self.invalid_transition(OrderStatus::Processing));
        }

        if self.gateway_order_id.as_deref() != Some(gateway_order_id) {
            return Err(OrderError::GatewayOrderMismatch {
                order_id: self.id,
                supplied: gateway_order_id.to_string(),
            });
        }

        self.payment_id = Some(payment_id.into());
        self.status = OrderStatus::Processing;
        self.updated_at = now;
        Ok(())
    }

    /// Admin status change.
    ///
    /// Tracking number and courier are stored whenever they are supplied;
    /// omitted values leave the existing ones untouched.
    pub fn update_status(
        &mut self,
        next: OrderStatus,
        tracking_number: Option<String>,
        courier: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(self.invalid_transition(next));
        }

        self.status = next;
        if tracking_number.is_some() {
            self.tracking_number = tracking_number;
        }
        if courier.is_some() {
            self.courier = courier;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Marks an unpaid order as abandoned.
    pub fn abandon(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        if self.status != OrderStatus::Pending {
            return Err(self.invalid_transition(OrderStatus::Abandoned));
        }

        self.status = OrderStatus::Abandoned;
        self.updated_at = now;
        Ok(())
    }

    fn invalid_transition(&self, to: OrderStatus) -> OrderError {
        OrderError::InvalidTransition {
            order_id: self.id,
            from: self.status,
            to,
        }
    }
}
