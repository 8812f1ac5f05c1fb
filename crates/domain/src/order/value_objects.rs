//! Value objects for the order domain.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Snapshot of one cart line at the moment the order was placed.
///
/// Name and price are copied from the catalog so later product edits never
/// change historical orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub color: String,
    pub size: String,
    pub quantity: u32,
    /// Unit price at the time of purchase.
    pub price: Money,
}

impl OrderItem {
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        color: impl Into<String>,
        size: impl Into<String>,
        quantity: u32,
        price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            color: color.into(),
            size: size.into(),
            quantity,
            price,
        }
    }

    /// quantity × unit price, `None` if it does not fit in [`Money`].
    pub fn line_total(&self) -> Option<Money> {
        self.price.checked_times(self.quantity)
    }
}

/// Shipping address copied onto the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl Default for ShippingAddress {
    fn default() -> Self {
        Self {
            name: String::new(),
            phone: String::new(),
            address_line1: String::new(),
            address_line2: None,
            city: String::new(),
            state: String::new(),
            postal_code: String::new(),
            country: "India".to_string(),
        }
    }
}

/// The three amounts recorded on every order.
///
/// `final_amount` is always `max(0, total_amount - discount_amount)`; the
/// only way to build one is through [`OrderPricing::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredPricing")]
pub struct OrderPricing {
    total_amount: Money,
    discount_amount: Money,
    final_amount: Money,
}

impl OrderPricing {
    pub fn new(total_amount: Money, discount_amount: Money) -> Self {
        Self {
            total_amount,
            discount_amount,
            final_amount: total_amount.saturating_sub_floor(discount_amount),
        }
    }

    /// Pricing with no discount applied.
    pub fn full_price(total_amount: Money) -> Self {
        Self::new(total_amount, Money::zero())
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn discount_amount(&self) -> Money {
        self.discount_amount
    }

    pub fn final_amount(&self) -> Money {
        self.final_amount
    }
}

/// Stored form; `final_amount` is recomputed on load.
#[derive(Deserialize)]
struct StoredPricing {
    total_amount: Money,
    discount_amount: Money,
}

impl From<StoredPricing> for OrderPricing {
    fn from(stored: StoredPricing) -> Self {
        OrderPricing::new(stored.total_amount, stored.discount_amount)
    }
}
