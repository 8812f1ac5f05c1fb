//! Catalog products and per-variant stock arithmetic.
//!
//! Stock lives on the product as `color → size → count`. Counts are
//! unsigned and every decrement floors at zero, so stock can never go
//! negative no matter how often a decrement is replayed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::money::Money;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    #[serde(default)]
    pub alt: String,
}

/// Color-specific stock record, keyed by size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub color: String,
    #[serde(default)]
    pub color_code: String,
    pub sizes: BTreeMap<String, u32>,
}

impl ProductVariant {
    pub fn total_stock(&self) -> u64 {
        self.sizes.values().map(|&count| u64::from(count)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

fn default_category() -> String {
    "shirts".to_string()
}

/// Request to take `quantity` units of one product/color/size out of stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDecrement {
    pub product_id: ProductId,
    pub color: String,
    pub size: String,
    pub quantity: u32,
}

/// Why a decrement was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ProductNotFound,
    ColorNotFound,
    SizeNotFound,
}

/// Outcome of a single decrement.
///
/// Missing catalog data yields `Skipped` instead of an error so a payment
/// confirmation is never blocked by an inconsistent catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StockAdjustment {
    Applied {
        product_id: ProductId,
        color: String,
        size: String,
        previous: u32,
        remaining: u32,
    },
    Skipped {
        product_id: ProductId,
        color: String,
        size: String,
        reason: SkipReason,
    },
}

impl StockAdjustment {
    pub fn skipped(decrement: &StockDecrement, reason: SkipReason) -> Self {
        StockAdjustment::Skipped {
            product_id: decrement.product_id.clone(),
            color: decrement.color.clone(),
            size: decrement.size.clone(),
            reason,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, StockAdjustment::Applied { .. })
    }
}

/// `max(0, stock - quantity)`
pub fn floor_decrement(stock: u32, quantity: u32) -> u32 {
    stock.saturating_sub(quantity)
}

impl Product {
    pub fn variant(&self, color: &str) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.color == color)
    }

    pub fn stock(&self, color: &str, size: &str) -> Option<u32> {
        self.variant(color)?.sizes.get(size).copied()
    }

    /// Sum of every size of every variant.
    pub fn total_stock(&self) -> u64 {
        self.variants.iter().map(ProductVariant::total_stock).sum()
    }

    /// Applies a floor-at-zero decrement to the matching color/size.
    pub fn apply_decrement(&mut self, decrement: &StockDecrement) -> StockAdjustment {
        let Some(variant) = self
            .variants
            .iter_mut()
            .find(|v| v.color == decrement.color)
        else {
            return StockAdjustment::skipped(decrement, SkipReason::ColorNotFound);
        };

        let Some(count) = variant.sizes.get_mut(&decrement.size) else {
            return StockAdjustment::skipped(decrement, SkipReason::SizeNotFound);
        };

        let previous = *count;
        *count = floor_decrement(previous, decrement.quantity);

        StockAdjustment::Applied {
            product_id: decrement.product_id.clone(),
            color: decrement.color.clone(),
            size: decrement.size.clone(),
            previous,
            remaining: *count,
        }
    }
}
