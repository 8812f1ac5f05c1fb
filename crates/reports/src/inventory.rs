//! Stock levels per product.

use common::ProductId;
use domain::{Product, ProductVariant};
use serde::Serialize;

/// One product's stock across every variant and size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryRow {
    pub id: ProductId,
    pub name: String,
    pub total_stock: u64,
    pub variants: Vec<ProductVariant>,
}

impl From<Product> for InventoryRow {
    fn from(product: Product) -> Self {
        Self {
            total_stock: product.total_stock(),
            id: product.id,
            name: product.name,
            variants: product.variants,
        }
    }
}
