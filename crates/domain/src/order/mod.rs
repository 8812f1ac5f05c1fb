//! Orders, their items and the status state machine.

mod model;
mod status;
mod value_objects;

pub use model::{NewOrder, Order};
pub use status::{OrderStatus, UnknownStatus};
pub use value_objects::{OrderItem, OrderPricing, ShippingAddress};

use common::{OrderId, ProductId};
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The requested status change is not in the transition table.
    #[error("Invalid status transition: cannot move order {order_id} from {from} to {to}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// An order must contain at least one item.
    #[error("Order has no items")]
    NoItems,

    /// Item quantities must be positive.
    #[error("Invalid quantity {quantity} for product {product_id} (must be greater than 0)")]
    InvalidQuantity {
        product_id: ProductId,
        quantity: u32,
    },

    /// Item prices must not be negative.
    #[error("Invalid price {price} for product {product_id}")]
    InvalidPrice { product_id: ProductId, price: i64 },

    /// The gateway order id supplied with a payment does not belong to this order.
    #[error("Gateway order {supplied} does not match order {order_id}")]
    GatewayOrderMismatch { order_id: OrderId, supplied: String },
}
