//! Order status state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The status of an order in its lifecycle.
///
/// Allowed transitions:
/// ```text
/// Pending ──► Processing ──► Shipped ──► Delivered
///   │  │          │
///   │  │          └──► Cancelled
///   │  └──► Cancelled
///   └──► Abandoned ──► Processing (late payment)
///              └──► Cancelled
/// ```
/// `Shipped → Shipped` is also accepted so tracking details can be corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created, waiting for the customer to pay.
    #[default]
    Pending,

    /// Payment verified, stock decremented.
    Processing,

    /// Handed to a courier.
    Shipped,

    /// Received by the customer (terminal).
    Delivered,

    /// Cancelled by an admin (terminal).
    Cancelled,

    /// Left unpaid past the abandonment window.
    Abandoned,
}

/// Returned when parsing a status string outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid status '{0}': expected one of pending, processing, shipped, delivered, cancelled, abandoned")]
pub struct UnknownStatus(pub String);

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Abandoned,
    ];

    /// Statuses reachable from this one.
    pub fn allowed_transitions(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[
                OrderStatus::Processing,
                OrderStatus::Cancelled,
                OrderStatus::Abandoned,
            ],
            OrderStatus::Abandoned => &[OrderStatus::Processing, OrderStatus::Cancelled],
            OrderStatus::Processing => &[OrderStatus::Shipped, OrderStatus::Cancelled],
            OrderStatus::Shipped => &[OrderStatus::Shipped, OrderStatus::Delivered],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Returns true if a payment may be verified in this status.
    pub fn awaits_payment(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Abandoned)
    }

    /// Returns true if the order has been paid for and not cancelled.
    pub fn counts_as_revenue(&self) -> bool {
        matches!(
            self,
            OrderStatus::Processing | OrderStatus::Shipped | OrderStatus::Delivered
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Abandoned => "abandoned",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
