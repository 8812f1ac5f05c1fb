//! Admin dashboard summary.

use std::collections::BTreeMap;

use domain::{Money, Order, OrderStatus};
use futures_util::TryStreamExt;
use serde::Serialize;
use store::OrderStream;

use crate::Result;

/// Number of orders listed under `recent_orders`.
pub const RECENT_ORDER_LIMIT: usize = 10;

/// Running totals over the order table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTally {
    pub total_orders: u64,
    /// Sum of `final_amount` over paid, non-cancelled orders.
    pub total_revenue: Money,
    /// Every status is present, with zero for unused ones.
    pub status_counts: BTreeMap<&'static str, u64>,
}

impl OrderTally {
    pub fn new() -> Self {
        Self {
            total_orders: 0,
            total_revenue: Money::zero(),
            status_counts: OrderStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect(),
        }
    }

    pub fn add(&mut self, order: &Order) {
        self.total_orders += 1;
        if order.status().counts_as_revenue() {
            self.total_revenue += order.final_amount();
        }
        *self.status_counts.entry(order.status().as_str()).or_default() += 1;
    }

    /// Folds a store stream without holding every order in memory.
    pub async fn from_stream(stream: OrderStream) -> Result<Self> {
        let tally = stream
            .try_fold(Self::new(), |mut tally, order| async move {
                tally.add(&order);
                Ok(tally)
            })
            .await?;
        Ok(tally)
    }
}

impl Default for OrderTally {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> FromIterator<&'a Order> for OrderTally {
    fn from_iter<I: IntoIterator<Item = &'a Order>>(iter: I) -> Self {
        let mut tally = Self::new();
        for order in iter {
            tally.add(order);
        }
        tally
    }
}

/// Response body of the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_orders: u64,
    pub total_revenue: Money,
    pub total_products: u64,
    pub recent_orders: Vec<Order>,
    pub status_counts: BTreeMap<&'static str, u64>,
}

impl DashboardSummary {
    pub fn new(tally: OrderTally, total_products: u64, mut recent_orders: Vec<Order>) -> Self {
        recent_orders.truncate(RECENT_ORDER_LIMIT);
        Self {
            total_orders: tally.total_orders,
            total_revenue: tally.total_revenue,
            total_products,
            recent_orders,
            status_counts: tally.status_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::{OrderId, UserId};
    use domain::{NewOrder, OrderItem, ShippingAddress};
    use futures_util::{StreamExt, stream};

    use super::*;

    fn order(price: i64, discount: i64) -> Order {
        Order::place(NewOrder {
            id: OrderId::new(),
            user_id: UserId::new(),
            user_email: "a@example.com".to_string(),
            items: vec![OrderItem::new("P1", "Tee", "black", "M", 1, Money::from_minor(price))],
            shipping_address: ShippingAddress::default(),
            discount_amount: Money::from_minor(discount),
            coupon_code: None,
            gateway_order_id: "order_0001".to_string(),
            placed_at: Utc::now(),
        })
        .unwrap()
    }

    fn paid(price: i64, discount: i64) -> Order {
        let mut order = order(price, discount);
        order.record_payment("order_0001", "pay_1", Utc::now()).unwrap();
        order
    }

    #[test]
    fn revenue_counts_paid_final_amounts_only() {
        let mut cancelled = paid(900, 0);
        cancelled
            .update_status(OrderStatus::Cancelled, None, None, Utc::now())
            .unwrap();
        let orders = [paid(1000, 100), order(5000, 0), cancelled];

        let tally: OrderTally = orders.iter().collect();
        assert_eq!(tally.total_orders, 3);
        assert_eq!(tally.total_revenue, Money::from_minor(900));
        assert_eq!(tally.status_counts["processing"], 1);
        assert_eq!(tally.status_counts["pending"], 1);
        assert_eq!(tally.status_counts["cancelled"], 1);
        assert_eq!(tally.status_counts["delivered"], 0);
        assert_eq!(tally.status_counts.len(), OrderStatus::ALL.len());
    }

    #[tokio::test]
    async fn tally_from_stream() {
        let orders = vec![Ok(paid(1000, 0)), Ok(paid(2000, 500))];
        let tally = OrderTally::from_stream(stream::iter(orders).boxed())
            .await
            .unwrap();
        assert_eq!(tally.total_revenue, Money::from_minor(2500));
    }

    #[test]
    fn recent_orders_are_capped() {
        let recent = (0..15).map(|_| order(100, 0)).collect();
        let summary = DashboardSummary::new(OrderTally::new(), 3, recent);
        assert_eq!(summary.recent_orders.len(), RECENT_ORDER_LIMIT);
    }
}
