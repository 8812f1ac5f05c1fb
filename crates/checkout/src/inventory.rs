//! Stock decrements on payment confirmation.

use common::Version;
use domain::{Order, StockAdjustment};
use store::PaymentLedger;

use crate::error::Result;

/// Takes a paid order's items out of stock.
///
/// The order write and its floor-at-zero decrements are committed together
/// through the [`PaymentLedger`]. Missing products, colors or sizes never
/// fail: they come back as [`StockAdjustment::Skipped`] and are logged at
/// `warn`.
#[derive(Clone)]
pub struct InventoryAdjuster<L> {
    ledger: L,
}

impl<L: PaymentLedger> InventoryAdjuster<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Saves `order` (already moved to `processing`) if it is still at
    /// `expected` and decrements stock for every item.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id(), lines = order.items().len()))]
    pub async fn commit_paid_order(
        &self,
        order: Order,
        expected: Version,
    ) -> Result<(Order, Vec<StockAdjustment>)> {
        let decrements = order.stock_decrements();
        let (order, adjustments) = self
            .ledger
            .commit_payment(order, expected, &decrements)
            .await?;
        record(&adjustments);
        Ok((order, adjustments))
    }
}

fn record(adjustments: &[StockAdjustment]) {
    for adjustment in adjustments {
        match adjustment {
            StockAdjustment::Applied {
                product_id,
                color,
                size,
                previous,
                remaining,
            } => {
                metrics::counter!("stock_decrements_total").increment(1);
                tracing::info!(%product_id, %color, %size, previous, remaining, "stock decremented");
            }
            StockAdjustment::Skipped {
                product_id,
                color,
                size,
                reason,
            } => {
                metrics::counter!("stock_adjustments_skipped_total").increment(1);
                tracing::warn!(%product_id, %color, %size, ?reason, "stock adjustment skipped");
            }
        }
    }
}
