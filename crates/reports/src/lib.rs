//! Admin analytics for the storefront.
//!
//! Reports are computed on demand from the order and catalog stores:
//! - [`DashboardSummary`]: order totals, paid revenue, recent orders and
//!   per-status counts
//! - [`InventoryRow`]: per product stock totals with the variant map

pub mod dashboard;
pub mod error;
pub mod inventory;

use std::time::Instant;

use store::{CatalogStore, OrderQuery, OrderStore};

pub use dashboard::{DashboardSummary, OrderTally, RECENT_ORDER_LIMIT};
pub use error::{ReportError, Result};
pub use inventory::InventoryRow;

/// Builds admin reports from a store.
#[derive(Clone)]
pub struct AdminReports<S> {
    store: S,
}

impl<S> AdminReports<S>
where
    S: OrderStore + CatalogStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Streams every order once to tally counts and revenue, then reads the
    /// newest orders and the catalog size.
    #[tracing::instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardSummary> {
        let started = Instant::now();

        let tally = OrderTally::from_stream(self.store.stream_orders().await?).await?;
        let recent_orders = self
            .store
            .list_orders(OrderQuery::new().limit(RECENT_ORDER_LIMIT))
            .await?;
        let total_products = self.store.list_products().await?.len() as u64;

        let summary = DashboardSummary::new(tally, total_products, recent_orders);
        record("dashboard", started);
        tracing::debug!(
            total_orders = summary.total_orders,
            total_revenue = %summary.total_revenue,
            "dashboard built"
        );
        Ok(summary)
    }

    /// Stock totals for every product, newest product first.
    #[tracing::instrument(skip(self))]
    pub async fn inventory(&self) -> Result<Vec<InventoryRow>> {
        let started = Instant::now();
        let rows = self
            .store
            .list_products()
            .await?
            .into_iter()
            .map(InventoryRow::from)
            .collect::<Vec<_>>();

        record("inventory", started);
        Ok(rows)
    }
}

fn record(report: &'static str, started: Instant) {
    metrics::counter!("reports_generated_total", "report" => report).increment(1);
    metrics::histogram!("report_build_duration_seconds", "report" => report)
        .record(started.elapsed().as_secs_f64());
}
