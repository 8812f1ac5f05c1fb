//! Admin maintenance endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use domain::Order;
use serde::{Deserialize, Serialize};
use store::Store;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SweepParams {
    /// Overrides the configured threshold.
    pub threshold_hours: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub message: String,
    pub abandoned_count: usize,
    pub orders: Vec<Order>,
}

/// POST /admin/check-abandoned-carts
///
/// Marks stale pending orders as abandoned. No email is sent; the returned
/// orders are what a notifier would pick up.
#[tracing::instrument(skip(state, _admin))]
pub async fn check_abandoned_carts<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Query(params): Query<SweepParams>,
) -> Result<Json<SweepResponse>, ApiError> {
    let orders = match params.threshold_hours {
        Some(hours) => {
            let threshold = chrono::Duration::try_hours(hours)
                .filter(|_| hours >= 0)
                .ok_or_else(|| {
                    ApiError::BadRequest(format!("Invalid threshold_hours: {hours}"))
                })?;
            state
                .lifecycle
                .sweep_abandoned_at(state.clock.now(), threshold)
                .await?
        }
        None => state.lifecycle.sweep_abandoned().await?,
    };

    Ok(Json(SweepResponse {
        message: format!("Marked {} order(s) as abandoned", orders.len()),
        abandoned_count: orders.len(),
        orders,
    }))
}
