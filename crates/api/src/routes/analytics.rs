//! Admin analytics endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use reports::{DashboardSummary, InventoryRow};
use store::Store;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /analytics/dashboard
pub async fn dashboard<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
) -> Result<Json<DashboardSummary>, ApiError> {
    Ok(Json(state.reports.dashboard().await?))
}

/// GET /analytics/inventory
pub async fn inventory<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
) -> Result<Json<Vec<InventoryRow>>, ApiError> {
    Ok(Json(state.reports.inventory().await?))
}
