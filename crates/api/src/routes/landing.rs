//! Landing page content endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::{LandingPage, LandingPageUpdate};
use store::Store;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /landing-page, falling back to the built-in defaults.
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<LandingPage>, ApiError> {
    let page = state
        .store
        .get_landing_page()
        .await?
        .unwrap_or_else(|| LandingPage::default_at(state.clock.now()));
    Ok(Json(page))
}

/// PUT /landing-page (admin): sets the given fields, creating the page if needed.
#[tracing::instrument(skip(state, _admin, update))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Json(update): Json<LandingPageUpdate>,
) -> Result<Json<LandingPage>, ApiError> {
    let now = state.clock.now();
    let mut page = state
        .store
        .get_landing_page()
        .await?
        .unwrap_or_else(|| LandingPage::default_at(now));
    page.apply(update, now);

    let page = state.store.save_landing_page(page).await?;
    tracing::info!(hero_media_type = %page.hero_media_type, "landing page updated");
    Ok(Json(page))
}
