//! Customer profile and wishlist endpoints.
//!
//! Identities come from outside this service, so a profile is created the
//! first time a customer writes to it. Reads before that return the
//! starting profile without storing it.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::ProductId;
use domain::{ProfileUpdate, UserProfile};
use serde::Deserialize;
use store::Store;

use crate::auth::{AuthUser, Identity};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WishlistRequest {
    pub product_id: String,
}

/// GET /profile
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(load_or_new(&state, identity).await?))
}

/// PUT /profile: partial update of name and shipping address.
#[tracing::instrument(skip(state, user, update), fields(user_id = %user.0.user_id))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, ApiError> {
    let identity = user.0;
    let mut profile = load_or_new(&state, identity).await?;
    profile.apply(update)?;
    Ok(Json(state.store.save_profile(profile).await?))
}

/// POST /profile/wishlist
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.0.user_id, product_id = %req.product_id))]
pub async fn add_to_wishlist<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Json(req): Json<WishlistRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let identity = user.0;
    let product_id = ProductId::new(req.product_id);
    if state.store.get_product(&product_id).await?.is_none() {
        return Err(ApiError::NotFound("Product not found".to_string()));
    }

    let mut profile = load_or_new(&state, identity).await?;
    if !profile.add_to_wishlist(product_id) {
        return Ok(Json(profile));
    }
    Ok(Json(state.store.save_profile(profile).await?))
}

/// DELETE /profile/wishlist/{product_id}. Removing an absent product is a no-op.
#[tracing::instrument(skip(state, user), fields(user_id = %user.0.user_id))]
pub async fn remove_from_wishlist<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(product_id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let identity = user.0;
    let mut profile = load_or_new(&state, identity).await?;
    if !profile.remove_from_wishlist(&ProductId::new(product_id)) {
        return Ok(Json(profile));
    }
    Ok(Json(state.store.save_profile(profile).await?))
}

async fn load_or_new<S: Store>(
    state: &AppState<S>,
    identity: Identity,
) -> Result<UserProfile, ApiError> {
    Ok(state
        .store
        .get_profile(identity.user_id)
        .await?
        .unwrap_or_else(|| UserProfile::new(identity.user_id, identity.email, state.clock.now())))
}
