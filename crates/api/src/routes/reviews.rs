//! Product review endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::ProductId;
use domain::{NewReview, Review};
use serde::Deserialize;
use store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub product_id: String,
    pub rating: i64,
    pub comment: String,
}

/// POST /reviews
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.0.user_id, product_id = %req.product_id))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let identity = user.0;
    let product_id = ProductId::new(req.product_id);
    if state.store.get_product(&product_id).await?.is_none() {
        return Err(ApiError::NotFound("Product not found".to_string()));
    }

    let user_name = state
        .store
        .get_profile(identity.user_id)
        .await?
        .map(|profile| profile.name)
        .unwrap_or(identity.email);

    let review = Review::write(NewReview {
        product_id,
        user_id: identity.user_id,
        user_name,
        rating: req.rating,
        comment: req.comment,
        created_at: state.clock.now(),
    })?;
    let review = state.store.insert_review(review).await?;

    metrics::counter!("reviews_created_total").increment(1);
    tracing::info!(review_id = %review.id, rating = review.rating, "review created");
    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /reviews/{product_id}, newest first.
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(product_id): Path<String>,
) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(
        state.store.list_reviews(&ProductId::new(product_id)).await?,
    ))
}
