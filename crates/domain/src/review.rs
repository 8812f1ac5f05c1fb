//! Customer product reviews.

use chrono::{DateTime, Utc};
use common::{ProductId, ReviewId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest and highest star rating a review may carry.
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReviewError {
    #[error("Invalid rating {0} (must be between 1 and 5)")]
    InvalidRating(i64),

    #[error("Review comment is required")]
    EmptyComment,
}

/// Input for [`Review::write`].
#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: ProductId,
    pub user_id: UserId,
    /// Display name shown next to the review.
    pub user_name: String,
    pub rating: i64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn write(new: NewReview) -> Result<Self, ReviewError> {
        let rating = u8::try_from(new.rating)
            .ok()
            .filter(|r| RATING_RANGE.contains(r))
            .ok_or(ReviewError::InvalidRating(new.rating))?;

        let comment = new.comment.trim();
        if comment.is_empty() {
            return Err(ReviewError::EmptyComment);
        }

        Ok(Self {
            id: ReviewId::new(),
            product_id: new.product_id,
            user_id: new.user_id,
            user_name: new.user_name,
            rating,
            comment: comment.to_string(),
            created_at: new.created_at,
        })
    }
}
