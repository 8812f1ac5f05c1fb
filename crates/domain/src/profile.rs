//! Customer profiles: display name, default shipping address and wishlist.

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::ShippingAddress;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("No valid fields to update")]
    NothingToUpdate,

    #[error("Profile name must not be empty")]
    EmptyName,
}

/// Partial profile update. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
    /// Product ids in the order they were added, without duplicates.
    #[serde(default)]
    pub wishlist: Vec<ProductId>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Starting profile for an identity seen for the first time. The name
    /// defaults to the email address.
    pub fn new(user_id: UserId, email: impl Into<String>, now: DateTime<Utc>) -> Self {
        let email = email.into();
        Self {
            user_id,
            name: email.clone(),
            email,
            shipping_address: ShippingAddress::default(),
            wishlist: Vec::new(),
            created_at: now,
        }
    }

    pub fn apply(&mut self, update: ProfileUpdate) -> Result<(), ProfileError> {
        if update.name.is_none() && update.shipping_address.is_none() {
            return Err(ProfileError::NothingToUpdate);
        }

        let name = match update.name {
            Some(name) if name.trim().is_empty() => return Err(ProfileError::EmptyName),
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(address) = update.shipping_address {
            self.shipping_address = address;
        }
        Ok(())
    }

    /// Returns false if the product was already on the wishlist.
    pub fn add_to_wishlist(&mut self, product_id: ProductId) -> bool {
        if self.wishlist.contains(&product_id) {
            return false;
        }
        self.wishlist.push(product_id);
        true
    }

    /// Returns false if the product was not on the wishlist.
    pub fn remove_from_wishlist(&mut self, product_id: &ProductId) -> bool {
        let before = self.wishlist.len();
        self.wishlist.retain(|id| id != product_id);
        self.wishlist.len() != before
    }
}
