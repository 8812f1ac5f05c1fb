use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::UserId;
use domain::{Order, OrderStatus, Product};
use serde::{Deserialize, Serialize};

/// Builder for order listings.
///
/// Results are always ordered newest first.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    /// Only orders placed by this user.
    pub user_id: Option<UserId>,

    /// Only orders in any of these statuses.
    pub statuses: Option<Vec<OrderStatus>>,

    /// Only orders created at or before this instant.
    pub created_at_or_before: Option<DateTime<Utc>>,

    /// Maximum number of orders to return.
    pub limit: Option<usize>,
}

impl OrderQuery {
    /// Creates a query matching every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for one user's orders.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    /// Pending orders created at or before `cutoff`.
    pub fn stale_pending(cutoff: DateTime<Utc>) -> Self {
        Self::new()
            .status(OrderStatus::Pending)
            .created_at_or_before(cutoff)
    }

    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Adds a status to the accepted set.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.statuses.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn created_at_or_before(mut self, cutoff: DateTime<Utc>) -> Self {
        self.created_at_or_before = Some(cutoff);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if `order` passes every filter.
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(user_id) = self.user_id
            && order.user_id() != user_id
        {
            return false;
        }
        if let Some(ref statuses) = self.statuses
            && !statuses.contains(&order.status())
        {
            return false;
        }
        if let Some(cutoff) = self.created_at_or_before
            && order.created_at() > cutoff
        {
            return false;
        }
        true
    }

    pub(crate) fn status_strings(&self) -> Option<Vec<String>> {
        self.statuses
            .as_ref()
            .map(|statuses| statuses.iter().map(|s| s.as_str().to_string()).collect())
    }
}

/// Catalog listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductSort {
    #[default]
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "price-low")]
    PriceLow,
    #[serde(rename = "price-high")]
    PriceHigh,
}

impl FromStr for ProductSort {
    type Err = std::convert::Infallible;

    /// Unknown values sort by name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "price-low" => ProductSort::PriceLow,
            "price-high" => ProductSort::PriceHigh,
            _ => ProductSort::Name,
        })
    }
}

/// Largest page `paginate` will return.
pub const MAX_PAGE_SIZE: usize = 100;

/// Search, sort and pagination over the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// Case-insensitive substring of name or description.
    pub search: Option<String>,
    pub sort: ProductSort,
    /// 1-based.
    pub page: usize,
    pub limit: usize,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort: ProductSort::Name,
            page: 1,
            limit: 12,
        }
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total_products: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

impl ProductQuery {
    pub fn matches(&self, product: &Product) -> bool {
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                product.name.to_lowercase().contains(&term)
                    || product.description.to_lowercase().contains(&term)
            }
        }
    }

    /// Filters, sorts and slices `products` into the requested page.
    pub fn paginate(&self, products: Vec<Product>) -> ProductPage {
        let mut matching: Vec<Product> = products.into_iter().filter(|p| self.matches(p)).collect();
        match self.sort {
            ProductSort::Name => matching.sort_by(|a, b| a.name.cmp(&b.name)),
            ProductSort::PriceLow => matching.sort_by_key(|p| p.price),
            ProductSort::PriceHigh => matching.sort_by(|a, b| b.price.cmp(&a.price)),
        }

        let limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        let page = self.page.max(1);
        let total_products = matching.len();

        ProductPage {
            products: matching
                .into_iter()
                .skip((page - 1).saturating_mul(limit))
                .take(limit)
                .collect(),
            total_products,
            total_pages: total_products.div_ceil(limit),
            current_page: page,
        }
    }
}
