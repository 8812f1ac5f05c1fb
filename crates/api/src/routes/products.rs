//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::ProductId;
use domain::{Money, Product, ProductImage, ProductVariant};
use serde::Deserialize;
use store::{ProductPage, ProductQuery, Store};

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::state::AppState;

const FEATURED_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ListProductsParams {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl From<ListProductsParams> for ProductQuery {
    fn from(params: ListProductsParams) -> Self {
        let defaults = ProductQuery::default();
        ProductQuery {
            search: params.search,
            sort: params
                .sort
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.sort),
            page: params.page.unwrap_or(defaults.page),
            limit: params.limit.unwrap_or(defaults.limit),
        }
    }
}

/// Body of product create and replace.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    /// Generated when omitted on create; ignored on replace.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

impl ProductRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::BadRequest("Product name is required".to_string()));
        }
        if !self.price.is_positive() {
            return Err(ApiError::BadRequest(format!(
                "Invalid price {} (must be greater than 0)",
                self.price
            )));
        }
        Ok(())
    }

    fn into_product(self, id: ProductId, created_at: chrono::DateTime<chrono::Utc>) -> Product {
        Product {
            id,
            name: self.name.trim().to_string(),
            description: self.description,
            price: self.price,
            images: self.images,
            variants: self.variants,
            category: self.category.unwrap_or_else(|| "shirts".to_string()),
            featured: self.featured,
            created_at,
        }
    }
}

/// GET /products?search=&sort=&page=&limit=
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListProductsParams>,
) -> Result<Json<ProductPage>, ApiError> {
    let query = ProductQuery::from(params);
    let products = state.store.list_products().await?;
    Ok(Json(query.paginate(products)))
}

/// GET /products/featured
pub async fn featured<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state
        .store
        .list_products()
        .await?
        .into_iter()
        .filter(|p| p.featured)
        .take(FEATURED_LIMIT)
        .collect();
    Ok(Json(products))
}

/// GET /products/{id}
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(find(&state, &ProductId::new(id)).await?))
}

/// POST /products (admin)
#[tracing::instrument(skip(state, _admin, req), fields(name = %req.name))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Json(req): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    req.validate()?;
    let id = req
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ProductId::new)
        .unwrap_or_else(ProductId::generate);

    if state.store.get_product(&id).await?.is_some() {
        return Err(ApiError::BadRequest(format!("Product {id} already exists")));
    }

    let product = req.into_product(id, state.clock.now());
    let product = state.store.upsert_product(product).await?;
    tracing::info!(product_id = %product.id, "product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /products/{id} (admin): full replace, keeping id and creation time.
#[tracing::instrument(skip(state, _admin, req))]
pub async fn replace<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<Product>, ApiError> {
    req.validate()?;
    let existing = find(&state, &ProductId::new(id)).await?;

    let product = req.into_product(existing.id, existing.created_at);
    Ok(Json(state.store.upsert_product(product).await?))
}

/// PUT /products/{id}/variants (admin): replaces the stock table.
#[tracing::instrument(skip(state, _admin, variants))]
pub async fn replace_variants<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(variants): Json<Vec<ProductVariant>>,
) -> Result<Json<Product>, ApiError> {
    let mut product = find(&state, &ProductId::new(id)).await?;
    product.variants = variants;

    let product = state.store.upsert_product(product).await?;
    tracing::info!(
        product_id = %product.id,
        total_stock = product.total_stock(),
        "stock replaced"
    );
    Ok(Json(product))
}

/// DELETE /products/{id} (admin)
#[tracing::instrument(skip(state, _admin))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.store.delete_product(&ProductId::new(id)).await? {
        return Err(ApiError::NotFound("Product not found".to_string()));
    }
    Ok(Json(serde_json::json!({ "message": "Product deleted successfully" })))
}

async fn find<S: Store>(state: &AppState<S>, id: &ProductId) -> Result<Product, ApiError> {
    state
        .store
        .get_product(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))
}
