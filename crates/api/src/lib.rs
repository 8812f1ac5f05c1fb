//! HTTP API server for the storefront backend.
//!
//! Provides REST endpoints for checkout, payment verification, order
//! management, coupons, the catalog, reviews, customer profiles, landing page
//! content and admin analytics, with structured logging (tracing) and
//! Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    use routes::{admin, analytics, coupons, landing, orders, products, profile, reviews, system};

    let metrics_router = Router::new()
        .route("/metrics", get(system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(system::health::<S>))
        // Orders
        .route("/orders", get(orders::list::<S>))
        .route("/orders/create-gateway-order", post(orders::create::<S>))
        .route("/orders/verify-payment", post(orders::verify_payment::<S>))
        .route("/orders/my-orders", get(orders::my_orders::<S>))
        .route("/orders/{id}", get(orders::get::<S>))
        .route("/orders/{id}/status", put(orders::update_status::<S>))
        .route(
            "/admin/check-abandoned-carts",
            post(admin::check_abandoned_carts::<S>),
        )
        // Coupons
        .route("/coupons", get(coupons::list::<S>).post(coupons::create::<S>))
        .route("/coupons/validate", post(coupons::validate::<S>))
        .route("/coupons/{id}", delete(coupons::delete::<S>))
        // Catalog
        .route("/products", get(products::list::<S>).post(products::create::<S>))
        .route("/products/featured", get(products::featured::<S>))
        .route(
            "/products/{id}",
            get(products::get::<S>)
                .put(products::replace::<S>)
                .delete(products::delete::<S>),
        )
        .route("/products/{id}/variants", put(products::replace_variants::<S>))
        // Reviews
        .route("/reviews", post(reviews::create::<S>))
        .route("/reviews/{product_id}", get(reviews::list::<S>))
        // Profile
        .route("/profile", get(profile::get::<S>).put(profile::update::<S>))
        .route("/profile/wishlist", post(profile::add_to_wishlist::<S>))
        .route(
            "/profile/wishlist/{product_id}",
            delete(profile::remove_from_wishlist::<S>),
        )
        // Content
        .route(
            "/landing-page",
            get(landing::get::<S>).put(landing::update::<S>),
        )
        // Analytics
        .route("/analytics/dashboard", get(analytics::dashboard::<S>))
        .route("/analytics/inventory", get(analytics::inventory::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
