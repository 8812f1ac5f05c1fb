use async_trait::async_trait;
use common::{CouponId, OrderId, ProductId, UserId, Version};
use domain::{
    Coupon, CouponCode, LandingPage, Order, Product, Review, StockAdjustment, StockDecrement,
    UserProfile,
};
use futures_util::stream::BoxStream;

use crate::{OrderQuery, Result};

/// A stream of orders.
pub type OrderStream = BoxStream<'static, Result<Order>>;

/// Persistence for orders.
///
/// Every write is versioned: `insert_order` stores version 1 and each
/// `save_order` must name the version it read, failing with
/// `ConcurrencyConflict` otherwise.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Stores a new order and returns it at [`Version::first`].
    async fn insert_order(&self, order: Order) -> Result<Order>;

    /// Retrieves an order by id.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Replaces an order if its stored version equals `expected`.
    ///
    /// Returns the order at its new version.
    async fn save_order(&self, order: Order, expected: Version) -> Result<Order>;

    /// Lists orders matching `query`, newest first.
    async fn list_orders(&self, query: OrderQuery) -> Result<Vec<Order>>;

    /// Streams every order, newest first.
    async fn stream_orders(&self) -> Result<OrderStream>;
}

/// Persistence for catalog products and their stock.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>>;

    /// Lists all products, newest first.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Inserts or fully replaces a product, variants included.
    async fn upsert_product(&self, product: Product) -> Result<Product>;

    /// Returns false if the product did not exist.
    async fn delete_product(&self, product_id: &ProductId) -> Result<bool>;
}

/// Persistence for coupons.
#[async_trait]
pub trait CouponStore: Send + Sync {
    async fn find_coupon(&self, code: &CouponCode) -> Result<Option<Coupon>>;

    /// Lists all coupons, newest first.
    async fn list_coupons(&self) -> Result<Vec<Coupon>>;

    /// Fails with `DuplicateCoupon` if the code is taken.
    async fn insert_coupon(&self, coupon: Coupon) -> Result<Coupon>;

    /// Returns false if the coupon did not exist.
    async fn delete_coupon(&self, coupon_id: CouponId) -> Result<bool>;
}

/// Atomic write for a confirmed payment.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Saves the paid order and applies its stock decrements as one unit.
    ///
    /// If the order version check fails no stock is touched. Missing catalog
    /// entries are reported as skipped adjustments rather than errors.
    async fn commit_payment(
        &self,
        order: Order,
        expected: Version,
        decrements: &[StockDecrement],
    ) -> Result<(Order, Vec<StockAdjustment>)>;
}

/// Persistence for product reviews.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert_review(&self, review: Review) -> Result<Review>;

    /// Reviews of one product, newest first.
    async fn list_reviews(&self, product_id: &ProductId) -> Result<Vec<Review>>;
}

/// Persistence for customer profiles.
///
/// Profiles are written whole: the last `save_profile` wins.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>>;

    /// Inserts or replaces the profile keyed by its `user_id`.
    async fn save_profile(&self, profile: UserProfile) -> Result<UserProfile>;
}

/// Persistence for the single landing page document.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// `None` until an admin has saved the page once.
    async fn get_landing_page(&self) -> Result<Option<LandingPage>>;

    async fn save_landing_page(&self, page: LandingPage) -> Result<LandingPage>;
}

/// Everything the storefront needs from persistence.
pub trait Store:
    OrderStore
    + CatalogStore
    + CouponStore
    + PaymentLedger
    + ReviewStore
    + ProfileStore
    + ContentStore
    + Clone
    + 'static
{
}

impl<T> Store for T where
    T: OrderStore
        + CatalogStore
        + CouponStore
        + PaymentLedger
        + ReviewStore
        + ProfileStore
        + ContentStore
        + Clone
        + 'static
{
}
