use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{CouponId, OrderId, ProductId, UserId, Version};
use domain::{
    Coupon, CouponCode, LandingPage, Order, Product, Review, SkipReason, StockAdjustment,
    StockDecrement, UserProfile,
};
use tokio::sync::RwLock;

use crate::{
    OrderQuery, Result, StoreError,
    store::{
        CatalogStore, ContentStore, CouponStore, OrderStore, OrderStream, PaymentLedger,
        ProfileStore, ReviewStore,
    },
};

/// In-memory store implementation for tests and database-less runs.
///
/// Provides the same interface and atomicity as the PostgreSQL
/// implementation. Locks are always taken orders → products so concurrent
/// payment commits cannot deadlock.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    coupons: Arc<RwLock<HashMap<CouponId, Coupon>>>,
    reviews: Arc<RwLock<Vec<Review>>>,
    profiles: Arc<RwLock<HashMap<UserId, UserProfile>>>,
    landing_page: Arc<RwLock<Option<LandingPage>>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    fn check_version(current: &Order, expected: Version) -> Result<()> {
        if current.version() != expected {
            return Err(StoreError::ConcurrencyConflict {
                order_id: current.id(),
                expected,
                actual: current.version(),
            });
        }
        Ok(())
    }

    fn decrement_in(
        products: &mut HashMap<ProductId, Product>,
        decrement: &StockDecrement,
    ) -> StockAdjustment {
        match products.get_mut(&decrement.product_id) {
            Some(product) => product.apply_decrement(decrement),
            None => StockAdjustment::skipped(decrement, SkipReason::ProductNotFound),
        }
    }
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then(b.id().cmp(&a.id()))
    });
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, mut order: Order) -> Result<Order> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id()) {
            return Err(StoreError::DuplicateOrder(order.id()));
        }

        order.set_version(Version::first());
        orders.insert(order.id(), order.clone());
        Ok(order)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn save_order(&self, mut order: Order, expected: Version) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let current = orders
            .get(&order.id())
            .ok_or(StoreError::OrderNotFound(order.id()))?;
        Self::check_version(current, expected)?;

        order.set_version(expected.next());
        orders.insert(order.id(), order.clone());
        Ok(order)
    }

    async fn list_orders(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matching: Vec<_> = orders
            .values()
            .filter(|o| query.matches(o))
            .cloned()
            .collect();
        newest_first(&mut matching);

        if let Some(limit) = query.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }

    async fn stream_orders(&self) -> Result<OrderStream> {
        use futures_util::{StreamExt, stream};

        let mut orders: Vec<_> = self.orders.read().await.values().cloned().collect();
        newest_first(&mut orders);

        Ok(stream::iter(orders.into_iter().map(Ok)).boxed())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(product_id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let mut products: Vec<_> = self.products.read().await.values().cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn upsert_product(&self, product: Product) -> Result<Product> {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product.clone());
        Ok(product)
    }

    async fn delete_product(&self, product_id: &ProductId) -> Result<bool> {
        Ok(self.products.write().await.remove(product_id).is_some())
    }
}

#[async_trait]
impl CouponStore for InMemoryStore {
    async fn find_coupon(&self, code: &CouponCode) -> Result<Option<Coupon>> {
        let coupons = self.coupons.read().await;
        Ok(coupons.values().find(|c| &c.code == code).cloned())
    }

    async fn list_coupons(&self) -> Result<Vec<Coupon>> {
        let mut coupons: Vec<_> = self.coupons.read().await.values().cloned().collect();
        coupons.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(coupons)
    }

    async fn insert_coupon(&self, coupon: Coupon) -> Result<Coupon> {
        let mut coupons = self.coupons.write().await;
        if coupons.values().any(|c| c.code == coupon.code) {
            return Err(StoreError::DuplicateCoupon(coupon.code.to_string()));
        }
        coupons.insert(coupon.id, coupon.clone());
        Ok(coupon)
    }

    async fn delete_coupon(&self, coupon_id: CouponId) -> Result<bool> {
        Ok(self.coupons.write().await.remove(&coupon_id).is_some())
    }
}

#[async_trait]
impl PaymentLedger for InMemoryStore {
    async fn commit_payment(
        &self,
        mut order: Order,
        expected: Version,
        decrements: &[StockDecrement],
    ) -> Result<(Order, Vec<StockAdjustment>)> {
        let mut orders = self.orders.write().await;
        let current = orders
            .get(&order.id())
            .ok_or(StoreError::OrderNotFound(order.id()))?;
        Self::check_version(current, expected)?;

        let mut products = self.products.write().await;
        let adjustments = decrements
            .iter()
            .map(|d| Self::decrement_in(&mut products, d))
            .collect();

        order.set_version(expected.next());
        orders.insert(order.id(), order.clone());
        Ok((order, adjustments))
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn insert_review(&self, review: Review) -> Result<Review> {
        self.reviews.write().await.push(review.clone());
        Ok(review)
    }

    async fn list_reviews(&self, product_id: &ProductId) -> Result<Vec<Review>> {
        let mut reviews: Vec<_> = self
            .reviews
            .read()
            .await
            .iter()
            .filter(|r| &r.product_id == product_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn save_profile(&self, profile: UserProfile) -> Result<UserProfile> {
        self.profiles
            .write()
            .await
            .insert(profile.user_id, profile.clone());
        Ok(profile)
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn get_landing_page(&self) -> Result<Option<LandingPage>> {
        Ok(self.landing_page.read().await.clone())
    }

    async fn save_landing_page(&self, page: LandingPage) -> Result<LandingPage> {
        *self.landing_page.write().await = Some(page.clone());
        Ok(page)
    }
}
