use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CouponId, OrderId, ProductId, UserId, Version};
use domain::{
    Coupon, CouponCode, LandingPage, Money, Order, Product, ProductImage, ProductVariant, Review,
    SkipReason, StockAdjustment, StockDecrement, UserProfile,
};
use futures_util::{StreamExt, TryStreamExt, stream};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow, types::Json};
use uuid::Uuid;

use crate::{
    OrderQuery, Result, StoreError,
    store::{
        CatalogStore, ContentStore, CouponStore, OrderStore, OrderStream, PaymentLedger,
        ProfileStore, ReviewStore,
    },
};

/// Rows fetched per round trip when streaming orders.
const STREAM_PAGE_SIZE: i64 = 200;

/// `site_content` key of the landing page document.
const LANDING_PAGE_KEY: &str = "landing_page";

/// Position after the last streamed order; `None` before the first page.
type Cursor = Option<(DateTime<Utc>, Uuid)>;

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let document: serde_json::Value = row.try_get("document")?;
        let mut order: Order = serde_json::from_value(document)?;
        order.set_version(Version::new(row.try_get("version")?));
        Ok(order)
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        let images: Json<Vec<ProductImage>> = row.try_get("images")?;
        Ok(Product {
            id: ProductId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_minor(row.try_get("price")?),
            images: images.0,
            variants: Vec::new(),
            category: row.try_get("category")?,
            featured: row.try_get("featured")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_coupon(row: PgRow) -> Result<Coupon> {
        let document: serde_json::Value = row.try_get("coupon")?;
        Ok(serde_json::from_value(document)?)
    }

    /// Loads variants and stock for `products` in two queries.
    async fn attach_variants(&self, mut products: Vec<Product>) -> Result<Vec<Product>> {
        if products.is_empty() {
            return Ok(products);
        }

        let ids: Vec<String> = products.iter().map(|p| p.id.to_string()).collect();

        let variant_rows = sqlx::query(
            r#"
            SELECT product_id, position, color, color_code
            FROM product_variants
            WHERE product_id = ANY($1)
            ORDER BY product_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let stock_rows = sqlx::query(
            r#"
            SELECT product_id, position, size, quantity
            FROM product_stock
            WHERE product_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut variants: HashMap<(String, i32), ProductVariant> = HashMap::new();
        let mut order: HashMap<String, Vec<i32>> = HashMap::new();
        for row in variant_rows {
            let product_id: String = row.try_get("product_id")?;
            let position: i32 = row.try_get("position")?;
            order.entry(product_id.clone()).or_default().push(position);
            variants.insert(
                (product_id, position),
                ProductVariant {
                    color: row.try_get("color")?,
                    color_code: row.try_get("color_code")?,
                    sizes: Default::default(),
                },
            );
        }

        for row in stock_rows {
            let key = (
                row.try_get::<String, _>("product_id")?,
                row.try_get::<i32, _>("position")?,
            );
            let quantity: i64 = row.try_get("quantity")?;
            if let Some(variant) = variants.get_mut(&key) {
                variant
                    .sizes
                    .insert(row.try_get("size")?, stock_from_db(quantity));
            }
        }

        for product in &mut products {
            let positions = order.remove(product.id.as_str()).unwrap_or_default();
            product.variants = positions
                .into_iter()
                .filter_map(|position| variants.remove(&(product.id.to_string(), position)))
                .collect();
        }

        Ok(products)
    }

    async fn save_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        mut order: Order,
        expected: Version,
    ) -> Result<Order> {
        let next = expected.next();
        order.set_version(next);
        let document = serde_json::to_value(&order)?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, version = $3, document = $4
            WHERE id = $1 AND version = $5
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.status().as_str())
        .bind(next.as_i64())
        .bind(document)
        .bind(expected.as_i64())
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                .bind(order.id().as_uuid())
                .fetch_optional(&mut **tx)
                .await?;

            return Err(match actual {
                Some(actual) => {
                    metrics::counter!("store_concurrency_conflicts_total").increment(1);
                    tracing::debug!(order_id = %order.id(), %expected, actual, "stale order write");
                    StoreError::ConcurrencyConflict {
                        order_id: order.id(),
                        expected,
                        actual: Version::new(actual),
                    }
                }
                None => StoreError::OrderNotFound(order.id()),
            });
        }

        Ok(order)
    }

    async fn decrement_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        decrement: &StockDecrement,
    ) -> Result<StockAdjustment> {
        let product_id = decrement.product_id.as_str();

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(product_id)
            .fetch_one(&mut **tx)
            .await?;
        if !exists {
            return Ok(StockAdjustment::skipped(decrement, SkipReason::ProductNotFound));
        }

        let position: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT position FROM product_variants
            WHERE product_id = $1 AND color = $2
            ORDER BY position
            LIMIT 1
            "#,
        )
        .bind(product_id)
        .bind(&decrement.color)
        .fetch_optional(&mut **tx)
        .await?;
        let Some(position) = position else {
            return Ok(StockAdjustment::skipped(decrement, SkipReason::ColorNotFound));
        };

        // Row lock so `previous` is exactly what the update subtracts from.
        let previous: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT quantity FROM product_stock
            WHERE product_id = $1 AND position = $2 AND size = $3
            FOR UPDATE
            "#,
        )
        .bind(product_id)
        .bind(position)
        .bind(&decrement.size)
        .fetch_optional(&mut **tx)
        .await?;
        let Some(previous) = previous else {
            return Ok(StockAdjustment::skipped(decrement, SkipReason::SizeNotFound));
        };

        let remaining: i64 = sqlx::query_scalar(
            r#"
            UPDATE product_stock
            SET quantity = GREATEST(quantity - $4, 0)
            WHERE product_id = $1 AND position = $2 AND size = $3
            RETURNING quantity
            "#,
        )
        .bind(product_id)
        .bind(position)
        .bind(&decrement.size)
        .bind(i64::from(decrement.quantity))
        .fetch_one(&mut **tx)
        .await?;

        Ok(StockAdjustment::Applied {
            product_id: decrement.product_id.clone(),
            color: decrement.color.clone(),
            size: decrement.size.clone(),
            previous: stock_from_db(previous),
            remaining: stock_from_db(remaining),
        })
    }

    /// Fetches the page after `cursor`.
    ///
    /// Returns `None` once the previous page came back short.
    async fn next_order_page(
        pool: PgPool,
        cursor: Option<Cursor>,
    ) -> Result<Option<(Vec<Order>, Option<Cursor>)>> {
        let Some(after) = cursor else {
            return Ok(None);
        };

        let rows = sqlx::query(
            r#"
            SELECT document, version FROM orders
            WHERE $1::timestamptz IS NULL OR (created_at, id) < ($1, $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(after.map(|(created_at, _)| created_at))
        .bind(after.map(|(_, id)| id))
        .bind(STREAM_PAGE_SIZE)
        .fetch_all(&pool)
        .await?;

        let page = rows
            .into_iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;

        let next = if (page.len() as i64) < STREAM_PAGE_SIZE {
            None
        } else {
            page.last()
                .map(|o| Some((o.created_at(), o.id().as_uuid())))
        };

        Ok(Some((page, next)))
    }
}

fn stock_from_db(quantity: i64) -> u32 {
    u32::try_from(quantity.max(0)).unwrap_or(u32::MAX)
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, mut order: Order) -> Result<Order> {
        order.set_version(Version::first());
        let document = serde_json::to_value(&order)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, status, created_at, version, document)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.user_id().as_uuid())
        .bind(order.status().as_str())
        .bind(order.created_at())
        .bind(Version::first().as_i64())
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("orders_pkey")
            {
                return StoreError::DuplicateOrder(order.id());
            }
            StoreError::Database(e)
        })?;

        Ok(order)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT document, version FROM orders WHERE id = $1")
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn save_order(&self, order: Order, expected: Version) -> Result<Order> {
        let mut tx = self.pool.begin().await?;
        let order = Self::save_in_tx(&mut tx, order, expected).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn list_orders(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let mut sql = String::from("SELECT document, version FROM orders WHERE 1=1");
        let mut param_count = 0;

        if query.user_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND user_id = ${param_count}"));
        }
        if query.statuses.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ANY(${param_count})"));
        }
        if query.created_at_or_before.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at <= ${param_count}"));
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }

        let statuses = query.status_strings();
        let mut sqlx_query = sqlx::query(&sql);

        if let Some(user_id) = query.user_id {
            sqlx_query = sqlx_query.bind(user_id.as_uuid());
        }
        if let Some(statuses) = statuses {
            sqlx_query = sqlx_query.bind(statuses);
        }
        if let Some(cutoff) = query.created_at_or_before {
            sqlx_query = sqlx_query.bind(cutoff);
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn stream_orders(&self) -> Result<OrderStream> {
        let pool = self.pool.clone();

        // Keyset pagination over (created_at, id).
        let pages = stream::try_unfold(Some(None), move |cursor| {
            Self::next_order_page(pool.clone(), cursor)
        });

        Ok(pages
            .map_ok(|page| stream::iter(page.into_iter().map(Ok)))
            .try_flatten()
            .boxed())
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, price, images, category, featured, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut products = self.attach_variants(vec![Self::row_to_product(&row)?]).await?;
        Ok(products.pop())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, price, images, category, featured, created_at
            FROM products
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let products = rows
            .iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>>>()?;
        self.attach_variants(products).await
    }

    async fn upsert_product(&self, product: Product) -> Result<Product> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, images, category, featured, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                images = EXCLUDED.images,
                category = EXCLUDED.category,
                featured = EXCLUDED.featured,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.minor())
        .bind(Json(&product.images))
        .bind(&product.category)
        .bind(product.featured)
        .bind(product.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM product_variants WHERE product_id = $1")
            .bind(product.id.as_str())
            .execute(&mut *tx)
            .await?;

        for (position, variant) in product.variants.iter().enumerate() {
            let position = position as i32;
            sqlx::query(
                r#"
                INSERT INTO product_variants (product_id, position, color, color_code)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(product.id.as_str())
            .bind(position)
            .bind(&variant.color)
            .bind(&variant.color_code)
            .execute(&mut *tx)
            .await?;

            for (size, quantity) in &variant.sizes {
                sqlx::query(
                    r#"
                    INSERT INTO product_stock (product_id, position, size, quantity)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(product.id.as_str())
                .bind(position)
                .bind(size)
                .bind(i64::from(*quantity))
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(product)
    }

    async fn delete_product(&self, product_id: &ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CouponStore for PostgresStore {
    async fn find_coupon(&self, code: &CouponCode) -> Result<Option<Coupon>> {
        let row = sqlx::query("SELECT to_jsonb(c) AS coupon FROM coupons c WHERE code = $1")
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_coupon).transpose()
    }

    async fn list_coupons(&self) -> Result<Vec<Coupon>> {
        let rows =
            sqlx::query("SELECT to_jsonb(c) AS coupon FROM coupons c ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Self::row_to_coupon).collect()
    }

    async fn insert_coupon(&self, coupon: Coupon) -> Result<Coupon> {
        sqlx::query(
            r#"
            INSERT INTO coupons (id, code, discount, min_purchase, expiry_date, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(coupon.id.as_uuid())
        .bind(coupon.code.as_str())
        .bind(Json(&coupon.discount))
        .bind(coupon.min_purchase.minor())
        .bind(&coupon.expiry_date)
        .bind(coupon.is_active)
        .bind(coupon.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_coupon_code")
            {
                return StoreError::DuplicateCoupon(coupon.code.to_string());
            }
            StoreError::Database(e)
        })?;

        Ok(coupon)
    }

    async fn delete_coupon(&self, coupon_id: CouponId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
            .bind(coupon_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PaymentLedger for PostgresStore {
    #[tracing::instrument(skip(self, order, decrements), fields(order_id = %order.id()))]
    async fn commit_payment(
        &self,
        order: Order,
        expected: Version,
        decrements: &[StockDecrement],
    ) -> Result<(Order, Vec<StockAdjustment>)> {
        let mut tx = self.pool.begin().await?;

        let order = Self::save_in_tx(&mut tx, order, expected).await?;

        let mut adjustments = Vec::with_capacity(decrements.len());
        for decrement in decrements {
            adjustments.push(Self::decrement_in_tx(&mut tx, decrement).await?);
        }

        tx.commit().await?;
        Ok((order, adjustments))
    }
}

#[async_trait]
impl ReviewStore for PostgresStore {
    async fn insert_review(&self, review: Review) -> Result<Review> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, product_id, user_id, user_name, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(review.id.as_uuid())
        .bind(review.product_id.as_str())
        .bind(review.user_id.as_uuid())
        .bind(&review.user_name)
        .bind(i16::from(review.rating))
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&self.pool)
        .await?;

        Ok(review)
    }

    async fn list_reviews(&self, product_id: &ProductId) -> Result<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT to_jsonb(r) AS review FROM reviews r
            WHERE product_id = $1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(product_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<Review> {
                let document: serde_json::Value = row.try_get("review")?;
                Ok(serde_json::from_value(document)?)
            })
            .collect()
    }
}

#[async_trait]
impl ProfileStore for PostgresStore {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>> {
        let row = sqlx::query("SELECT document FROM user_profiles WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<UserProfile> {
            let document: Json<UserProfile> = row.try_get("document")?;
            Ok(document.0)
        })
        .transpose()
    }

    async fn save_profile(&self, profile: UserProfile) -> Result<UserProfile> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, document)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET document = EXCLUDED.document
            "#,
        )
        .bind(profile.user_id.as_uuid())
        .bind(Json(&profile))
        .execute(&self.pool)
        .await?;

        Ok(profile)
    }
}

#[async_trait]
impl ContentStore for PostgresStore {
    async fn get_landing_page(&self) -> Result<Option<LandingPage>> {
        let row = sqlx::query("SELECT document FROM site_content WHERE id = $1")
            .bind(LANDING_PAGE_KEY)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<LandingPage> {
            let document: Json<LandingPage> = row.try_get("document")?;
            Ok(document.0)
        })
        .transpose()
    }

    async fn save_landing_page(&self, page: LandingPage) -> Result<LandingPage> {
        sqlx::query(
            r#"
            INSERT INTO site_content (id, document)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET document = EXCLUDED.document
            "#,
        )
        .bind(LANDING_PAGE_KEY)
        .bind(Json(&page))
        .execute(&self.pool)
        .await?;

        Ok(page)
    }
}
