//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{OrderId, ProductId, UserId, Version};
use domain::{
    Coupon, CouponCode, Discount, LandingPage, LandingPageUpdate, Money, NewOrder, NewReview,
    Order, OrderItem, OrderStatus, Product, ProductImage, ProductVariant, ProfileUpdate, Review,
    ShippingAddress, SkipReason, StockAdjustment, StockDecrement, UserProfile,
};
use futures_util::TryStreamExt;
use sqlx::PgPool;
use store::{
    CatalogStore, ContentStore, CouponStore, OrderQuery, OrderStore, PaymentLedger, PostgresStore,
    ProfileStore, ReviewStore, StoreError,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query(
        "TRUNCATE TABLE orders, products, product_variants, product_stock, coupons, reviews, \
         user_profiles, site_content",
    )
    .execute(&pool)
    .await
    .unwrap();

    PostgresStore::new(pool)
}

fn order(user_id: UserId, placed_at: chrono::DateTime<Utc>) -> Order {
    Order::place(NewOrder {
        id: OrderId::new(),
        user_id,
        user_email: "asha@example.com".to_string(),
        items: vec![
            OrderItem::new("SHIRT-01", "Oxford", "blue", "M", 2, Money::from_minor(1500)),
            OrderItem::new("SHIRT-01", "Oxford", "white", "L", 1, Money::from_minor(1500)),
        ],
        shipping_address: ShippingAddress::default(),
        discount_amount: Money::from_minor(500),
        coupon_code: Some("SAVE5".to_string()),
        gateway_order_id: "order_0001".to_string(),
        placed_at,
    })
    .unwrap()
}

fn shirt(blue_m: u32) -> Product {
    Product {
        id: ProductId::new("SHIRT-01"),
        name: "Oxford".to_string(),
        description: "Cotton oxford shirt".to_string(),
        price: Money::from_minor(1500),
        images: vec![ProductImage {
            url: "https://cdn.example.com/oxford.jpg".to_string(),
            alt: "Oxford".to_string(),
        }],
        variants: vec![
            ProductVariant {
                color: "blue".to_string(),
                color_code: "#1f3a93".to_string(),
                sizes: BTreeMap::from([("M".to_string(), blue_m), ("L".to_string(), 4)]),
            },
            ProductVariant {
                color: "white".to_string(),
                color_code: "#ffffff".to_string(),
                sizes: BTreeMap::from([("L".to_string(), 2)]),
            },
        ],
        category: "shirts".to_string(),
        featured: true,
        created_at: Utc::now(),
    }
}

fn decrement(color: &str, size: &str, quantity: u32) -> StockDecrement {
    StockDecrement {
        product_id: ProductId::new("SHIRT-01"),
        color: color.to_string(),
        size: size.to_string(),
        quantity,
    }
}

/// Inserts a fresh order, pays it and commits `decrements` alongside.
async fn pay_with(
    store: &PostgresStore,
    decrements: &[StockDecrement],
) -> Result<Vec<StockAdjustment>, StoreError> {
    let placed = store.insert_order(order(UserId::new(), Utc::now())).await?;
    let mut paid = placed.clone();
    paid.record_payment("order_0001", "pay_1", Utc::now())
        .unwrap();
    let (_, adjustments) = store
        .commit_payment(paid, placed.version(), decrements)
        .await?;
    Ok(adjustments)
}

mod orders {
    use super::*;

    #[tokio::test]
    async fn insert_and_get_roundtrip() {
        let store = get_test_store().await;
        let placed = order(UserId::new(), Utc::now());

        let stored = store.insert_order(placed.clone()).await.unwrap();
        assert_eq!(stored.version(), Version::first());

        let loaded = store.get_order(placed.id()).await.unwrap().unwrap();
        assert_eq!(loaded.final_amount().minor(), 4000);
        assert_eq!(loaded.coupon_code(), Some("SAVE5"));
        assert_eq!(loaded.version(), Version::first());
        assert_eq!(loaded.items().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let store = get_test_store().await;
        let placed = order(UserId::new(), Utc::now());
        store.insert_order(placed.clone()).await.unwrap();

        let err = store.insert_order(placed).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateOrder(_)));
    }

    #[tokio::test]
    async fn save_with_stale_version_conflicts() {
        let store = get_test_store().await;
        let stored = store
            .insert_order(order(UserId::new(), Utc::now()))
            .await
            .unwrap();

        let mut cancelled = stored.clone();
        cancelled
            .update_status(OrderStatus::Cancelled, None, None, Utc::now())
            .unwrap();
        let saved = store
            .save_order(cancelled, stored.version())
            .await
            .unwrap();
        assert_eq!(saved.version(), Version::new(2));

        let mut abandoned = stored.clone();
        abandoned.abandon(Utc::now()).unwrap();
        let err = store
            .save_order(abandoned, stored.version())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::ConcurrencyConflict { expected, actual, .. }
                if expected == Version::first() && actual == Version::new(2)
        ));

        let loaded = store.get_order(stored.id()).await.unwrap().unwrap();
        assert_eq!(loaded.status(), OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn save_unknown_order_is_not_found() {
        let store = get_test_store().await;
        let err = store
            .save_order(order(UserId::new(), Utc::now()), Version::first())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn list_filters_by_user_status_and_cutoff() {
        let store = get_test_store().await;
        let user = UserId::new();
        let now = Utc::now();

        let old = store
            .insert_order(order(user, now - Duration::hours(3)))
            .await
            .unwrap();
        let recent = store.insert_order(order(user, now)).await.unwrap();
        store
            .insert_order(order(UserId::new(), now - Duration::hours(4)))
            .await
            .unwrap();

        let mine = store.list_orders(OrderQuery::for_user(user)).await.unwrap();
        assert_eq!(
            mine.iter().map(Order::id).collect::<Vec<_>>(),
            vec![recent.id(), old.id()]
        );

        let stale = store
            .list_orders(OrderQuery::stale_pending(now - Duration::hours(2)))
            .await
            .unwrap();
        assert_eq!(stale.len(), 2);

        let limited = store
            .list_orders(OrderQuery::new().status(OrderStatus::Pending).limit(1))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id(), recent.id());
    }

    #[tokio::test]
    async fn stream_pages_through_all_orders() {
        let store = get_test_store().await;
        let now = Utc::now();
        for i in 0..450 {
            store
                .insert_order(order(UserId::new(), now - Duration::seconds(i)))
                .await
                .unwrap();
        }

        let streamed: Vec<Order> = store
            .stream_orders()
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(streamed.len(), 450);
        assert!(
            streamed
                .windows(2)
                .all(|w| w[0].created_at() >= w[1].created_at())
        );
    }
}

mod catalog {
    use super::*;

    #[tokio::test]
    async fn upsert_preserves_variant_order_and_stock() {
        let store = get_test_store().await;
        store.upsert_product(shirt(5)).await.unwrap();

        let loaded = store
            .get_product(&ProductId::new("SHIRT-01"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.variants[0].color, "blue");
        assert_eq!(loaded.variants[1].color, "white");
        assert_eq!(loaded.stock("blue", "M"), Some(5));
        assert_eq!(loaded.images.len(), 1);
        assert_eq!(loaded.total_stock(), 11);

        let mut updated = shirt(5);
        updated.variants.truncate(1);
        store.upsert_product(updated).await.unwrap();
        let loaded = store
            .get_product(&ProductId::new("SHIRT-01"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.variants.len(), 1);
    }

    #[tokio::test]
    async fn decrement_floors_at_zero() {
        let store = get_test_store().await;
        store.upsert_product(shirt(1)).await.unwrap();

        let adjustments = pay_with(&store, &[decrement("blue", "M", 3)])
            .await
            .unwrap();
        assert_eq!(
            adjustments[0],
            StockAdjustment::Applied {
                product_id: ProductId::new("SHIRT-01"),
                color: "blue".to_string(),
                size: "M".to_string(),
                previous: 1,
                remaining: 0,
            }
        );
    }

    #[tokio::test]
    async fn decrement_reports_missing_entries() {
        let store = get_test_store().await;
        store.upsert_product(shirt(1)).await.unwrap();

        let ghost = StockDecrement {
            product_id: ProductId::new("GHOST"),
            ..decrement("blue", "M", 1)
        };
        let adjustments = pay_with(
            &store,
            &[
                decrement("green", "M", 1),
                decrement("white", "XS", 1),
                ghost,
            ],
        )
        .await
        .unwrap();
        assert!(matches!(
            adjustments[0],
            StockAdjustment::Skipped {
                reason: SkipReason::ColorNotFound,
                ..
            }
        ));

        assert!(matches!(
            adjustments[1],
            StockAdjustment::Skipped {
                reason: SkipReason::SizeNotFound,
                ..
            }
        ));

        assert!(matches!(
            adjustments[2],
            StockAdjustment::Skipped {
                reason: SkipReason::ProductNotFound,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn concurrent_decrements_never_go_negative() {
        let store = get_test_store().await;
        store.upsert_product(shirt(10)).await.unwrap();

        let handles: Vec<_> = (0..15)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { pay_with(&store, &[decrement("blue", "M", 1)]).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let loaded = store
            .get_product(&ProductId::new("SHIRT-01"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.stock("blue", "M"), Some(0));
    }

    #[tokio::test]
    async fn delete_removes_product() {
        let store = get_test_store().await;
        store.upsert_product(shirt(1)).await.unwrap();
        let id = ProductId::new("SHIRT-01");

        assert!(store.delete_product(&id).await.unwrap());
        assert!(store.get_product(&id).await.unwrap().is_none());
        assert!(!store.delete_product(&id).await.unwrap());
    }
}

mod coupons {
    use super::*;

    #[tokio::test]
    async fn insert_find_and_delete() {
        let store = get_test_store().await;
        let coupon = Coupon::create(
            "save100",
            Discount::Fixed(Money::from_major(100)),
            Money::from_major(500),
            Some("2030-01-01T00:00:00Z"),
            Utc::now(),
        )
        .unwrap();
        store.insert_coupon(coupon.clone()).await.unwrap();

        let found = store
            .find_coupon(&CouponCode::normalize("SAVE100").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, coupon.id);
        assert_eq!(found.discount, Discount::Fixed(Money::from_major(100)));
        assert_eq!(found.expiry_date.as_deref(), Some("2030-01-01T00:00:00Z"));

        assert_eq!(store.list_coupons().await.unwrap().len(), 1);
        assert!(store.delete_coupon(coupon.id).await.unwrap());
        assert!(store.list_coupons().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_code_is_rejected() {
        let store = get_test_store().await;
        let first = Coupon::create(
            "SAVE10P",
            Discount::Percentage(10.0),
            Money::zero(),
            None,
            Utc::now(),
        )
        .unwrap();
        let second = Coupon::create(
            "save10p",
            Discount::Percentage(20.0),
            Money::zero(),
            None,
            Utc::now(),
        )
        .unwrap();

        store.insert_coupon(first).await.unwrap();
        let err = store.insert_coupon(second).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateCoupon(code) if code == "SAVE10P"));
    }
}

mod payments {
    use super::*;

    #[tokio::test]
    async fn commit_payment_updates_order_and_stock_together() {
        let store = get_test_store().await;
        store.upsert_product(shirt(5)).await.unwrap();
        let stored = store
            .insert_order(order(UserId::new(), Utc::now()))
            .await
            .unwrap();

        let mut paid = stored.clone();
        paid.record_payment("order_0001", "pay_1", Utc::now())
            .unwrap();
        let decrements = paid.stock_decrements();

        let (saved, adjustments) = store
            .commit_payment(paid, stored.version(), &decrements)
            .await
            .unwrap();

        assert_eq!(saved.status(), OrderStatus::Processing);
        assert_eq!(adjustments.len(), 2);
        assert!(adjustments.iter().all(StockAdjustment::is_applied));

        let product = store
            .get_product(&ProductId::new("SHIRT-01"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.stock("blue", "M"), Some(3));
        assert_eq!(product.stock("white", "L"), Some(1));
    }

    #[tokio::test]
    async fn conflicting_commit_leaves_stock_untouched() {
        let store = get_test_store().await;
        store.upsert_product(shirt(5)).await.unwrap();
        let stored = store
            .insert_order(order(UserId::new(), Utc::now()))
            .await
            .unwrap();

        let mut paid = stored.clone();
        paid.record_payment("order_0001", "pay_1", Utc::now())
            .unwrap();
        let decrements = paid.stock_decrements();

        store
            .commit_payment(paid.clone(), stored.version(), &decrements)
            .await
            .unwrap();
        let err = store
            .commit_payment(paid, stored.version(), &decrements)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConcurrencyConflict { .. }));

        let product = store
            .get_product(&ProductId::new("SHIRT-01"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.stock("blue", "M"), Some(3));
    }
}

mod customer_content {
    use super::*;

    fn review(product: &str, rating: i64, created_at: chrono::DateTime<Utc>) -> Review {
        Review::write(NewReview {
            product_id: ProductId::new(product),
            user_id: UserId::new(),
            user_name: "Asha".to_string(),
            rating,
            comment: "Fits well".to_string(),
            created_at,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn reviews_round_trip_newest_first() {
        let store = get_test_store().await;
        let now = Utc::now();

        let older = store
            .insert_review(review("SHIRT-01", 2, now - Duration::hours(3)))
            .await
            .unwrap();
        let newer = store
            .insert_review(review("SHIRT-01", 5, now))
            .await
            .unwrap();
        store
            .insert_review(review("SHIRT-02", 4, now))
            .await
            .unwrap();

        let listed = store
            .list_reviews(&ProductId::new("SHIRT-01"))
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[0].rating, 5);
        assert_eq!(listed[1].id, older.id);
        assert_eq!(listed[1].comment, "Fits well");
    }

    #[tokio::test]
    async fn profile_upserts_whole_document() {
        let store = get_test_store().await;
        let user = UserId::new();
        assert!(store.get_profile(user).await.unwrap().is_none());

        let mut profile = UserProfile::new(user, "asha@example.com", Utc::now());
        profile.add_to_wishlist(ProductId::new("SHIRT-01"));
        store.save_profile(profile.clone()).await.unwrap();

        profile
            .apply(ProfileUpdate {
                name: Some("Asha".to_string()),
                shipping_address: Some(ShippingAddress {
                    city: "Pune".to_string(),
                    ..ShippingAddress::default()
                }),
            })
            .unwrap();
        store.save_profile(profile.clone()).await.unwrap();

        let loaded = store.get_profile(user).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Asha");
        assert_eq!(loaded.shipping_address.city, "Pune");
        assert_eq!(loaded.wishlist, vec![ProductId::new("SHIRT-01")]);
    }

    #[tokio::test]
    async fn landing_page_is_a_single_document() {
        let store = get_test_store().await;
        assert!(store.get_landing_page().await.unwrap().is_none());

        let mut page = LandingPage::default_at(Utc::now());
        store.save_landing_page(page.clone()).await.unwrap();
        page.apply(
            LandingPageUpdate {
                hero_title: Some("Monsoon edit".to_string()),
                ..LandingPageUpdate::default()
            },
            Utc::now(),
        );
        store.save_landing_page(page).await.unwrap();

        let loaded = store.get_landing_page().await.unwrap().unwrap();
        assert_eq!(loaded.hero_title, "Monsoon edit");
        assert_eq!(loaded.hero_media_type, "image");
    }
}
