use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use common::{OrderId, ProductId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Money, NewOrder, Order, OrderItem, Product, ProductVariant, ShippingAddress};
use store::{CatalogStore, InMemoryStore, OrderQuery, OrderStore, PaymentLedger};

fn order(user_id: UserId, age_minutes: i64) -> Order {
    Order::place(NewOrder {
        id: OrderId::new(),
        user_id,
        user_email: "bench@example.com".to_string(),
        items: vec![OrderItem::new(
            "SHIRT-BENCH",
            "Benchmark Shirt",
            "blue",
            "M",
            1,
            Money::from_minor(1999),
        )],
        shipping_address: ShippingAddress::default(),
        discount_amount: Money::zero(),
        coupon_code: None,
        gateway_order_id: "order_bench".to_string(),
        placed_at: Utc::now() - Duration::minutes(age_minutes),
    })
    .unwrap()
}

fn product() -> Product {
    Product {
        id: ProductId::new("SHIRT-BENCH"),
        name: "Benchmark Shirt".to_string(),
        description: String::new(),
        price: Money::from_minor(1999),
        images: vec![],
        variants: vec![ProductVariant {
            color: "blue".to_string(),
            color_code: String::new(),
            sizes: BTreeMap::from([("M".to_string(), u32::MAX)]),
        }],
        category: "shirts".to_string(),
        featured: false,
        created_at: Utc::now(),
    }
}

fn bench_commit_payment(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    rt.block_on(async { store.upsert_product(product()).await.unwrap() });

    c.bench_function("store/memory_commit_payment", |b| {
        b.iter(|| {
            rt.block_on(async {
                let stored = store.insert_order(order(UserId::new(), 0)).await.unwrap();
                let mut paid = stored.clone();
                paid.record_payment("order_bench", "pay_bench", Utc::now())
                    .unwrap();
                let decrements = paid.stock_decrements();
                store
                    .commit_payment(paid, stored.version(), &decrements)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_list_user_orders(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let user = UserId::new();

    rt.block_on(async {
        for i in 0..1_000 {
            let owner = if i % 10 == 0 { user } else { UserId::new() };
            store.insert_order(order(owner, i)).await.unwrap();
        }
    });

    c.bench_function("store/memory_list_user_orders_1000", |b| {
        b.iter(|| {
            rt.block_on(async { store.list_orders(OrderQuery::for_user(user)).await.unwrap() })
        });
    });
}

criterion_group!(benches, bench_commit_payment, bench_list_user_orders);
criterion_main!(benches);
