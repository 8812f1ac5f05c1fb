//! Integration tests for the order, coupon and catalog rules.
//!
//! These walk whole scenarios through the public domain API: checkout
//! pricing with a coupon, the status lifecycle, and stock decrements.

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use common::{OrderId, ProductId, UserId};
use domain::{
    Coupon, CouponOutcome, Discount, Money, NewOrder, Order, OrderError, OrderItem, OrderStatus,
    Product, ProductVariant, ShippingAddress, StockAdjustment, evaluate,
};

fn item(quantity: u32, unit_price: i64) -> OrderItem {
    OrderItem::new("SHIRT-01", "Oxford", "blue", "M", quantity, Money::from_minor(unit_price))
}

fn place(items: Vec<OrderItem>, discount: Money, coupon_code: Option<&str>) -> Order {
    Order::place(NewOrder {
        id: OrderId::new(),
        user_id: UserId::new(),
        user_email: "asha@example.com".to_string(),
        items,
        shipping_address: ShippingAddress::default(),
        discount_amount: discount,
        coupon_code: coupon_code.map(str::to_string),
        gateway_order_id: "order_0001".to_string(),
        placed_at: Utc::now(),
    })
    .unwrap()
}

mod checkout_pricing {
    use super::*;

    #[test]
    fn fixed_coupon_discounts_order() {
        let coupon = Coupon::create(
            "save100",
            Discount::Fixed(Money::from_major(100)),
            Money::from_major(500),
            None,
            Utc::now(),
        )
        .unwrap();

        let items = vec![item(1, 100_000)];
        let total = Order::price(&items, Money::zero()).unwrap().total_amount();
        let eval = evaluate(total, "SAVE100", Some(&coupon), Utc::now());

        assert!(eval.is_applied());
        assert!(eval.message.contains("applied successfully"));
        assert_eq!(eval.discount_amount, Money::from_major(100));
        assert_eq!(eval.final_amount, Money::from_major(900));

        let order = place(items, eval.discount_amount, Some("SAVE100"));
        assert_eq!(order.final_amount(), Money::from_major(900));
        assert_eq!(order.coupon_code(), Some("SAVE100"));
    }

    #[test]
    fn percentage_coupon_discounts_order() {
        let coupon = Coupon::create(
            "SAVE10P",
            Discount::Percentage(10.0),
            Money::zero(),
            None,
            Utc::now(),
        )
        .unwrap();

        let eval = evaluate(Money::from_major(1000), "SAVE10P", Some(&coupon), Utc::now());
        assert_eq!(eval.discount_amount, Money::from_major(100));
        assert_eq!(eval.final_amount, Money::from_major(900));
    }

    #[test]
    fn minimum_not_met_charges_full_price() {
        let coupon = Coupon::create(
            "SAVE100",
            Discount::Fixed(Money::from_major(100)),
            Money::from_major(500),
            None,
            Utc::now(),
        )
        .unwrap();

        let eval = evaluate(Money::from_major(300), "SAVE100", Some(&coupon), Utc::now());
        assert!(matches!(eval.outcome, CouponOutcome::MinimumNotMet { .. }));
        assert!(eval.message.contains("Minimum purchase of 500.00"));

        let order = place(vec![item(1, 30_000)], eval.discount_amount, None);
        assert_eq!(order.final_amount(), Money::from_major(300));
        assert!(order.discount_amount().is_zero());
    }

    #[test]
    fn final_amount_is_never_negative() {
        for discount in [0, 1, 999, 1000, 1001, 50_000] {
            let order = place(vec![item(1, 1000)], Money::from_minor(discount), None);
            assert!(!order.final_amount().is_negative());
            assert_eq!(
                order.final_amount().minor(),
                (1000 - discount).max(0),
                "discount {discount}"
            );
        }
    }

    #[test]
    fn expired_coupon_leaves_total_untouched() {
        let now = Utc::now();
        let yesterday = (now - Duration::days(1)).to_rfc3339();
        let coupon = Coupon::create(
            "OLD",
            Discount::Percentage(50.0),
            Money::zero(),
            Some(&yesterday),
            now - Duration::days(10),
        )
        .unwrap();

        let eval = evaluate(Money::from_major(200), "OLD", Some(&coupon), now);
        assert_eq!(eval.outcome, CouponOutcome::Expired);
        assert_eq!(eval.final_amount, Money::from_major(200));
    }
}

mod status_lifecycle {
    use super::*;

    #[test]
    fn paid_order_ships_and_delivers() {
        let mut order = place(vec![item(2, 1500)], Money::zero(), None);
        order.record_payment("order_0001", "pay_1", Utc::now()).unwrap();
        order
            .update_status(
                OrderStatus::Shipped,
                Some("TRK-9".to_string()),
                Some("Delhivery".to_string()),
                Utc::now(),
            )
            .unwrap();
        order
            .update_status(OrderStatus::Delivered, None, None, Utc::now())
            .unwrap();

        assert_eq!(order.status(), OrderStatus::Delivered);
        assert_eq!(order.tracking_number(), Some("TRK-9"));
    }

    #[test]
    fn delivered_is_terminal() {
        let mut order = place(vec![item(1, 1500)], Money::zero(), None);
        order.record_payment("order_0001", "pay_1", Utc::now()).unwrap();
        order
            .update_status(OrderStatus::Shipped, None, None, Utc::now())
            .unwrap();
        order
            .update_status(OrderStatus::Delivered, None, None, Utc::now())
            .unwrap();

        for next in OrderStatus::ALL {
            assert!(
                order.clone().update_status(next, None, None, Utc::now()).is_err(),
                "delivered -> {next} should be rejected"
            );
        }
    }

    #[test]
    fn every_status_is_reachable_only_through_table() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let allowed = from.allowed_transitions().contains(&to);
                assert_eq!(from.can_transition_to(to), allowed, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn cancelled_order_cannot_be_paid() {
        let mut order = place(vec![item(1, 1500)], Money::zero(), None);
        order
            .update_status(OrderStatus::Cancelled, None, None, Utc::now())
            .unwrap();

        let err = order
            .record_payment("order_0001", "pay_1", Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Cancelled,
                ..
            }
        ));
    }

    #[test]
    fn stale_pending_orders_are_abandoned() {
        let order = place(vec![item(1, 1500)], Money::zero(), None);
        let cutoff = Utc::now() + Duration::minutes(1);
        assert!(order.is_stale(cutoff));

        let mut abandoned = order.clone();
        abandoned.abandon(Utc::now()).unwrap();
        assert!(!abandoned.is_stale(cutoff));
    }
}

mod stock {
    use super::*;

    fn product(stock: u32) -> Product {
        Product {
            id: ProductId::new("SHIRT-01"),
            name: "Oxford".to_string(),
            description: String::new(),
            price: Money::from_minor(1500),
            images: vec![],
            variants: vec![ProductVariant {
                color: "blue".to_string(),
                color_code: "#1f3a93".to_string(),
                sizes: BTreeMap::from([("M".to_string(), stock)]),
            }],
            category: "shirts".to_string(),
            featured: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn paid_order_decrements_each_line() {
        let order = place(vec![item(2, 1500), item(1, 1500)], Money::zero(), None);
        let mut p = product(5);

        let adjustments: Vec<_> = order
            .stock_decrements()
            .iter()
            .map(|d| p.apply_decrement(d))
            .collect();

        assert!(adjustments.iter().all(StockAdjustment::is_applied));
        assert_eq!(p.stock("blue", "M"), Some(2));
    }

    #[test]
    fn overselling_floors_at_zero() {
        let order = place(vec![item(3, 1500)], Money::zero(), None);
        let mut p = product(1);

        for d in order.stock_decrements() {
            p.apply_decrement(&d);
        }
        assert_eq!(p.stock("blue", "M"), Some(0));

        // Replaying the same decrements stays at zero.
        for d in order.stock_decrements() {
            p.apply_decrement(&d);
        }
        assert_eq!(p.stock("blue", "M"), Some(0));
    }
}
