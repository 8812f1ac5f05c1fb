//! Domain layer for the storefront backend.
//!
//! This crate holds the rules that need numeric or state-transition
//! correctness and nothing that performs I/O:
//! - `Money` in integer minor currency units
//! - `Order` with its status transition table
//! - `Coupon` and the pure coupon evaluator
//! - catalog `Product` variants with floor-at-zero stock arithmetic
//! - reviews, customer profiles and landing page content

pub mod catalog;
pub mod coupon;
pub mod error;
pub mod landing;
pub mod money;
pub mod order;
pub mod profile;
pub mod review;

pub use catalog::{Product, ProductImage, ProductVariant, SkipReason, StockAdjustment, StockDecrement};
pub use coupon::{
    Coupon, CouponCode, CouponError, CouponEvaluation, CouponOutcome, Discount, evaluate,
};
pub use error::DomainError;
pub use landing::{LandingPage, LandingPageUpdate};
pub use money::Money;
pub use order::{
    NewOrder, Order, OrderError, OrderItem, OrderPricing, OrderStatus, ShippingAddress,
    UnknownStatus,
};
pub use profile::{ProfileError, ProfileUpdate, UserProfile};
pub use review::{NewReview, Review, ReviewError};
