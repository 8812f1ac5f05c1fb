//! Checkout and order lifecycle for the storefront.
//!
//! An order moves through these steps:
//! 1. The cart is priced from the catalog and a coupon is applied if valid
//! 2. A gateway order is opened for the final amount and the order is stored as `pending`
//! 3. The client pays; the gateway signature is verified and the order
//!    becomes `processing` while stock is decremented in the same commit
//! 4. Admins move it along to `shipped` and `delivered`
//!
//! Unpaid orders older than the configured threshold are swept to `abandoned`.

pub mod commands;
pub mod coupons;
pub mod error;
pub mod gateway;
pub mod inventory;
pub mod lifecycle;

pub use commands::{CartLine, CreateCoupon, CreateOrder, UpdateStatus, VerifyPayment};
pub use coupons::CouponDesk;
pub use error::{CheckoutError, Result};
pub use gateway::{GatewayError, GatewayOrder, InMemoryPaymentGateway, PaymentGateway};
pub use inventory::InventoryAdjuster;
pub use lifecycle::{CreatedOrder, LifecycleSettings, OrderLifecycle, PaymentConfirmation};
