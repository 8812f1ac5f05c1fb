//! Shared types used across the storefront crates.

pub mod clock;
pub mod ids;
pub mod version;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ids::{CouponId, OrderId, ProductId, ReviewId, UserId};
pub use version::Version;
