pub mod admin;
pub mod analytics;
pub mod coupons;
pub mod landing;
pub mod orders;
pub mod products;
pub mod profile;
pub mod reviews;
pub mod system;
