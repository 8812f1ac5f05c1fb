pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::{OrderQuery, ProductPage, ProductQuery, ProductSort};
pub use store::{
    CatalogStore, ContentStore, CouponStore, OrderStore, OrderStream, PaymentLedger,
    ProfileStore, ReviewStore, Store,
};
