pub mod admin;
pub mod amount;
pub mod auth;
pub mod checkout;
pub mod config;
pub mod countdown;
pub mod csv;
pub mod model;
pub mod order_number;
pub mod pricing;
pub mod store;
pub mod storefront;
pub mod validate;

pub use amount::Taka;
pub use checkout::{Checkout, Confirmation};
pub use model::{Catalog, ContactInfo, Field, ProductVariant, Quantity};
pub use order_number::OrderNumber;
pub use pricing::PriceBreakdown;
pub use store::{MemoryStore, OrderSink};
pub use storefront::Storefront;
