//! Type-safe wrappers for entity IDs and prices.

pub mod id;
pub mod price;

pub use id::{CartId, ProductId, UserId};
pub use price::Price;
