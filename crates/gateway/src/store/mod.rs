//! Upstream store adapter.
//!
//! The sole component that talks to the external catalog/cart service.
//! Everything above this boundary sees typed results: transport failures and
//! non-2xx statuses become [`StoreError`] variants, never raw `reqwest`
//! control flow.
//!
//! # Failure policy
//!
//! Every operation converts upstream failure into a typed error, with one
//! deliberate exception: [`StoreApi::cart_for_user`] absorbs failure into an
//! empty cart. There is no reliable distinction between "no cart exists" and
//! "transient error" at this boundary, so the adapter optimistically assumes
//! emptiness rather than blocking the user.

mod client;
pub mod types;

pub use client::StoreClient;
pub use types::{
    Cart, CartLine, Product, ProductFilter, Rating, SortOrder, StoreCredentials, merge_lines,
};

use thiserror::Error;

use nextshop_core::{CartId, ProductId, UserId};

/// Errors that can occur when calling the upstream store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed (connect, timeout, body).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream returned a non-2xx status.
    #[error("upstream returned status {0}")]
    Status(u16),

    /// Upstream response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Login rejected or credential token unusable.
    #[error("login rejected by upstream")]
    LoginRejected,
}

/// Read/write primitives over the upstream catalog/cart service.
///
/// The gateway's cart reconciler and tool dispatcher are generic over this
/// trait; production uses [`StoreClient`], tests substitute in-memory fakes.
///
/// # Contract
///
/// - `list_products` pushes `limit` and `sort` to the upstream query
///   interface and applies `category` locally as an exact match.
/// - `cart_for_user` returns the user's latest cart, or a freshly
///   constructed empty cart when the upstream has none (or fails) - it never
///   errors.
/// - `replace_cart` overwrites the cart's entire line collection.
#[allow(async_fn_in_trait)]
pub trait StoreApi {
    /// List products with filters applied.
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError>;

    /// Get a single product by id.
    async fn get_product(&self, id: ProductId) -> Result<Product, StoreError>;

    /// List all product categories.
    async fn list_categories(&self) -> Result<Vec<String>, StoreError>;

    /// Authenticate a user, returning the credential token and user id.
    async fn login(&self, username: &str, password: &str)
    -> Result<StoreCredentials, StoreError>;

    /// Get the user's latest cart, treating absence and failure as empty.
    async fn cart_for_user(&self, user_id: UserId) -> Cart;

    /// Replace a cart's entire line collection.
    async fn replace_cart(
        &self,
        cart_id: CartId,
        user_id: UserId,
        lines: &[CartLine],
    ) -> Result<Cart, StoreError>;
}
