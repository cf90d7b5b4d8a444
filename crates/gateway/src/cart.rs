//! Cart reconciliation.
//!
//! The upstream exposes no fine-grained cart mutations - only "get latest
//! cart for user" and "replace a cart's whole line collection" - so every
//! mutation here is a read-modify-write transaction: re-read the
//! authoritative cart, edit the line collection in memory, replace it
//! upstream, return the result. No cart state is held across calls.
//!
//! # Concurrency
//!
//! There is deliberately no lock around the read-modify-write sequence. Two
//! concurrent mutations for the same user race at `replace_cart` and the
//! later write wins in full (last-writer-wins, not last-intent-wins). Carts
//! are single-user and low-contention by construction; hardening would take
//! a per-user mutex or an upstream conditional-write primitive.

use tracing::instrument;

use nextshop_core::{ProductId, UserId};

use crate::store::{Cart, CartLine, StoreApi, StoreError};

/// Simulates a persistent, mutable cart on top of the upstream's
/// read/replace semantics.
#[derive(Clone)]
pub struct CartService<S> {
    store: S,
}

impl<S: StoreApi> CartService<S> {
    /// Create a cart service over the given store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The user's current cart, as the upstream has it.
    #[instrument(skip(self))]
    pub async fn get(&self, user_id: UserId) -> Cart {
        self.store.cart_for_user(user_id).await
    }

    /// Add `quantity` of a product, merging into an existing line for the
    /// same product if one exists. Not idempotent: each call increments.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream replace fails.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, StoreError> {
        let mut cart = self.store.cart_for_user(user_id).await;

        if let Some(line) = cart.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            cart.lines.push(CartLine {
                product_id,
                quantity,
            });
        }

        self.store
            .replace_cart(cart.id, user_id, &cart.lines)
            .await
    }

    /// Set a product's quantity exactly. Quantity 0 removes the line
    /// (a no-op if absent); otherwise the line is upserted. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream replace fails.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, StoreError> {
        let mut cart = self.store.cart_for_user(user_id).await;

        if quantity == 0 {
            cart.lines.retain(|l| l.product_id != product_id);
        } else if let Some(line) = cart.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = quantity;
        } else {
            cart.lines.push(CartLine {
                product_id,
                quantity,
            });
        }

        self.store
            .replace_cart(cart.id, user_id, &cart.lines)
            .await
    }

    /// Remove a product's line entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream replace fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<Cart, StoreError> {
        self.update(user_id, product_id, 0).await
    }

    /// Empty the cart. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream replace fails.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<Cart, StoreError> {
        let cart = self.store.cart_for_user(user_id).await;
        self.store.replace_cart(cart.id, user_id, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use nextshop_core::CartId;

    use crate::store::types::StoreCredentials;
    use crate::store::{Product, ProductFilter};

    /// In-memory store: one cart slot, replace overwrites it.
    #[derive(Default)]
    struct FakeStore {
        cart: Mutex<Option<Cart>>,
    }

    impl FakeStore {
        fn with_cart(cart: Cart) -> Self {
            Self {
                cart: Mutex::new(Some(cart)),
            }
        }
    }

    impl StoreApi for &FakeStore {
        async fn list_products(&self, _: &ProductFilter) -> Result<Vec<Product>, StoreError> {
            Ok(Vec::new())
        }

        async fn get_product(&self, id: ProductId) -> Result<Product, StoreError> {
            Err(StoreError::NotFound(format!("Product {id} not found")))
        }

        async fn list_categories(&self) -> Result<Vec<String>, StoreError> {
            Ok(Vec::new())
        }

        async fn login(&self, _: &str, _: &str) -> Result<StoreCredentials, StoreError> {
            Err(StoreError::LoginRejected)
        }

        async fn cart_for_user(&self, user_id: UserId) -> Cart {
            self.cart
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Cart::fresh(user_id))
        }

        async fn replace_cart(
            &self,
            cart_id: CartId,
            user_id: UserId,
            lines: &[CartLine],
        ) -> Result<Cart, StoreError> {
            let cart = Cart {
                id: cart_id,
                user_id,
                last_modified: chrono::Utc::now(),
                lines: lines.to_vec(),
            };
            *self.cart.lock().unwrap() = Some(cart.clone());
            Ok(cart)
        }
    }

    const USER: UserId = UserId::new(1);
    const P5: ProductId = ProductId::new(5);
    const P9: ProductId = ProductId::new(9);

    #[tokio::test]
    async fn test_add_merges_by_product_id() {
        let store = FakeStore::default();
        let carts = CartService::new(&store);

        let cart = carts.add(USER, P5, 2).await.unwrap();
        assert_eq!(cart.lines, vec![CartLine { product_id: P5, quantity: 2 }]);

        let cart = carts.add(USER, P5, 1).await.unwrap();
        assert_eq!(cart.lines, vec![CartLine { product_id: P5, quantity: 3 }]);
    }

    #[tokio::test]
    async fn test_add_appends_new_products_in_insertion_order() {
        let store = FakeStore::default();
        let carts = CartService::new(&store);

        carts.add(USER, P5, 1).await.unwrap();
        let cart = carts.add(USER, P9, 4).await.unwrap();

        let ids: Vec<ProductId> = cart.lines.iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![P5, P9]);
    }

    #[tokio::test]
    async fn test_update_zero_removes_line() {
        let store = FakeStore::default();
        let carts = CartService::new(&store);

        carts.add(USER, P5, 2).await.unwrap();
        let cart = carts.update(USER, P5, 0).await.unwrap();
        assert!(cart.lines.is_empty());
    }

    #[tokio::test]
    async fn test_update_zero_for_absent_product_is_noop() {
        let store = FakeStore::default();
        let carts = CartService::new(&store);

        carts.add(USER, P5, 2).await.unwrap();
        let cart = carts.update(USER, P9, 0).await.unwrap();
        assert_eq!(cart.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_update_overwrites_rather_than_increments() {
        let store = FakeStore::default();
        let carts = CartService::new(&store);

        carts.add(USER, P5, 2).await.unwrap();
        let cart = carts.update(USER, P5, 7).await.unwrap();
        assert_eq!(cart.lines[0].quantity, 7);

        // Repeating the same update observes no change.
        let cart = carts.update(USER, P5, 7).await.unwrap();
        assert_eq!(cart.lines[0].quantity, 7);
    }

    #[tokio::test]
    async fn test_update_creates_line_when_absent() {
        let store = FakeStore::default();
        let carts = CartService::new(&store);

        let cart = carts.update(USER, P9, 3).await.unwrap();
        assert_eq!(cart.lines, vec![CartLine { product_id: P9, quantity: 3 }]);
    }

    #[tokio::test]
    async fn test_remove_is_update_to_zero() {
        let store = FakeStore::default();
        let carts = CartService::new(&store);

        carts.add(USER, P5, 2).await.unwrap();
        let cart = carts.remove(USER, P5).await.unwrap();
        assert!(cart.lines.is_empty());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let store = FakeStore::default();
        let carts = CartService::new(&store);

        carts.add(USER, P5, 2).await.unwrap();
        let cart = carts.clear(USER).await.unwrap();
        assert!(cart.lines.is_empty());

        let cart = carts.clear(USER).await.unwrap();
        assert!(cart.lines.is_empty());
    }

    #[tokio::test]
    async fn test_mutation_retains_existing_cart_id() {
        let existing = Cart {
            id: CartId::new(42),
            user_id: USER,
            last_modified: chrono::Utc::now(),
            lines: vec![CartLine { product_id: P5, quantity: 1 }],
        };
        let store = FakeStore::with_cart(existing);
        let carts = CartService::new(&store);

        let cart = carts.add(USER, P9, 1).await.unwrap();
        assert_eq!(cart.id, CartId::new(42));
    }

    #[tokio::test]
    async fn test_get_returns_upstream_cart_unmodified() {
        let existing = Cart {
            id: CartId::new(42),
            user_id: USER,
            last_modified: chrono::Utc::now(),
            lines: vec![CartLine { product_id: P5, quantity: 1 }],
        };
        let store = FakeStore::with_cart(existing.clone());
        let carts = CartService::new(&store);

        let cart = carts.get(USER).await;
        assert_eq!(cart.id, existing.id);
        assert_eq!(cart.lines, existing.lines);
    }
}
