//! Cart store: the cart aggregate plus write-through persistence.

pub mod storage;

use std::collections::BTreeSet;
use tracing::{debug, warn};
use crate::domain::aggregates::{Cart, CartLine};
use crate::domain::value_objects::{ProductId, Won};

pub use storage::{CartStorage, FileStorage, MemoryStorage, StorageError};

/// Slot the cart is persisted under.
pub const CART_KEY: &str = "cart";

/// Owns the client-side cart and persists it after every mutation.
///
/// Mutations are applied in memory first; a persistence failure is returned to the
/// caller but the in-memory cart stays authoritative for the session.
#[derive(Debug)]
pub struct CartStore<S> {
    cart: Cart,
    storage: S,
    key: String,
}

impl<S: CartStorage> CartStore<S> {
    pub fn open(storage: S) -> Self { Self::open_with_key(storage, CART_KEY) }

    /// Loads the persisted cart. A missing, unreadable or malformed slot starts empty;
    /// lines with a zero quantity are dropped on their own.
    pub fn open_with_key(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let cart = match storage.read(&key) {
            Ok(Some(raw)) => serde_json::from_str::<Cart>(&raw).unwrap_or_else(|e| {
                warn!(key = %key, error = %e, "discarding corrupt persisted cart");
                Cart::new()
            }),
            Ok(None) => Cart::new(),
            Err(e) => {
                warn!(key = %key, error = %e, "persisted cart unreadable, starting empty");
                Cart::new()
            }
        };
        Self { cart, storage, key }
    }

    pub fn cart(&self) -> &Cart { &self.cart }
    pub fn lines(&self) -> &[CartLine] { self.cart.lines() }
    pub fn storage(&self) -> &S { &self.storage }
    pub fn total_amount(&self) -> Won { self.cart.total_amount() }

    pub fn add_item(&mut self, line: CartLine) -> Result<(), StorageError> {
        debug!(product_id = %line.product_id, quantity = line.quantity.get(), "add to cart");
        self.cart.add_item(line);
        self.persist()
    }

    pub fn remove_item(&mut self, product_id: ProductId) -> Result<(), StorageError> {
        if !self.cart.remove_item(product_id) { return Ok(()); }
        debug!(%product_id, "removed from cart");
        self.persist()
    }

    pub fn update_quantity(&mut self, product_id: ProductId, quantity: i64) -> Result<(), StorageError> {
        if !self.cart.update_quantity(product_id, quantity) { return Ok(()); }
        debug!(%product_id, quantity, "cart quantity changed");
        self.persist()
    }

    pub fn clear_cart(&mut self) -> Result<(), StorageError> {
        self.cart.clear();
        self.persist()
    }

    /// Removes the given products; clears the whole cart when they cover every line.
    pub fn remove_lines(&mut self, product_ids: &BTreeSet<ProductId>) -> Result<(), StorageError> {
        if self.cart.product_ids().is_subset(product_ids) { return self.clear_cart(); }
        for id in product_ids { self.cart.remove_item(*id); }
        self.persist()
    }

    fn persist(&self) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&self.cart)?;
        self.storage.write(&self.key, &raw)
    }
}
