//! Cart Aggregate

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::num::NonZeroU32;
use tracing::warn;
use crate::domain::value_objects::{ProductId, Won};

/// One product in the cart. Name, price and image are snapshots taken when the
/// product was first added and are never refreshed from the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Won,
    pub quantity: NonZeroU32,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CartLine {
    pub fn new(product_id: ProductId, name: impl Into<String>, unit_price: Won, quantity: NonZeroU32) -> Self {
        Self { product_id, name: name.into(), unit_price, quantity, image_url: None }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn line_total(&self) -> Won { self.unit_price.multiply(self.quantity.get()) }
}

/// Lines keyed by product. At most one line exists per `ProductId`.
///
/// Deserializing skips stored lines with a zero quantity and merges duplicated
/// products, so one bad line does not cost the rest of the cart.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(into = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> { self.lines.iter().find(|l| l.product_id == product_id) }
    pub fn contains(&self, product_id: ProductId) -> bool { self.line(product_id).is_some() }
    pub fn item_count(&self) -> usize { self.lines.len() }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    pub fn product_ids(&self) -> BTreeSet<ProductId> { self.lines.iter().map(|l| l.product_id).collect() }

    /// Adds a line, or bumps the quantity of the line already holding that product.
    /// The existing snapshot fields win over the incoming ones.
    pub fn add_item(&mut self, line: CartLine) {
        if let Some(existing) = self.lines.iter_mut().find(|l| l.product_id == line.product_id) {
            existing.quantity = existing.quantity.saturating_add(line.quantity.get());
        } else {
            self.lines.push(line);
        }
    }

    /// Returns whether a line was removed.
    pub fn remove_item(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    /// Sets the quantity of an existing line. Zero or negative removes the line;
    /// values beyond `u32::MAX` saturate. Returns whether the cart changed.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: i64) -> bool {
        let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) else { return false };
        match NonZeroU32::new(u32::try_from(quantity.max(0)).unwrap_or(u32::MAX)) {
            Some(q) if q == line.quantity => false,
            Some(q) => { line.quantity = q; true }
            None => self.remove_item(product_id),
        }
    }

    pub fn clear(&mut self) { self.lines.clear(); }

    pub fn total_amount(&self) -> Won { self.lines.iter().map(CartLine::line_total).sum() }

    /// Lines whose product is in `selection`, in cart order.
    pub fn selected<'a>(&'a self, selection: &'a BTreeSet<ProductId>) -> impl Iterator<Item = &'a CartLine> + 'a {
        self.lines.iter().filter(move |l| selection.contains(&l.product_id))
    }
}

impl From<Vec<CartLine>> for Cart {
    /// Rebuilds a cart through `add_item` so duplicated products merge.
    fn from(lines: Vec<CartLine>) -> Self {
        let mut cart = Cart::new();
        for line in lines { cart.add_item(line); }
        cart
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self { cart.lines }
}

/// Persisted line shape before the quantity invariant is checked.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLine {
    product_id: ProductId,
    name: String,
    unit_price: Won,
    quantity: u32,
    #[serde(default)]
    image_url: Option<String>,
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored = Vec::<StoredLine>::deserialize(deserializer)?;
        let lines = stored
            .into_iter()
            .filter_map(|l| match NonZeroU32::new(l.quantity) {
                Some(quantity) => Some(CartLine {
                    product_id: l.product_id,
                    name: l.name,
                    unit_price: l.unit_price,
                    quantity,
                    image_url: l.image_url,
                }),
                None => {
                    warn!(product_id = %l.product_id, "skipping stored cart line with zero quantity");
                    None
                }
            })
            .collect::<Vec<_>>();
        Ok(Cart::from(lines))
    }
}
