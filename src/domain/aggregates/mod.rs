//! Aggregates module
pub mod cart;
pub mod draft_order;

pub use cart::{Cart, CartLine};
pub use draft_order::{DraftOrder, FieldError, ShippingForm};
