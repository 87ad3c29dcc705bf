//! LiveMart Checkout
//!
//! Client-side cart and checkout core of the LiveMart web client.
//!
//! ## Features
//! - Cart store persisted through a pluggable storage slot
//! - Shipping-fee thresholds and coupon discounts
//! - Checkout state machine over the order, payment and coupon services
//!
//! The order service is authoritative for prices; everything computed here is
//! what the shopper sees before submitting.

pub mod checkout;
pub mod config;
pub mod domain;
pub mod services;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{Checkout, CheckoutError, CheckoutState, OrderReceipt, PaymentOutcome, Services, Session};
pub use domain::aggregates::{Cart, CartLine, DraftOrder, FieldError, ShippingForm};
pub use domain::events::CheckoutEvent;
pub use domain::pricing::{PriceBreakdown, PricingPolicy};
pub use domain::value_objects::{CouponCode, OrderId, PaymentMethod, ProductId, Won};
pub use services::{LiveMartClient, ServiceError};
pub use store::{CartStorage, CartStore, FileStorage, MemoryStorage, StorageError};
