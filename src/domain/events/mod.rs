//! Checkout events, drained by the UI and shown as toasts or banners.
use crate::domain::value_objects::{CouponCode, OrderId, Won};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutEvent {
    StateChanged { from: &'static str, to: &'static str },
    /// `discount` is the previewed amount clamped to subtotal plus shipping, as `quote` applies it.
    CouponApplied { code: CouponCode, discount: Won },
    CouponRejected { code: CouponCode, reason: String },
    ValidationFailed { messages: Vec<String> },
    OrderCreated { order_id: OrderId, order_number: String },
    OrderFailed { reason: String },
    PaymentFailed { order_id: OrderId, reason: String },
    Completed { order_id: OrderId },
}

impl CheckoutEvent {
    /// Whether the event should be surfaced to the shopper rather than only traced.
    pub fn is_user_facing(&self) -> bool { !matches!(self, Self::StateChanged { .. }) }
}
