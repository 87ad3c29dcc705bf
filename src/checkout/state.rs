//! Checkout lifecycle states and the receipt of a completed checkout.

use chrono::{DateTime, Utc};
use crate::domain::value_objects::{OrderId, Won};

/// ```text
/// Idle ─► Validating ─► Submitting ─► AwaitingPayment ─► Completed (terminal)
///              │             │
///              └─────────────┴─► Failed ─► Validating (resubmit)
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CheckoutState {
    #[default]
    Idle,
    Validating,
    Submitting,
    /// The order exists; the payment attempt is in flight.
    AwaitingPayment { order_id: OrderId },
    Completed { order_id: OrderId, order_number: String },
    Failed { reason: String },
}

impl CheckoutState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Submitting => "submitting",
            Self::AwaitingPayment { .. } => "awaiting_payment",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }

    /// A request is in flight; the UI shows a spinner and disables the submit button.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Validating | Self::Submitting | Self::AwaitingPayment { .. })
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Completed { .. }) }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentOutcome {
    Accepted,
    /// The order stands; payment can be retried from the order page.
    Failed { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub order_number: String,
    /// Amount sent to the payment service.
    pub amount: Won,
    pub payment: PaymentOutcome,
    pub placed_at: DateTime<Utc>,
}

impl OrderReceipt {
    /// Where the UI navigates once checkout completes.
    pub fn detail_path(&self) -> String { format!("/orders/{}", self.order_id) }
}
