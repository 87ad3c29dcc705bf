//! Checkout errors

use thiserror::Error;
use crate::domain::aggregates::FieldError;
use crate::domain::value_objects::CouponCode;
use crate::services::ServiceError;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("please check the shipping form: {}", describe(.0))]
    Validation(Vec<FieldError>),

    #[error("no items selected for checkout")]
    EmptySelection,

    /// The coupon was dropped and the discount reset to zero.
    #[error("coupon {code} cannot be used: {source}")]
    CouponRejected {
        code: CouponCode,
        #[source]
        source: ServiceError,
    },

    /// The cart is untouched and the checkout can be resubmitted.
    #[error("order could not be placed: {0}")]
    OrderCreation(#[source] ServiceError),

    #[error("checkout already completed")]
    AlreadyCompleted,

    #[error("checkout is already in progress")]
    InProgress,
}

fn describe(fields: &[FieldError]) -> String {
    fields.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl CheckoutError {
    /// Whether resubmitting the same checkout can succeed without changing anything.
    pub fn is_retryable(&self) -> bool { matches!(self, Self::OrderCreation(_)) }
}
