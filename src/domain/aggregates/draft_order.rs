//! Draft order assembled at checkout time

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};
use crate::domain::aggregates::CartLine;
use crate::domain::pricing::PriceBreakdown;
use crate::domain::value_objects::{CouponCode, PaymentMethod};

/// Shipping details typed into the checkout form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShippingForm {
    #[validate(custom = "not_blank")]
    pub recipient_name: String,
    #[validate(custom = "not_blank")]
    pub recipient_phone: String,
    pub postal_code: String,
    #[validate(custom = "not_blank")]
    pub address: String,
    pub address_detail: String,
    pub delivery_memo: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() { return Err(ValidationError::new("required")); }
    Ok(())
}

impl ShippingForm {
    /// Checks the required fields, reporting every offending field at once.
    pub fn check(&self) -> Result<(), Vec<FieldError>> {
        self.validate().map_err(|errors| {
            let mut fields: Vec<FieldError> = errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errs)| errs.iter().map(move |e| FieldError::new(field, e.code.as_ref())))
                .collect();
            fields.sort_by(|a, b| a.field.cmp(&b.field));
            fields
        })
    }

    /// Single-line address as the order service stores it: `(postal) address detail`.
    pub fn full_address(&self) -> String {
        let postal = self.postal_code.trim();
        let parts = [
            if postal.is_empty() { String::new() } else { format!("({postal})") },
            self.address.trim().to_string(),
            self.address_detail.trim().to_string(),
        ];
        parts.into_iter().filter(|p| !p.is_empty()).collect::<Vec<_>>().join(" ")
    }

    pub fn memo(&self) -> Option<String> {
        let memo = self.delivery_memo.trim();
        (!memo.is_empty()).then(|| memo.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub code: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, code: impl Into<String>) -> Self {
        Self { field: field.into(), code: code.into() }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.field.replace('_', " ");
        match self.code.as_str() {
            "required" => write!(f, "{label} is required"),
            other => write!(f, "{label} is invalid ({other})"),
        }
    }
}

/// Everything needed to place an order, frozen at the moment of submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DraftOrder {
    pub lines: Vec<CartLine>,
    pub shipping: ShippingForm,
    pub coupon: Option<CouponCode>,
    pub payment_method: PaymentMethod,
    pub pricing: PriceBreakdown,
}
