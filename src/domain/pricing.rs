//! Checkout pricing: subtotal, shipping fee, coupon discount and total.
//!
//! Everything here is a pure function of the selected lines. The numbers are
//! advisory; the order service recomputes the authoritative charge.

use serde::{Deserialize, Serialize};
use crate::domain::aggregates::CartLine;
use crate::domain::value_objects::Won;

pub const FREE_SHIPPING_THRESHOLD: Won = Won::new(50_000);
pub const FLAT_SHIPPING_FEE: Won = Won::new(3_000);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Subtotal at or above which shipping is free.
    pub free_shipping_threshold: Won,
    pub flat_shipping_fee: Won,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self { free_shipping_threshold: FREE_SHIPPING_THRESHOLD, flat_shipping_fee: FLAT_SHIPPING_FEE }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub subtotal: Won,
    pub shipping_fee: Won,
    pub discount: Won,
    pub total: Won,
}

impl PricingPolicy {
    pub fn subtotal<'a>(&self, lines: impl IntoIterator<Item = &'a CartLine>) -> Won {
        lines.into_iter().map(CartLine::line_total).sum()
    }

    pub fn shipping_fee(&self, subtotal: Won) -> Won {
        if subtotal.is_zero() || subtotal >= self.free_shipping_threshold { Won::ZERO } else { self.flat_shipping_fee }
    }

    /// Prices a selection. The discount is clamped so the total never drops below zero,
    /// and an empty selection prices to all zeros whatever the discount.
    pub fn quote<'a>(&self, lines: impl IntoIterator<Item = &'a CartLine>, discount: Won) -> PriceBreakdown {
        let subtotal = self.subtotal(lines);
        if subtotal.is_zero() { return PriceBreakdown::default(); }
        let shipping_fee = self.shipping_fee(subtotal);
        let gross = subtotal + shipping_fee;
        let discount = discount.min(gross);
        PriceBreakdown { subtotal, shipping_fee, discount, total: gross - discount }
    }
}
