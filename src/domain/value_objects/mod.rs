//! Value Objects for the cart and checkout

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Korean won amount. The won has no fractional unit, so amounts are whole numbers.
///
/// Arithmetic saturates: a cart total can never wrap, and subtraction floors at zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Won(u64);

impl Won {
    pub const ZERO: Won = Won(0);

    pub const fn new(amount: u64) -> Self { Self(amount) }
    pub fn amount(&self) -> u64 { self.0 }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
    pub fn multiply(&self, qty: u32) -> Won { Won(self.0.saturating_mul(u64::from(qty))) }
}

impl Add for Won {
    type Output = Won;
    fn add(self, rhs: Won) -> Won { Won(self.0.saturating_add(rhs.0)) }
}

impl Sub for Won {
    type Output = Won;
    fn sub(self, rhs: Won) -> Won { Won(self.0.saturating_sub(rhs.0)) }
}

impl Sum for Won {
    fn sum<I: Iterator<Item = Won>>(iter: I) -> Won { iter.fold(Won::ZERO, |acc, w| acc + w) }
}

impl From<u64> for Won {
    fn from(amount: u64) -> Self { Self(amount) }
}

impl fmt::Display for Won {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 { grouped.push(','); }
            grouped.push(ch);
        }
        f.pad(&format!("₩{grouped}"))
    }
}

/// Catalog identity of a product, as issued by the product service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    pub const fn new(value: i64) -> Self { Self(value) }
    pub fn value(&self) -> i64 { self.0 }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}

/// Order identity returned by the order service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(i64);

impl OrderId {
    pub const fn new(value: i64) -> Self { Self(value) }
    pub fn value(&self) -> i64 { self.0 }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Coupon code as typed by the user, trimmed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouponCode(String);

impl CouponCode {
    pub fn new(value: impl Into<String>) -> Result<Self, CouponCodeError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(CouponCodeError::Empty); }
        if value.len() > 64 { return Err(CouponCodeError::TooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl FromStr for CouponCode {
    type Err = CouponCodeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::new(s) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponCodeError {
    #[error("coupon code is empty")]
    Empty,
    #[error("coupon code is too long")]
    TooLong,
}

/// Payment methods offered at checkout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Card,
    KakaoPay,
    NaverPay,
    BankTransfer,
    VirtualAccount,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Card,
        PaymentMethod::KakaoPay,
        PaymentMethod::NaverPay,
        PaymentMethod::BankTransfer,
        PaymentMethod::VirtualAccount,
    ];

    /// Name used on the wire by the order and payment services.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "CARD",
            Self::KakaoPay => "KAKAO_PAY",
            Self::NaverPay => "NAVER_PAY",
            Self::BankTransfer => "BANK_TRANSFER",
            Self::VirtualAccount => "VIRTUAL_ACCOUNT",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    /// Accepts the wire name in any case, with `-` in place of `_` (`kakao-pay`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| UnknownPaymentMethod(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown payment method: {0}")]
pub struct UnknownPaymentMethod(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_won_display() {
        assert_eq!(Won::new(0).to_string(), "₩0");
        assert_eq!(Won::new(999).to_string(), "₩999");
        assert_eq!(Won::new(55_000).to_string(), "₩55,000");
        assert_eq!(Won::new(1_234_567).to_string(), "₩1,234,567");
    }

    #[test]
    fn test_won_saturates() {
        assert_eq!(Won::new(3_000) - Won::new(5_000), Won::ZERO);
        assert_eq!(Won::new(u64::MAX) + Won::new(1), Won::new(u64::MAX));
        assert_eq!(Won::new(u64::MAX).multiply(2), Won::new(u64::MAX));
    }

    #[test]
    fn test_coupon_code() {
        assert_eq!(CouponCode::new("  WELCOME10 ").unwrap().as_str(), "WELCOME10");
        assert_eq!(CouponCode::new("   "), Err(CouponCodeError::Empty));
        assert_eq!(CouponCode::new("X".repeat(65)), Err(CouponCodeError::TooLong));
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("kakao-pay".parse::<PaymentMethod>().unwrap(), PaymentMethod::KakaoPay);
        assert_eq!("VIRTUAL_ACCOUNT".parse::<PaymentMethod>().unwrap(), PaymentMethod::VirtualAccount);
        assert!("cash".parse::<PaymentMethod>().is_err());
        assert_eq!(serde_json::to_string(&PaymentMethod::NaverPay).unwrap(), "\"NAVER_PAY\"");
    }
}
