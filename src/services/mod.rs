//! Remote contracts consumed by checkout: coupon preview, order creation and payment.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use crate::domain::aggregates::DraftOrder;
use crate::domain::value_objects::{CouponCode, OrderId, PaymentMethod, ProductId, Won};

pub use http::{HttpConfig, LiveMartClient};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponPreview {
    pub discount_amount: Won,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Won,
}

/// Body of `POST /orders`. `total_amount` is what the client displayed; the order
/// service recomputes the amount it actually charges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: i64,
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub delivery_memo: Option<String>,
    pub coupon_code: Option<CouponCode>,
    pub payment_method: PaymentMethod,
    pub total_amount: Won,
}

impl CreateOrderRequest {
    pub fn from_draft(user_id: i64, draft: &DraftOrder) -> Self {
        Self {
            user_id,
            items: draft.lines.iter().map(|l| OrderItemRequest {
                product_id: l.product_id,
                quantity: l.quantity.get(),
                price: l.unit_price,
            }).collect(),
            shipping_address: draft.shipping.full_address(),
            recipient_name: draft.shipping.recipient_name.trim().to_string(),
            recipient_phone: draft.shipping.recipient_phone.trim().to_string(),
            delivery_memo: draft.shipping.memo(),
            coupon_code: draft.coupon.clone(),
            payment_method: draft.payment_method,
            total_amount: draft.pricing.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub id: OrderId,
    pub order_number: String,
    /// Amount computed by the order service, when it reports one.
    #[serde(default)]
    pub total_amount: Option<Won>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub amount: Won,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Transport failure, timeout, or a body that did not decode.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid service url: {0}")]
    InvalidUrl(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CouponService: Send + Sync {
    /// Estimates the discount `code` would give on `order_amount` without redeeming it.
    async fn preview(&self, code: &CouponCode, order_amount: Won) -> Result<CouponPreview, ServiceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Creates an order. Repeating a call with the same `idempotency_key` must not
    /// create a second order.
    async fn create_order(&self, request: &CreateOrderRequest, idempotency_key: Uuid) -> Result<CreatedOrder, ServiceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn attempt_payment(&self, request: &PaymentRequest) -> Result<(), ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{CartLine, ShippingForm};
    use crate::domain::pricing::PricingPolicy;
    use std::num::NonZeroU32;

    #[test]
    fn test_order_request_wire_shape() {
        let lines = vec![CartLine::new(ProductId::new(10), "Tumbler", Won::new(20_000), NonZeroU32::new(2).unwrap())];
        let draft = DraftOrder {
            pricing: PricingPolicy::default().quote(&lines, Won::ZERO),
            lines,
            shipping: ShippingForm {
                recipient_name: " 이지은 ".into(),
                recipient_phone: "010-0000-1111".into(),
                postal_code: "04524".into(),
                address: "서울 중구 세종대로 110".into(),
                address_detail: String::new(),
                delivery_memo: "문 앞".into(),
            },
            coupon: Some(CouponCode::new("SPRING").unwrap()),
            payment_method: PaymentMethod::KakaoPay,
        };

        let json = serde_json::to_value(CreateOrderRequest::from_draft(42, &draft)).unwrap();
        assert_eq!(json, serde_json::json!({
            "userId": 42,
            "items": [{"productId": 10, "quantity": 2, "price": 20000}],
            "shippingAddress": "(04524) 서울 중구 세종대로 110",
            "recipientName": "이지은",
            "recipientPhone": "010-0000-1111",
            "deliveryMemo": "문 앞",
            "couponCode": "SPRING",
            "paymentMethod": "KAKAO_PAY",
            "totalAmount": 43000
        }));
    }

    #[test]
    fn test_created_order_without_total() {
        let order: CreatedOrder = serde_json::from_str(r#"{"id":7,"orderNumber":"LM-20240001","status":"PENDING"}"#).unwrap();
        assert_eq!(order.id, OrderId::new(7));
        assert_eq!(order.total_amount, None);
    }
}
