//! End-to-end checkout against an in-process fake of the LiveMart gateway.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use livemart_checkout::{
    services::HttpConfig, CartLine, CartStore, Checkout, CheckoutError, CheckoutState, CouponCode, LiveMartClient,
    MemoryStorage, PaymentMethod, PaymentOutcome, PricingPolicy, ProductId, ServiceError, Services, Session,
    ShippingForm, Won,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Backend {
    fail_orders: bool,
    fail_payments: bool,
    previews: Arc<Mutex<Vec<(String, u64)>>>,
    orders: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
    payments: Arc<Mutex<Vec<Value>>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewQuery {
    order_amount: u64,
}

async fn preview(
    State(backend): State<Backend>,
    Path(code): Path<String>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    backend.previews.lock().unwrap().push((code.clone(), query.order_amount));
    match code.as_str() {
        "WELCOME" => Ok(Json(json!({ "discountAmount": 5000 }))),
        _ => Err((StatusCode::NOT_FOUND, "coupon not found".into())),
    }
}

async fn create_order(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if backend.fail_orders {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "order-service down" })));
    }
    let total = body["totalAmount"].clone();
    backend.orders.lock().unwrap().push((headers, body));
    (StatusCode::CREATED, Json(json!({ "id": 101, "orderNumber": "LM-000101", "totalAmount": total, "status": "PENDING" })))
}

async fn pay(State(backend): State<Backend>, Json(body): Json<Value>) -> StatusCode {
    backend.payments.lock().unwrap().push(body);
    if backend.fail_payments { StatusCode::BAD_GATEWAY } else { StatusCode::OK }
}

async fn spawn(backend: Backend) -> String {
    let app = Router::new()
        .route("/api/coupons/:code/preview", get(preview))
        .route("/api/orders", post(create_order))
        .route("/api/payments", post(pay))
        .with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}/api")
}

fn client(base_url: String) -> LiveMartClient {
    LiveMartClient::new(HttpConfig {
        base_url,
        access_token: Some("test-token".into()),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn cart() -> CartStore<MemoryStorage> {
    let mut store = CartStore::open(MemoryStorage::new());
    store.add_item(CartLine::new(ProductId::new(10), "텀블러", Won::new(20_000), NonZeroU32::new(1).unwrap())).unwrap();
    store.add_item(CartLine::new(ProductId::new(11), "머그컵", Won::new(35_000), NonZeroU32::new(1).unwrap())).unwrap();
    store
}

fn form() -> ShippingForm {
    ShippingForm {
        recipient_name: "최유나".into(),
        recipient_phone: "010-5555-6666".into(),
        postal_code: "34126".into(),
        address: "대전 유성구 대학로 99".into(),
        address_detail: "".into(),
        delivery_memo: "".into(),
    }
}

const SESSION: Session = Session { user_id: 7 };

#[tokio::test]
async fn test_checkout_with_coupon_end_to_end() {
    let backend = Backend::default();
    let client = client(spawn(backend.clone()).await);
    let services = Services::from_client(&client);
    let mut store = cart();
    let mut checkout = Checkout::new(store.cart(), PricingPolicy::default());

    let discount = checkout.apply_coupon(store.cart(), CouponCode::new("WELCOME").unwrap(), &client).await.unwrap();
    assert_eq!(discount, Won::new(5_000));
    assert_eq!(checkout.quote(store.cart()).total, Won::new(50_000));

    let receipt = checkout.submit(&mut store, &form(), PaymentMethod::KakaoPay, &SESSION, &services).await.unwrap();
    assert_eq!(receipt.order_number, "LM-000101");
    assert_eq!(receipt.amount, Won::new(50_000));
    assert_eq!(receipt.payment, PaymentOutcome::Accepted);
    assert!(store.cart().is_empty());

    // Applied once, then previewed again right before the order.
    assert_eq!(*backend.previews.lock().unwrap(), vec![("WELCOME".to_string(), 55_000), ("WELCOME".to_string(), 55_000)]);

    let orders = backend.orders.lock().unwrap();
    let (headers, body) = &orders[0];
    assert_eq!(headers["authorization"], "Bearer test-token");
    assert_eq!(headers["idempotency-key"].to_str().unwrap(), checkout.idempotency_key().to_string());
    assert_eq!(body["userId"], 7);
    assert_eq!(body["couponCode"], "WELCOME");
    assert_eq!(body["paymentMethod"], "KAKAO_PAY");
    assert_eq!(body["shippingAddress"], "(34126) 대전 유성구 대학로 99");
    assert_eq!(body["deliveryMemo"], Value::Null);
    assert_eq!(body["items"], json!([
        { "productId": 10, "quantity": 1, "price": 20000 },
        { "productId": 11, "quantity": 1, "price": 35000 }
    ]));

    let payments = backend.payments.lock().unwrap();
    assert_eq!(payments[0], json!({ "orderId": 101, "amount": 50000, "paymentMethod": "KAKAO_PAY" }));
}

#[tokio::test]
async fn test_unknown_coupon_is_rejected() {
    let client = client(spawn(Backend::default()).await);
    let store = cart();
    let mut checkout = Checkout::new(store.cart(), PricingPolicy::default());

    let err = checkout.apply_coupon(store.cart(), CouponCode::new("NOPE").unwrap(), &client).await.unwrap_err();
    match err {
        CheckoutError::CouponRejected { source: ServiceError::Status { status, .. }, .. } => assert_eq!(status, 404),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(checkout.quote(store.cart()).total, Won::new(55_000));
}

#[tokio::test]
async fn test_order_failure_keeps_cart() {
    let backend = Backend { fail_orders: true, ..Backend::default() };
    let client = client(spawn(backend.clone()).await);
    let services = Services::from_client(&client);
    let mut store = cart();
    let mut checkout = Checkout::new(store.cart(), PricingPolicy::default());

    let err = checkout.submit(&mut store, &form(), PaymentMethod::Card, &SESSION, &services).await.unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(checkout.state(), CheckoutState::Failed { .. }));
    assert_eq!(store.cart().item_count(), 2);
    assert!(backend.payments.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_payment_failure_keeps_order() {
    let backend = Backend { fail_payments: true, ..Backend::default() };
    let client = client(spawn(backend.clone()).await);
    let services = Services::from_client(&client);
    let mut store = cart();
    let mut checkout = Checkout::new(store.cart(), PricingPolicy::default());

    let receipt = checkout.submit(&mut store, &form(), PaymentMethod::Card, &SESSION, &services).await.unwrap();
    assert!(matches!(receipt.payment, PaymentOutcome::Failed { .. }));
    assert_eq!(receipt.detail_path(), "/orders/101");
    assert!(store.cart().is_empty());
    assert_eq!(backend.payments.lock().unwrap().len(), 1);
}
