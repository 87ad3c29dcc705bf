//! `reqwest` client for the LiveMart API gateway.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;
use crate::domain::value_objects::{CouponCode, Won};
use super::{
    CouponPreview, CouponService, CreateOrderRequest, CreatedOrder, OrderService, PaymentRequest, PaymentService,
    ServiceError,
};

/// Connection settings for the API gateway.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Gateway base, e.g. `"https://api.livemart.kr/api"`. Paths are appended to it.
    pub base_url: String,

    /// Bearer token of the signed-in user, forwarded on every request.
    pub access_token: Option<String>,

    pub timeout: Duration,
}

/// One client for all three services; they share the gateway and credentials.
#[derive(Debug, Clone)]
pub struct LiveMartClient {
    base: Url,
    access_token: Option<String>,
    http: Client,
}

impl LiveMartClient {
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry paths or the HTTP client
    /// cannot be built.
    pub fn new(config: HttpConfig) -> Result<Self, ServiceError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| ServiceError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(ServiceError::InvalidUrl(config.base_url));
        }
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { base, access_token: config.access_token, http })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ServiceError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn ensure_success(response: Response) -> Result<Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ServiceError::Status { status: status.as_u16(), body })
    }
}

#[async_trait]
impl CouponService for LiveMartClient {
    async fn preview(&self, code: &CouponCode, order_amount: Won) -> Result<CouponPreview, ServiceError> {
        let url = self.endpoint(&["coupons", code.as_str(), "preview"])?;
        debug!(%url, order_amount = order_amount.amount(), "coupon preview");
        let response = self
            .request(Method::GET, url)
            .query(&[("orderAmount", order_amount.amount())])
            .send()
            .await?;
        Ok(Self::ensure_success(response).await?.json().await?)
    }
}

#[async_trait]
impl OrderService for LiveMartClient {
    async fn create_order(&self, request: &CreateOrderRequest, idempotency_key: Uuid) -> Result<CreatedOrder, ServiceError> {
        let url = self.endpoint(&["orders"])?;
        debug!(%url, %idempotency_key, items = request.items.len(), "create order");
        let response = self
            .request(Method::POST, url)
            .header("Idempotency-Key", idempotency_key.to_string())
            .json(request)
            .send()
            .await?;
        Ok(Self::ensure_success(response).await?.json().await?)
    }
}

#[async_trait]
impl PaymentService for LiveMartClient {
    async fn attempt_payment(&self, request: &PaymentRequest) -> Result<(), ServiceError> {
        let url = self.endpoint(&["payments"])?;
        debug!(%url, order_id = %request.order_id, amount = request.amount.amount(), "attempt payment");
        let response = self.request(Method::POST, url).json(request).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}
