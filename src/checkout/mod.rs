//! Checkout flow: selection, coupon, pricing and order submission.
//!
//! A [`Checkout`] lives for one checkout attempt. It tracks which cart lines are
//! selected, the coupon the shopper applied, and the submission state machine
//! described on [`CheckoutState`]. Order creation is the point of commitment: once
//! the order service has returned an id, the flow completes and the ordered lines
//! leave the cart whatever the payment attempt does.

pub mod errors;
pub mod state;

use chrono::Utc;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};
use uuid::Uuid;
use crate::domain::aggregates::{Cart, CartLine, DraftOrder, ShippingForm};
use crate::domain::events::CheckoutEvent;
use crate::domain::pricing::{PriceBreakdown, PricingPolicy};
use crate::domain::value_objects::{CouponCode, PaymentMethod, ProductId, Won};
use crate::services::{CouponService, CreateOrderRequest, OrderService, PaymentRequest, PaymentService};
use crate::store::{CartStorage, CartStore};

pub use errors::CheckoutError;
pub use state::{CheckoutState, OrderReceipt, PaymentOutcome};

/// The signed-in shopper.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Session {
    pub user_id: i64,
}

/// Remote services a checkout talks to.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub coupons: &'a dyn CouponService,
    pub orders: &'a dyn OrderService,
    pub payments: &'a dyn PaymentService,
}

impl<'a> Services<'a> {
    /// Uses one client for every service, as with the API gateway.
    pub fn from_client<C>(client: &'a C) -> Self
    where
        C: CouponService + OrderService + PaymentService,
    {
        Self { coupons: client, orders: client, payments: client }
    }
}

impl std::fmt::Debug for Services<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str("Services") }
}

/// A coupon discount as previewed for a given subtotal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedCoupon {
    pub code: CouponCode,
    pub discount: Won,
    pub previewed_subtotal: Won,
}

#[derive(Debug)]
pub struct Checkout {
    state: CheckoutState,
    policy: PricingPolicy,
    selection: BTreeSet<ProductId>,
    coupon: Option<AppliedCoupon>,
    idempotency_key: Uuid,
    last_request: Option<CreateOrderRequest>,
    events: Vec<CheckoutEvent>,
}

impl Checkout {
    /// Starts a checkout with every line of `cart` selected.
    pub fn new(cart: &Cart, policy: PricingPolicy) -> Self {
        Self {
            state: CheckoutState::Idle,
            policy,
            selection: cart.product_ids(),
            coupon: None,
            idempotency_key: Uuid::new_v4(),
            last_request: None,
            events: vec![],
        }
    }

    pub fn state(&self) -> &CheckoutState { &self.state }
    pub fn policy(&self) -> &PricingPolicy { &self.policy }
    pub fn selection(&self) -> &BTreeSet<ProductId> { &self.selection }
    pub fn coupon(&self) -> Option<&AppliedCoupon> { self.coupon.as_ref() }
    /// Key of the latest order-creation attempt.
    ///
    /// A resubmit with an identical request reuses it. A resubmit whose request
    /// changed (lines, address, coupon, payment method or total) gets a fresh key.
    pub fn idempotency_key(&self) -> Uuid { self.idempotency_key }

    pub fn select(&mut self, product_id: ProductId) { self.selection.insert(product_id); }
    pub fn deselect(&mut self, product_id: ProductId) { self.selection.remove(&product_id); }
    pub fn set_selection(&mut self, selection: impl IntoIterator<Item = ProductId>) {
        self.selection = selection.into_iter().collect();
    }

    pub fn selected_lines<'a>(&'a self, cart: &'a Cart) -> impl Iterator<Item = &'a CartLine> + 'a {
        cart.selected(&self.selection)
    }

    pub fn subtotal(&self, cart: &Cart) -> Won { self.policy.subtotal(self.selected_lines(cart)) }

    /// True when the cart changed since the coupon was previewed.
    pub fn coupon_is_stale(&self, cart: &Cart) -> bool {
        self.coupon.as_ref().is_some_and(|c| c.previewed_subtotal != self.subtotal(cart))
    }

    /// Prices the current selection. A stale coupon contributes no discount until it
    /// is previewed again.
    pub fn quote(&self, cart: &Cart) -> PriceBreakdown {
        let discount = match &self.coupon {
            Some(c) if !self.coupon_is_stale(cart) => c.discount,
            _ => Won::ZERO,
        };
        self.policy.quote(self.selected_lines(cart), discount)
    }

    /// Whether the submit button is enabled.
    pub fn can_submit(&self, cart: &Cart) -> bool {
        !self.state.is_pending() && !self.state.is_terminal() && self.selected_lines(cart).next().is_some()
    }

    pub fn take_events(&mut self) -> Vec<CheckoutEvent> { std::mem::take(&mut self.events) }

    /// Previews `code` against the current subtotal and keeps it on success. On failure
    /// any previously applied coupon is dropped so no stale discount lingers.
    pub async fn apply_coupon(
        &mut self,
        cart: &Cart,
        code: CouponCode,
        coupons: &dyn CouponService,
    ) -> Result<Won, CheckoutError> {
        self.ensure_idle()?;
        let subtotal = self.subtotal(cart);
        if subtotal.is_zero() {
            return Err(CheckoutError::EmptySelection);
        }
        self.preview_coupon(code, subtotal, coupons).await
    }

    pub fn remove_coupon(&mut self) { self.coupon = None; }

    /// Runs the submission state machine to completion or failure.
    ///
    /// # Errors
    ///
    /// Validation, empty selection and coupon rejection fail before the order is
    /// created; an order-creation failure leaves the cart untouched so the same
    /// checkout can be resubmitted. A payment failure is not an error.
    ///
    /// An attached coupon is previewed again first. If that preview is rejected
    /// the coupon is dropped, so resubmitting places the order without it at the
    /// undiscounted total shown by [`Checkout::quote`].
    pub async fn submit<S: CartStorage>(
        &mut self,
        store: &mut CartStore<S>,
        form: &ShippingForm,
        payment_method: PaymentMethod,
        session: &Session,
        services: &Services<'_>,
    ) -> Result<OrderReceipt, CheckoutError> {
        self.ensure_idle()?;
        self.transition(CheckoutState::Validating);

        if let Err(fields) = form.check() {
            self.events.push(CheckoutEvent::ValidationFailed { messages: fields.iter().map(ToString::to_string).collect() });
            return Err(self.fail(CheckoutError::Validation(fields)));
        }

        let lines: Vec<CartLine> = self.selected_lines(store.cart()).cloned().collect();
        if lines.is_empty() {
            return Err(self.fail(CheckoutError::EmptySelection));
        }

        let subtotal = self.policy.subtotal(&lines);
        let discount = match self.coupon.as_ref().map(|c| c.code.clone()) {
            Some(code) => match self.preview_coupon(code, subtotal, services.coupons).await {
                Ok(discount) => discount,
                Err(e) => return Err(self.fail(e)),
            },
            None => Won::ZERO,
        };

        let draft = DraftOrder {
            pricing: self.policy.quote(&lines, discount),
            lines,
            shipping: form.clone(),
            coupon: self.coupon.as_ref().map(|c| c.code.clone()),
            payment_method,
        };
        let request = CreateOrderRequest::from_draft(session.user_id, &draft);

        self.rotate_key_if_changed(&request);
        self.transition(CheckoutState::Submitting);
        let order = match services.orders.create_order(&request, self.idempotency_key).await {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, idempotency_key = %self.idempotency_key, "order creation failed");
                self.events.push(CheckoutEvent::OrderFailed { reason: e.to_string() });
                return Err(self.fail(CheckoutError::OrderCreation(e)));
            }
        };
        info!(order_id = %order.id, order_number = %order.order_number, total = draft.pricing.total.amount(), "order created");
        self.events.push(CheckoutEvent::OrderCreated { order_id: order.id, order_number: order.order_number.clone() });
        self.transition(CheckoutState::AwaitingPayment { order_id: order.id });

        let amount = match order.total_amount {
            Some(server_total) => {
                if server_total != draft.pricing.total {
                    warn!(order_id = %order.id, client = draft.pricing.total.amount(), server = server_total.amount(), "order total differs from client quote");
                }
                server_total
            }
            None => draft.pricing.total,
        };
        let payment = PaymentRequest { order_id: order.id, amount, payment_method };
        let outcome = match services.payments.attempt_payment(&payment).await {
            Ok(()) => PaymentOutcome::Accepted,
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "payment attempt failed, order kept");
                self.events.push(CheckoutEvent::PaymentFailed { order_id: order.id, reason: e.to_string() });
                PaymentOutcome::Failed { reason: e.to_string() }
            }
        };

        let ordered: BTreeSet<ProductId> = draft.lines.iter().map(|l| l.product_id).collect();
        if let Err(e) = store.remove_lines(&ordered) {
            warn!(order_id = %order.id, error = %e, "ordered lines removed but cart not persisted");
        }
        self.selection.clear();
        self.coupon = None;

        self.transition(CheckoutState::Completed { order_id: order.id, order_number: order.order_number.clone() });
        self.events.push(CheckoutEvent::Completed { order_id: order.id });
        Ok(OrderReceipt {
            order_id: order.id,
            order_number: order.order_number,
            amount,
            payment: outcome,
            placed_at: Utc::now(),
        })
    }

    async fn preview_coupon(
        &mut self,
        code: CouponCode,
        subtotal: Won,
        coupons: &dyn CouponService,
    ) -> Result<Won, CheckoutError> {
        match coupons.preview(&code, subtotal).await {
            Ok(preview) => {
                let discount = preview.discount_amount;
                let applied = discount.min(subtotal + self.policy.shipping_fee(subtotal));
                info!(%code, discount = applied.amount(), subtotal = subtotal.amount(), "coupon applied");
                self.events.push(CheckoutEvent::CouponApplied { code: code.clone(), discount: applied });
                self.coupon = Some(AppliedCoupon { code, discount, previewed_subtotal: subtotal });
                Ok(applied)
            }
            Err(e) => {
                warn!(%code, error = %e, "coupon rejected");
                self.coupon = None;
                self.events.push(CheckoutEvent::CouponRejected { code: code.clone(), reason: e.to_string() });
                Err(CheckoutError::CouponRejected { code, source: e })
            }
        }
    }

    fn rotate_key_if_changed(&mut self, request: &CreateOrderRequest) {
        match &self.last_request {
            Some(last) if last == request => return,
            Some(_) => {
                let previous = std::mem::replace(&mut self.idempotency_key, Uuid::new_v4());
                debug!(%previous, idempotency_key = %self.idempotency_key, "order request changed, new idempotency key");
            }
            None => {}
        }
        self.last_request = Some(request.clone());
    }

    fn ensure_idle(&self) -> Result<(), CheckoutError> {
        if self.state.is_terminal() { return Err(CheckoutError::AlreadyCompleted); }
        if self.state.is_pending() { return Err(CheckoutError::InProgress); }
        Ok(())
    }

    fn fail(&mut self, error: CheckoutError) -> CheckoutError {
        self.transition(CheckoutState::Failed { reason: error.to_string() });
        error
    }

    fn transition(&mut self, next: CheckoutState) {
        let (from, to) = (self.state.name(), next.name());
        debug!(from, to, "checkout state");
        self.events.push(CheckoutEvent::StateChanged { from, to });
        self.state = next;
    }
}
