//! Order lifecycle orchestration.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use common::{Clock, OrderId, UserId};
use domain::{
    Money, NewOrder, Order, OrderItem, OrderStatus, StockAdjustment,
};
use serde::Serialize;
use store::{OrderQuery, Store, StoreError};

use crate::commands::{CreateOrder, UpdateStatus, VerifyPayment};
use crate::coupons::CouponDesk;
use crate::error::{CheckoutError, Result};
use crate::gateway::{GatewayOrder, PaymentGateway};
use crate::inventory::InventoryAdjuster;

/// Settings the lifecycle needs from configuration.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    /// Currency code sent to the gateway.
    pub currency: String,
    /// Default age after which a pending order counts as abandoned.
    pub abandoned_after: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            currency: "INR".to_string(),
            abandoned_after: Duration::hours(2),
        }
    }
}

/// Result of placing an order.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedOrder {
    pub order: Order,
    pub gateway_order: GatewayOrder,
    /// Public gateway key the client needs to open checkout.
    pub key_id: String,
    /// Evaluator message when a coupon was supplied.
    pub coupon_message: Option<String>,
}

/// Result of a verified payment.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentConfirmation {
    pub order: Order,
    pub adjustments: Vec<StockAdjustment>,
}

/// Drives orders from creation to delivery.
///
/// Storage, the gateway and the clock are injected so the whole flow can
/// run against in-memory doubles.
pub struct OrderLifecycle<S, G> {
    store: S,
    gateway: G,
    coupons: CouponDesk<S>,
    inventory: InventoryAdjuster<S>,
    clock: Arc<dyn Clock>,
    settings: LifecycleSettings,
}

impl<S, G> OrderLifecycle<S, G>
where
    S: Store,
    G: PaymentGateway,
{
    pub fn new(store: S, gateway: G, clock: Arc<dyn Clock>, settings: LifecycleSettings) -> Self {
        let coupons = CouponDesk::new(store.clone(), clock.clone());
        let inventory = InventoryAdjuster::new(store.clone());
        Self {
            store,
            gateway,
            coupons,
            inventory,
            clock,
            settings,
        }
    }

    pub fn coupons(&self) -> &CouponDesk<S> {
        &self.coupons
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    /// Prices the cart from the catalog, applies the coupon leniently, opens
    /// a gateway order for the final amount and stores a `pending` order.
    #[tracing::instrument(skip(self, cmd), fields(user_id = %cmd.user_id, lines = cmd.lines.len()))]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<CreatedOrder> {
        let started = Instant::now();
        let items = self.price_cart(&cmd).await?;
        let total = Order::price(&items, Money::zero())?.total_amount();

        let mut discount = Money::zero();
        let mut coupon_code = None;
        let mut coupon_message = None;

        if let Some(code) = cmd.coupon_code.as_deref().filter(|c| !c.trim().is_empty()) {
            let evaluation = self.coupons.evaluate_for_order(total, code).await?;
            if evaluation.is_applied() {
                discount = evaluation.discount_amount;
                coupon_code = Some(evaluation.code.clone());
            } else {
                tracing::warn!(
                    code = %evaluation.code,
                    reason = %evaluation.message,
                    "coupon not applied, charging full price"
                );
            }
            coupon_message = Some(evaluation.message);
        }

        let order_id = OrderId::new();
        let final_amount = total.saturating_sub_floor(discount);
        let gateway_order = self
            .gateway
            .create_order(final_amount, &self.settings.currency, &order_id.to_string())
            .await?;

        let order = Order::place(NewOrder {
            id: order_id,
            user_id: cmd.user_id,
            user_email: cmd.user_email,
            items,
            shipping_address: cmd.shipping_address,
            discount_amount: discount,
            coupon_code,
            gateway_order_id: gateway_order.id.clone(),
            placed_at: self.clock.now(),
        })?;
        let order = self.store.insert_order(order).await?;

        metrics::counter!("orders_created_total").increment(1);
        record_duration("create_order", started);
        tracing::info!(
            %order_id,
            gateway_order_id = %gateway_order.id,
            final_amount = %order.final_amount(),
            "order created"
        );

        Ok(CreatedOrder {
            order,
            key_id: self.gateway.key_id().to_string(),
            gateway_order,
            coupon_message,
        })
    }

    async fn price_cart(&self, cmd: &CreateOrder) -> Result<Vec<OrderItem>> {
        if cmd.lines.is_empty() {
            return Err(domain::OrderError::NoItems.into());
        }

        let mut items = Vec::with_capacity(cmd.lines.len());
        for line in &cmd.lines {
            if line.quantity == 0 {
                return Err(domain::OrderError::InvalidQuantity {
                    product_id: line.product_id.clone(),
                    quantity: 0,
                }
                .into());
            }

            let product = self
                .store
                .get_product(&line.product_id)
                .await?
                .ok_or_else(|| CheckoutError::ProductNotFound(line.product_id.clone()))?;

            items.push(OrderItem::new(
                product.id,
                product.name,
                line.color.clone(),
                line.size.clone(),
                line.quantity,
                product.price,
            ));
        }
        Ok(items)
    }

    /// Verifies the gateway signature, then moves the order to `processing`
    /// and decrements stock in one atomic commit.
    ///
    /// A bad signature leaves the order untouched.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn verify_payment(&self, cmd: VerifyPayment) -> Result<PaymentConfirmation> {
        let started = Instant::now();
        let result = self.try_verify_payment(cmd).await;

        match &result {
            Ok(confirmation) => {
                metrics::counter!("payments_verified_total").increment(1);
                tracing::info!(
                    order_id = %confirmation.order.id(),
                    payment_id = confirmation.order.payment_id().unwrap_or_default(),
                    "payment verified"
                );
            }
            Err(error) => {
                metrics::counter!("payments_failed_total").increment(1);
                tracing::warn!(%error, "payment verification failed");
            }
        }

        record_duration("verify_payment", started);
        result
    }

    async fn try_verify_payment(&self, cmd: VerifyPayment) -> Result<PaymentConfirmation> {
        let mut order = self
            .store
            .get_order(cmd.order_id)
            .await?
            .filter(|o| o.user_id() == cmd.user_id)
            .ok_or(CheckoutError::OrderNotFound(cmd.order_id))?;

        self.gateway
            .verify_signature(&cmd.gateway_order_id, &cmd.gateway_payment_id, &cmd.signature)
            .await
            .map_err(|e| CheckoutError::PaymentVerification(e.to_string()))?;

        let expected = order.version();
        order.record_payment(&cmd.gateway_order_id, cmd.gateway_payment_id, self.clock.now())?;

        let (order, adjustments) = self.inventory.commit_paid_order(order, expected).await?;

        Ok(PaymentConfirmation { order, adjustments })
    }

    /// Admin status change along the transition table.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id, status = %cmd.status))]
    pub async fn update_status(&self, cmd: UpdateStatus) -> Result<Order> {
        let started = Instant::now();
        let mut order = self.get(cmd.order_id).await?;
        let from = order.status();
        let expected = order.version();

        order.update_status(cmd.status, cmd.tracking_number, cmd.courier, self.clock.now())?;
        let order = self.store.save_order(order, expected).await?;

        metrics::counter!("order_status_updates_total", "status" => cmd.status.as_str()).increment(1);
        record_duration("update_status", started);
        tracing::info!(%from, to = %cmd.status, "order status updated");

        Ok(order)
    }

    /// Abandons stale pending orders using the clock and the configured
    /// threshold.
    pub async fn sweep_abandoned(&self) -> Result<Vec<Order>> {
        self.sweep_abandoned_at(self.clock.now(), self.settings.abandoned_after)
            .await
    }

    /// Marks every `pending` order created at or before `now - threshold` as
    /// `abandoned` and returns them.
    ///
    /// Orders that change concurrently (e.g. get paid mid-sweep) are skipped,
    /// so running it again only picks up new stale orders.
    #[tracing::instrument(skip(self))]
    pub async fn sweep_abandoned_at(
        &self,
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> Result<Vec<Order>> {
        let started = Instant::now();
        let cutoff = Some(threshold)
            .filter(|t| *t >= Duration::zero())
            .and_then(|t| now.checked_sub_signed(t))
            .ok_or(CheckoutError::InvalidThreshold(threshold))?;
        let stale = self.store.list_orders(OrderQuery::stale_pending(cutoff)).await?;

        let mut abandoned = Vec::with_capacity(stale.len());
        for mut order in stale {
            let expected = order.version();
            if order.abandon(now).is_err() {
                continue;
            }

            match self.store.save_order(order, expected).await {
                Ok(order) => abandoned.push(order),
                Err(StoreError::ConcurrencyConflict { order_id, .. }) => {
                    tracing::warn!(%order_id, "order changed during sweep, skipping");
                }
                Err(e) => return Err(e.into()),
            }
        }

        metrics::counter!("orders_abandoned_total").increment(abandoned.len() as u64);
        record_duration("sweep_abandoned", started);
        tracing::info!(%cutoff, count = abandoned.len(), "abandoned cart sweep finished");

        Ok(abandoned)
    }

    pub async fn get(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))
    }

    /// A user's orders, newest first.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.store.list_orders(OrderQuery::for_user(user_id)).await?)
    }

    /// Every order, newest first.
    pub async fn list_all(&self) -> Result<Vec<Order>> {
        Ok(self.store.list_orders(OrderQuery::new()).await?)
    }

    /// Orders in one status, newest first.
    pub async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        Ok(self.store.list_orders(OrderQuery::new().status(status)).await?)
    }
}

fn record_duration(operation: &'static str, started: Instant) {
    metrics::histogram!("order_lifecycle_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}
