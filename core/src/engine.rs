// shopflow/src/engine.rs

//! `OrderEngine`: the entry point the HTTP layer talks to. Multi-step
//! operations dispatch through the pipeline registry; single-record admin
//! edits go straight to the stores.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::coupon::{validate_coupon, Coupon, CouponDraft, CouponPatch, CouponQuote};
use crate::error::{CommerceError, Result};
use crate::order::{Order, OrderFilter, OrderPage, OrderStatus, PageRequest, ShipmentUpdate};
use crate::payment::{fetch_payment_bounded, GatewayPayment};
use crate::pipeline::{ContextData, PipelineOutcome};
use crate::registry::Registry;
use crate::workflows::{
  checkout_pipeline, payment_status_pipeline, verify_payment_pipeline, CheckoutCtx, CheckoutRequest, PaymentStatusCtx,
  PaymentStatusUpdate, PlacedOrder, Services, VerifyPaymentCtx, VerifyPaymentRequest,
};

/// A coupon together with how many orders consumed it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponView {
  #[serde(flatten)]
  pub coupon: Coupon,
  pub total_orders: usize,
}

impl From<Coupon> for CouponView {
  fn from(coupon: Coupon) -> Self {
    let total_orders = coupon.total_orders();
    Self { coupon, total_orders }
  }
}

pub struct OrderEngine {
  services: Services,
  registry: Registry<CommerceError>,
}

fn ensure_completed(outcome: PipelineOutcome, workflow: &str) -> Result<()> {
  match outcome {
    PipelineOutcome::Completed => Ok(()),
    PipelineOutcome::Stopped => Err(CommerceError::Internal(format!("{workflow} workflow stopped early"))),
  }
}

impl OrderEngine {
  pub fn new(services: Services) -> Self {
    let registry = Registry::<CommerceError>::new();
    registry.register_pipeline(checkout_pipeline());
    registry.register_pipeline(verify_payment_pipeline());
    registry.register_pipeline(payment_status_pipeline());
    Self { services, registry }
  }

  #[instrument(skip(self, request), fields(items = request.items.len()))]
  pub async fn place_order(&self, customer_id: Uuid, request: CheckoutRequest) -> Result<PlacedOrder> {
    let ctx = ContextData::new(CheckoutCtx::new(self.services.clone(), customer_id, request));
    let outcome = self.registry.run(ctx.clone()).await?;
    ensure_completed(outcome, "checkout")?;
    let guard = ctx.read();
    let order = guard
      .order
      .clone()
      .ok_or_else(|| CommerceError::Internal("checkout finished without an order".to_string()))?;
    Ok(PlacedOrder {
      order,
      gateway_intent: guard.intent.clone(),
    })
  }

  /// Gateway callback. `customer_id` restricts the lookup to that customer's
  /// orders when present.
  #[instrument(skip(self, request), fields(order_id = %request.order_id))]
  pub async fn verify_payment(&self, customer_id: Option<Uuid>, request: VerifyPaymentRequest) -> Result<Order> {
    let ctx = ContextData::new(VerifyPaymentCtx {
      services: self.services.clone(),
      customer_id,
      request,
      outcome: None,
    });
    let outcome = self.registry.run(ctx.clone()).await?;
    ensure_completed(outcome, "verify_payment")?;
    let guard = ctx.read();
    guard
      .outcome
      .as_ref()
      .map(|o| o.order.clone())
      .ok_or_else(|| CommerceError::Internal("verification finished without an order".to_string()))
  }

  #[instrument(skip(self, update), fields(payment_status = update.payment_status.as_str()))]
  pub async fn update_payment_status(&self, order_id: Uuid, update: PaymentStatusUpdate) -> Result<Order> {
    let ctx = ContextData::new(PaymentStatusCtx {
      services: self.services.clone(),
      order_id,
      update,
      outcome: None,
    });
    let outcome = self.registry.run(ctx.clone()).await?;
    ensure_completed(outcome, "payment_status")?;
    let guard = ctx.read();
    guard
      .outcome
      .as_ref()
      .map(|o| o.order.clone())
      .ok_or_else(|| CommerceError::Internal("payment update finished without an order".to_string()))
  }

  /// Asks the gateway for the current state of a payment.
  #[instrument(skip(self))]
  pub async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment> {
    let payment_id = payment_id.trim();
    if payment_id.is_empty() {
      return Err(CommerceError::Validation("Payment ID is required".to_string()));
    }
    fetch_payment_bounded(
      self.services.gateway.as_ref(),
      payment_id,
      self.services.config.gateway_timeout,
    )
    .await
  }

  #[instrument(skip(self))]
  pub async fn update_order_status(&self, order_id: Uuid, target: OrderStatus) -> Result<Order> {
    let mut order = self.order(order_id).await?;
    let from = order.order_status;
    order.transition_to(target, Utc::now())?;
    let saved = self.services.orders.save_order(&order).await?;
    info!(order_code = %saved.order_code, %from, to = %target, "Order status changed.");
    Ok(saved)
  }

  #[instrument(skip(self, update), fields(carrier = %update.carrier))]
  pub async fn update_shipment(&self, order_id: Uuid, update: ShipmentUpdate) -> Result<Order> {
    let mut order = self.order(order_id).await?;
    order.record_shipment(update, Utc::now())?;
    let saved = self.services.orders.save_order(&order).await?;
    info!(order_code = %saved.order_code, "Shipment recorded.");
    Ok(saved)
  }

  pub async fn order(&self, order_id: Uuid) -> Result<Order> {
    self
      .services
      .orders
      .order(order_id)
      .await?
      .ok_or_else(|| CommerceError::not_found("Order"))
  }

  /// Another customer's order is reported as missing.
  pub async fn customer_order(&self, customer_id: Uuid, order_id: Uuid) -> Result<Order> {
    let order = self.order(order_id).await?;
    if order.customer_id != customer_id {
      return Err(CommerceError::not_found("Order"));
    }
    Ok(order)
  }

  pub async fn list_orders(&self, filter: &OrderFilter, page: PageRequest) -> Result<OrderPage> {
    self.services.orders.list_orders(filter, page).await
  }

  pub async fn customer_orders(&self, customer_id: Uuid, page: PageRequest) -> Result<OrderPage> {
    self
      .services
      .orders
      .list_orders(&OrderFilter::for_customer(customer_id), page)
      .await
  }

  pub async fn validate_coupon(&self, code: &str) -> Result<CouponQuote> {
    validate_coupon(self.services.coupons.as_ref(), code, Utc::now()).await
  }

  #[instrument(skip(self, draft), fields(code = %draft.code))]
  pub async fn create_coupon(&self, draft: CouponDraft) -> Result<Coupon> {
    let coupon = draft.into_coupon(Utc::now())?;
    self.services.coupons.insert_coupon(&coupon).await?;
    info!(coupon_id = %coupon.id, code = %coupon.code, "Coupon created.");
    Ok(coupon)
  }

  #[instrument(skip(self, patch))]
  pub async fn update_coupon(&self, coupon_id: Uuid, patch: CouponPatch) -> Result<Coupon> {
    let mut coupon = self.coupon_record(coupon_id).await?;
    patch.apply(&mut coupon, Utc::now())?;
    self.services.coupons.update_coupon(&coupon).await?;
    // Re-read so usage fields reflect settlements that raced this edit.
    self.coupon_record(coupon_id).await
  }

  pub async fn delete_coupon(&self, coupon_id: Uuid) -> Result<()> {
    if !self.services.coupons.delete_coupon(coupon_id).await? {
      return Err(CommerceError::not_found("Coupon"));
    }
    info!(%coupon_id, "Coupon deleted.");
    Ok(())
  }

  pub async fn coupon(&self, coupon_id: Uuid) -> Result<CouponView> {
    self.coupon_record(coupon_id).await.map(CouponView::from)
  }

  pub async fn list_coupons(&self) -> Result<Vec<CouponView>> {
    Ok(
      self
        .services
        .coupons
        .list_coupons()
        .await?
        .into_iter()
        .map(CouponView::from)
        .collect(),
    )
  }

  async fn coupon_record(&self, coupon_id: Uuid) -> Result<Coupon> {
    self
      .services
      .coupons
      .coupon(coupon_id)
      .await?
      .ok_or_else(|| CommerceError::not_found("Coupon"))
  }
}
