// shopflow/src/workflows/checkout.rs

//! Checkout: validate, price, number the order, open a gateway intent (online
//! payments only), persist, notify. Nothing is written before `persist_order`,
//! so any earlier failure leaves no order behind.

use serde_json::{json, Map};
use tracing::{info, warn};

use super::contexts::CheckoutCtx;
use crate::error::{CommerceError, Result};
use crate::money::to_minor_units;
use crate::order::{
  order_code, Order, Payment, PaymentDetails, PaymentMethod, PaymentStatus, Shipment, OrderStatus, receipt_ref,
};
use crate::payment::{create_intent_bounded, IntentRequest};
use crate::pipeline::{skip_when, ContextData, Pipeline, PipelineControl};
use crate::pricing::price_cart;

pub const VALIDATE_REQUEST: &str = "validate_request";
pub const PRICE_CART: &str = "price_cart";
pub const ASSIGN_ORDER_CODE: &str = "assign_order_code";
pub const CREATE_GATEWAY_INTENT: &str = "create_gateway_intent";
pub const PERSIST_ORDER: &str = "persist_order";
pub const NOTIFY_ORDER_PLACED: &str = "notify_order_placed";

fn missing(what: &str) -> CommerceError {
  CommerceError::Internal(format!("checkout state missing: {what}"))
}

pub fn checkout_pipeline() -> Pipeline<CheckoutCtx, CommerceError> {
  let mut p = Pipeline::<CheckoutCtx, CommerceError>::new(
    "checkout",
    &[
      (VALIDATE_REQUEST, false, None),
      (PRICE_CART, false, None),
      (ASSIGN_ORDER_CODE, false, None),
      (
        CREATE_GATEWAY_INTENT,
        false,
        skip_when(|ctx: &CheckoutCtx| ctx.request.payment_method() == PaymentMethod::Cod),
      ),
      (PERSIST_ORDER, false, None),
      (NOTIFY_ORDER_PLACED, true, None),
    ],
  );

  p.on_step(VALIDATE_REQUEST, |ctx: ContextData<CheckoutCtx>| async move {
    let (coupons, coupon_id, now) = {
      let guard = ctx.read();
      guard.request.validate()?;
      (guard.services.coupons.clone(), guard.request.coupon_id, guard.now)
    };

    // An unusable coupon is dropped, not fatal; the order is priced without it.
    if let Some(coupon_id) = coupon_id {
      match coupons.coupon(coupon_id).await? {
        Some(coupon) => match coupon.check(now) {
          Ok(()) => {
            ctx.write().coupon = Some(coupon);
          }
          Err(rejection) => warn!(%coupon_id, reason = rejection.reason(), "Ignoring unusable coupon at checkout."),
        },
        None => warn!(%coupon_id, "Ignoring unknown coupon at checkout."),
      }
    }
    Ok::<_, CommerceError>(PipelineControl::Continue)
  });

  p.on_step(PRICE_CART, |ctx: ContextData<CheckoutCtx>| async move {
    let (catalog, lines, percentage) = {
      let guard = ctx.read();
      (
        guard.services.catalog.clone(),
        guard.request.cart_lines(),
        guard.coupon.as_ref().map(|c| c.percentage),
      )
    };
    let priced = price_cart(catalog.as_ref(), &lines, percentage).await?;
    ctx.write().priced = Some(priced);
    Ok::<_, CommerceError>(PipelineControl::Continue)
  });

  p.on_step(ASSIGN_ORDER_CODE, |ctx: ContextData<CheckoutCtx>| async move {
    let orders = ctx.read().services.orders.clone();
    let number = orders.next_order_number().await?;
    let code = order_code(number);
    info!(order_code = %code, "Assigned order code.");
    ctx.write().order_code = Some(code);
    Ok::<_, CommerceError>(PipelineControl::Continue)
  });

  p.on_step(CREATE_GATEWAY_INTENT, |ctx: ContextData<CheckoutCtx>| async move {
    let (gateway, timeout, request) = {
      let guard = ctx.read();
      let total = guard.priced.as_ref().ok_or_else(|| missing("priced cart"))?.totals.total_amount;
      let code = guard.order_code.as_ref().ok_or_else(|| missing("order code"))?;
      let mut metadata = Map::new();
      metadata.insert("order_id".into(), json!(guard.order_id));
      metadata.insert("email".into(), json!(guard.request.customer_details.email));
      metadata.insert("name".into(), json!(guard.request.customer_details.name));
      (
        guard.services.gateway.clone(),
        guard.services.config.gateway_timeout,
        IntentRequest {
          amount: to_minor_units(total)?,
          currency: guard.services.config.currency.clone(),
          receipt: receipt_ref(code),
          metadata,
        },
      )
    };
    let intent = create_intent_bounded(gateway.as_ref(), &request, timeout).await?;
    ctx.write().intent = Some(intent);
    Ok::<_, CommerceError>(PipelineControl::Continue)
  });

  p.on_step(PERSIST_ORDER, |ctx: ContextData<CheckoutCtx>| async move {
    let (orders, order) = {
      let guard = ctx.read();
      (guard.services.orders.clone(), build_order(&guard)?)
    };
    orders.insert_order(&order).await?;
    info!(order_id = %order.id, order_code = %order.order_code, total = %order.payment.total_amount, "Order placed.");
    ctx.write().order = Some(order);
    Ok::<_, CommerceError>(PipelineControl::Continue)
  });

  p.on_step(NOTIFY_ORDER_PLACED, |ctx: ContextData<CheckoutCtx>| async move {
    let (notifier, order) = {
      let guard = ctx.read();
      (guard.services.notifier.clone(), guard.order.clone().ok_or_else(|| missing("order"))?)
    };
    notifier.order_placed(&order).await?;
    Ok::<_, CommerceError>(PipelineControl::Continue)
  });

  p
}

fn build_order(ctx: &CheckoutCtx) -> Result<Order> {
  let priced = ctx.priced.as_ref().ok_or_else(|| missing("priced cart"))?;
  let code = ctx.order_code.clone().ok_or_else(|| missing("order code"))?;
  let method = ctx.request.payment_method();

  let mut details = PaymentDetails::default();
  if let Some(intent) = &ctx.intent {
    details.gateway_order_id = Some(intent.id.clone());
    details.metadata.insert("intent_status".into(), json!(intent.status));
  }

  let totals = &priced.totals;
  Ok(Order {
    id: ctx.order_id,
    order_code: code,
    customer_id: ctx.customer_id,
    customer_details: ctx.request.customer_details.clone(),
    items: priced.items.clone(),
    shipping_address: ctx.request.shipping_address.clone(),
    payment: Payment {
      product_total: totals.product_total,
      shipping_charge: totals.shipping_charge,
      discount_amount: totals.discount_amount,
      coupon_discount_amount: totals.coupon_discount_amount,
      total_amount: totals.total_amount,
      payment_method: method,
      payment_status: PaymentStatus::Pending,
      payment_details: details,
      settled_at: None,
    },
    shipment: Shipment::default(),
    order_status: OrderStatus::Pending,
    coupon_id: ctx.coupon.as_ref().map(|c| c.id),
    notes: ctx.request.notes.clone().filter(|n| !n.trim().is_empty()),
    version: 1,
    created_at: ctx.now,
    updated_at: ctx.now,
  })
}
