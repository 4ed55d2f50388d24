// shopflow/src/workflows/reconcile.rs

//! Payment reconciliation: the signed gateway callback and the manual
//! (admin) payment-status update. Both end in `OrderStore::settle_payment`,
//! which applies stock and coupon effects only on first settlement.

use chrono::Utc;
use tracing::{info, warn};

use super::contexts::{PaymentStatusCtx, VerifyPaymentCtx};
use crate::error::CommerceError;
use crate::order::{Order, PaymentStatus, Settlement, SettlementOutcome};
use crate::payment::signature;
use crate::pipeline::{skip_when, ContextData, Pipeline, PipelineControl};

pub const LOAD_ORDER: &str = "load_order";
pub const VERIFY_SIGNATURE: &str = "verify_signature";
pub const SETTLE_PAYMENT: &str = "settle_payment";
pub const APPLY_PAYMENT_STATUS: &str = "apply_payment_status";
pub const NOTIFY_PAYMENT_CONFIRMED: &str = "notify_payment_confirmed";

fn settled_order(outcome: Option<&SettlementOutcome>) -> Result<Order, CommerceError> {
  outcome
    .map(|o| o.order.clone())
    .ok_or_else(|| CommerceError::Internal("reconciliation state missing: settled order".to_string()))
}

pub fn verify_payment_pipeline() -> Pipeline<VerifyPaymentCtx, CommerceError> {
  let mut p = Pipeline::<VerifyPaymentCtx, CommerceError>::new(
    "verify_payment",
    &[
      (LOAD_ORDER, false, None),
      (VERIFY_SIGNATURE, false, None),
      (SETTLE_PAYMENT, false, None),
      (
        NOTIFY_PAYMENT_CONFIRMED,
        true,
        skip_when(|ctx: &VerifyPaymentCtx| !ctx.newly_settled()),
      ),
    ],
  );

  p.on_step(LOAD_ORDER, |ctx: ContextData<VerifyPaymentCtx>| async move {
    let (orders, order_id, customer_id, gateway_order_id) = {
      let guard = ctx.read();
      (
        guard.services.orders.clone(),
        guard.request.order_id,
        guard.customer_id,
        guard.request.gateway_order_id.clone(),
      )
    };
    let order = orders
      .order(order_id)
      .await?
      .filter(|o| customer_id.map_or(true, |c| o.customer_id == c))
      .ok_or_else(|| CommerceError::not_found("Order"))?;
    if order.gateway_order_id() != Some(gateway_order_id.as_str()) {
      warn!(%order_id, "Callback gateway order id does not match the order.");
      return Err(CommerceError::PaymentVerificationFailed);
    }
    Ok::<_, CommerceError>(PipelineControl::Continue)
  });

  p.on_step(VERIFY_SIGNATURE, |ctx: ContextData<VerifyPaymentCtx>| async move {
    let guard = ctx.read();
    let request = &guard.request;
    let valid = signature::verify(
      &guard.services.config.payment_secret,
      &request.gateway_order_id,
      &request.gateway_payment_id,
      &request.gateway_signature,
    )?;
    if !valid {
      warn!(order_id = %request.order_id, "Payment signature mismatch.");
      return Err(CommerceError::PaymentVerificationFailed);
    }
    Ok::<_, CommerceError>(PipelineControl::Continue)
  });

  p.on_step(SETTLE_PAYMENT, |ctx: ContextData<VerifyPaymentCtx>| async move {
    let (orders, request) = {
      let guard = ctx.read();
      (guard.services.orders.clone(), guard.request.clone())
    };
    let details = request.payment_details();
    // Re-checked under the store lock in case the order changed since loading.
    let mutation = |order: &mut Order| -> Result<Settlement, CommerceError> {
      if order.gateway_order_id() != Some(request.gateway_order_id.as_str()) {
        return Err(CommerceError::PaymentVerificationFailed);
      }
      order.apply_payment_status(PaymentStatus::Paid, Some(details.clone()), Utc::now())
    };
    let outcome = orders.settle_payment(request.order_id, &mutation).await?;
    info!(
      order_id = %request.order_id,
      newly_settled = outcome.newly_settled,
      "Gateway payment verified."
    );
    ctx.write().outcome = Some(outcome);
    Ok::<_, CommerceError>(PipelineControl::Continue)
  });

  p.on_step(NOTIFY_PAYMENT_CONFIRMED, |ctx: ContextData<VerifyPaymentCtx>| async move {
    let (notifier, order) = {
      let guard = ctx.read();
      (guard.services.notifier.clone(), settled_order(guard.outcome.as_ref())?)
    };
    notifier.payment_confirmed(&order).await?;
    Ok::<_, CommerceError>(PipelineControl::Continue)
  });

  p
}

pub fn payment_status_pipeline() -> Pipeline<PaymentStatusCtx, CommerceError> {
  let mut p = Pipeline::<PaymentStatusCtx, CommerceError>::new(
    "payment_status",
    &[
      (APPLY_PAYMENT_STATUS, false, None),
      (
        NOTIFY_PAYMENT_CONFIRMED,
        true,
        skip_when(|ctx: &PaymentStatusCtx| !ctx.newly_settled()),
      ),
    ],
  );

  p.on_step(APPLY_PAYMENT_STATUS, |ctx: ContextData<PaymentStatusCtx>| async move {
    let (orders, order_id, update) = {
      let guard = ctx.read();
      (guard.services.orders.clone(), guard.order_id, guard.update.clone())
    };
    let mutation = |order: &mut Order| -> Result<Settlement, CommerceError> {
      order.apply_payment_status(update.payment_status, update.payment_details.clone(), Utc::now())
    };
    let outcome = orders.settle_payment(order_id, &mutation).await?;
    info!(
      %order_id,
      payment_status = update.payment_status.as_str(),
      newly_settled = outcome.newly_settled,
      "Payment status updated."
    );
    ctx.write().outcome = Some(outcome);
    Ok::<_, CommerceError>(PipelineControl::Continue)
  });

  p.on_step(NOTIFY_PAYMENT_CONFIRMED, |ctx: ContextData<PaymentStatusCtx>| async move {
    let (notifier, order) = {
      let guard = ctx.read();
      (guard.services.notifier.clone(), settled_order(guard.outcome.as_ref())?)
    };
    notifier.payment_confirmed(&order).await?;
    Ok::<_, CommerceError>(PipelineControl::Continue)
  });

  p
}
