// shopflow/src/workflows/contexts.rs

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::requests::{CheckoutRequest, PaymentStatusUpdate, VerifyPaymentRequest};
use crate::catalog::CatalogStore;
use crate::coupon::{Coupon, CouponStore};
use crate::notify::Notifier;
use crate::order::{Order, SettlementOutcome};
use crate::payment::{GatewayIntent, PaymentGateway};
use crate::pricing::PricedCart;
use crate::store::OrderStore;

/// Engine-level settings. The secret is never logged.
#[derive(Clone)]
pub struct EngineConfig {
  pub currency: String,
  pub payment_secret: String,
  pub gateway_timeout: Duration,
}

impl std::fmt::Debug for EngineConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("EngineConfig")
      .field("currency", &self.currency)
      .field("payment_secret", &"<redacted>")
      .field("gateway_timeout", &self.gateway_timeout)
      .finish()
  }
}

/// Collaborators every workflow context carries.
#[derive(Clone)]
pub struct Services {
  pub catalog: Arc<dyn CatalogStore>,
  pub coupons: Arc<dyn CouponStore>,
  pub orders: Arc<dyn OrderStore>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub notifier: Arc<dyn Notifier>,
  pub config: Arc<EngineConfig>,
}

#[derive(Clone)]
pub struct CheckoutCtx {
  pub services: Services,
  pub customer_id: Uuid,
  pub request: CheckoutRequest,
  pub now: DateTime<Utc>,

  pub order_id: Uuid,
  pub coupon: Option<Coupon>,
  pub priced: Option<PricedCart>,
  pub order_code: Option<String>,
  pub intent: Option<GatewayIntent>,
  pub order: Option<Order>,
}

impl CheckoutCtx {
  pub fn new(services: Services, customer_id: Uuid, request: CheckoutRequest) -> Self {
    Self {
      services,
      customer_id,
      request,
      now: Utc::now(),
      order_id: Uuid::new_v4(),
      coupon: None,
      priced: None,
      order_code: None,
      intent: None,
      order: None,
    }
  }
}

#[derive(Clone)]
pub struct VerifyPaymentCtx {
  pub services: Services,
  /// When set, the order must belong to this customer.
  pub customer_id: Option<Uuid>,
  pub request: VerifyPaymentRequest,
  pub outcome: Option<SettlementOutcome>,
}

#[derive(Clone)]
pub struct PaymentStatusCtx {
  pub services: Services,
  pub order_id: Uuid,
  pub update: PaymentStatusUpdate,
  pub outcome: Option<SettlementOutcome>,
}

impl VerifyPaymentCtx {
  pub(crate) fn newly_settled(&self) -> bool {
    self.outcome.as_ref().is_some_and(|o| o.newly_settled)
  }
}

impl PaymentStatusCtx {
  pub(crate) fn newly_settled(&self) -> bool {
    self.outcome.as_ref().is_some_and(|o| o.newly_settled)
  }
}
