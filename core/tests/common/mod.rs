// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shopflow::catalog::{CatalogStore, Product};
use shopflow::coupon::{Coupon, CouponStatus, CouponStore};
use shopflow::notify::Notifier;
use shopflow::order::Order;
use shopflow::payment::{GatewayIntent, GatewayPayment, IntentRequest, PaymentGateway};
use shopflow::store::MemoryStore;
use shopflow::workflows::{CheckoutItem, CheckoutRequest};
use shopflow::{CommerceError, ContextData, EngineConfig, OrderEngine, PipelineControl, PipelineError, Services};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use uuid::Uuid;

pub const SECRET: &str = "test_gateway_secret";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Pipeline engine fixtures ---

#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Pipeline error: {0}")]
  Pipeline(String),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<PipelineError> for TestError {
  fn from(e: PipelineError) -> Self {
    TestError::Pipeline(format!("{e:?}"))
  }
}

pub fn create_simple_handler(
  step_name: &'static str,
  message_to_append: &'static str,
) -> shopflow::pipeline::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name.to_string());
      if guard.should_stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn create_failing_handler(
  step_name: &'static str,
  error_message: &'static str,
) -> shopflow::pipeline::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Handler(error_message.to_string()))
    })
  })
}

// --- Commerce fixtures ---

/// Gateway with a fixed intent id and switchable failure modes.
pub struct StubGateway {
  pub intent_id: String,
  pub delay: Duration,
  pub fail: bool,
  pub calls: AtomicUsize,
  pub receipts: parking_lot::Mutex<Vec<String>>,
}

impl StubGateway {
  pub fn new(intent_id: &str) -> Self {
    Self {
      intent_id: intent_id.to_string(),
      delay: Duration::ZERO,
      fail: false,
      calls: AtomicUsize::new(0),
      receipts: parking_lot::Mutex::new(Vec::new()),
    }
  }
}

#[async_trait]
impl PaymentGateway for StubGateway {
  fn name(&self) -> &str {
    "stub"
  }

  async fn create_intent(&self, request: &IntentRequest) -> shopflow::Result<GatewayIntent> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.receipts.lock().push(request.receipt.clone());
    if !self.delay.is_zero() {
      tokio::time::sleep(self.delay).await;
    }
    if self.fail {
      return Err(CommerceError::ExternalService {
        service: "payment_gateway".into(),
        message: "stub failure".into(),
        retryable: false,
      });
    }
    Ok(GatewayIntent {
      id: self.intent_id.clone(),
      amount: request.amount,
      currency: request.currency.clone(),
      status: "created".into(),
    })
  }

  async fn fetch_payment(&self, payment_id: &str) -> shopflow::Result<GatewayPayment> {
    if !self.delay.is_zero() {
      tokio::time::sleep(self.delay).await;
    }
    if self.fail {
      return Err(CommerceError::not_found("Payment"));
    }
    Ok(GatewayPayment {
      id: payment_id.to_string(),
      order_id: Some(self.intent_id.clone()),
      amount: 19000,
      currency: "INR".into(),
      status: "captured".into(),
      method: Some("upi".into()),
    })
  }
}

#[derive(Default)]
pub struct RecordingNotifier {
  pub placed: AtomicUsize,
  pub confirmed: AtomicUsize,
  pub fail: bool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
  async fn order_placed(&self, _order: &Order) -> shopflow::Result<()> {
    self.placed.fetch_add(1, Ordering::SeqCst);
    if self.fail {
      return Err(CommerceError::ExternalService {
        service: "notifier".into(),
        message: "smtp down".into(),
        retryable: true,
      });
    }
    Ok(())
  }

  async fn payment_confirmed(&self, _order: &Order) -> shopflow::Result<()> {
    self.confirmed.fetch_add(1, Ordering::SeqCst);
    if self.fail {
      return Err(CommerceError::ExternalService {
        service: "notifier".into(),
        message: "smtp down".into(),
        retryable: true,
      });
    }
    Ok(())
  }
}

pub struct Harness {
  pub store: Arc<MemoryStore>,
  pub gateway: Arc<StubGateway>,
  pub notifier: Arc<RecordingNotifier>,
  pub engine: OrderEngine,
  pub customer_id: Uuid,
}

impl Harness {
  pub fn new() -> Self {
    Self::with(StubGateway::new("intent_1"), RecordingNotifier::default(), Duration::from_secs(2))
  }

  pub fn with(gateway: StubGateway, notifier: RecordingNotifier, gateway_timeout: Duration) -> Self {
    setup_tracing();
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(gateway);
    let notifier = Arc::new(notifier);
    let services = Services {
      catalog: store.clone(),
      coupons: store.clone(),
      orders: store.clone(),
      gateway: gateway.clone(),
      notifier: notifier.clone(),
      config: Arc::new(EngineConfig {
        currency: "INR".into(),
        payment_secret: SECRET.into(),
        gateway_timeout,
      }),
    };
    Self {
      store,
      gateway,
      notifier,
      engine: OrderEngine::new(services),
      customer_id: Uuid::new_v4(),
    }
  }

  pub async fn add_product(&self, price: Decimal, discount: Decimal, shipping: Decimal, stock: i64) -> Product {
    let product = Product {
      id: Uuid::new_v4(),
      sku: format!("SKU-{}", Uuid::new_v4().simple()),
      name: "Masala Chai".into(),
      website_price: price,
      discount_percentage: discount,
      shipping_charge: shipping,
      stock_qty: stock,
    };
    self.store.upsert_product(&product).await.unwrap();
    product
  }

  /// The reference product: 100, 10 % off, 20 shipping.
  pub async fn reference_product(&self, stock: i64) -> Product {
    self.add_product(dec!(100), dec!(10), dec!(20), stock).await
  }

  pub async fn add_coupon(&self, code: &str, percentage: Decimal) -> Coupon {
    let now = Utc::now();
    let coupon = Coupon {
      id: Uuid::new_v4(),
      code: code.to_string(),
      percentage,
      status: CouponStatus::Active,
      note: String::new(),
      expiry_date: Some(now + ChronoDuration::days(7)),
      no_expiry: false,
      usage_count: 0,
      order_ids: Vec::new(),
      created_at: now,
      updated_at: now,
    };
    self.store.insert_coupon(&coupon).await.unwrap();
    coupon
  }

  pub async fn stock_of(&self, product_id: Uuid) -> i64 {
    self.store.product(product_id).await.unwrap().unwrap().stock_qty
  }

  pub async fn coupon_state(&self, coupon_id: Uuid) -> Coupon {
    self.store.coupon(coupon_id).await.unwrap().unwrap()
  }
}

pub fn checkout_request(items: Vec<(Uuid, u32)>, coupon_id: Option<Uuid>) -> CheckoutRequest {
  let value = serde_json::json!({
    "customer_details": {"name": "Asha Rao", "email": "asha@example.com", "phone": "9800000000"},
    "items": [],
    "shipping_address": {
      "kind": "home",
      "address_line_1": "12 MG Road",
      "city": "Pune",
      "state": "Maharashtra",
      "pincode": "411001"
    },
    "coupon_id": coupon_id,
  });
  let mut request: CheckoutRequest = serde_json::from_value(value).unwrap();
  request.items = items
    .into_iter()
    .map(|(product_id, quantity)| CheckoutItem {
      product_id,
      quantity,
      variant: None,
    })
    .collect();
  request
}
