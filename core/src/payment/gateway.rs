// shopflow/src/payment/gateway.rs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{CommerceError, Result};

pub const GATEWAY_SERVICE: &str = "payment_gateway";

#[derive(Debug, Clone, Serialize)]
pub struct IntentRequest {
  /// Minor currency units (paise for INR).
  pub amount: i64,
  pub currency: String,
  pub receipt: String,
  pub metadata: Map<String, Value>,
}

/// Remote handle the client needs to complete payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayIntent {
  pub id: String,
  pub amount: i64,
  pub currency: String,
  pub status: String,
}

/// A payment as the gateway reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayPayment {
  pub id: String,
  #[serde(default)]
  pub order_id: Option<String>,
  pub amount: i64,
  pub currency: String,
  /// Gateway vocabulary, e.g. `created`, `authorized`, `captured`, `failed`.
  pub status: String,
  #[serde(default)]
  pub method: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  fn name(&self) -> &str;

  async fn create_intent(&self, request: &IntentRequest) -> Result<GatewayIntent>;

  /// Looks up a payment by the gateway's payment id. An unknown id is
  /// `CommerceError::NotFound`.
  async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment>;
}

async fn bounded<T>(call: impl std::future::Future<Output = Result<T>>, timeout: Duration, what: &str) -> Result<T> {
  match tokio::time::timeout(timeout, call).await {
    Ok(result) => result,
    Err(_) => {
      warn!(timeout_ms = timeout.as_millis() as u64, "Gateway {what} timed out.");
      Err(CommerceError::ExternalService {
        service: GATEWAY_SERVICE.to_string(),
        message: format!("{what} timed out after {}ms", timeout.as_millis()),
        retryable: true,
      })
    }
  }
}

/// Calls `gateway.create_intent` under `timeout`. A timeout is a retryable
/// external failure; it never counts as a created intent.
#[instrument(name = "gateway::create_intent", skip_all, fields(gateway = gateway.name(), receipt = %request.receipt, amount = request.amount))]
pub async fn create_intent_bounded(
  gateway: &dyn PaymentGateway,
  request: &IntentRequest,
  timeout: Duration,
) -> Result<GatewayIntent> {
  bounded(gateway.create_intent(request), timeout, "intent creation").await
}

#[instrument(name = "gateway::fetch_payment", skip(gateway, timeout), fields(gateway = gateway.name()))]
pub async fn fetch_payment_bounded(
  gateway: &dyn PaymentGateway,
  payment_id: &str,
  timeout: Duration,
) -> Result<GatewayPayment> {
  bounded(gateway.fetch_payment(payment_id), timeout, "payment lookup").await
}

const MOCK_PAYMENT_PREFIX: &str = "pay_";

/// In-process gateway used for development and tests.
#[derive(Debug, Clone)]
pub struct MockGateway {
  latency: Duration,
}

impl MockGateway {
  pub fn new(latency: Duration) -> Self {
    Self { latency }
  }
}

impl Default for MockGateway {
  fn default() -> Self {
    Self::new(Duration::from_millis(50))
  }
}

#[async_trait]
impl PaymentGateway for MockGateway {
  fn name(&self) -> &str {
    "mock"
  }

  async fn create_intent(&self, request: &IntentRequest) -> Result<GatewayIntent> {
    if request.amount <= 0 {
      return Err(CommerceError::ExternalService {
        service: GATEWAY_SERVICE.to_string(),
        message: "Amount must be greater than zero".to_string(),
        retryable: false,
      });
    }
    tokio::time::sleep(self.latency).await;
    let intent = GatewayIntent {
      id: format!("mock_order_{}", Uuid::new_v4().simple()),
      amount: request.amount,
      currency: request.currency.clone(),
      status: "created".to_string(),
    };
    info!(intent_id = %intent.id, "Mock gateway created intent.");
    Ok(intent)
  }

  /// Ids shaped like the gateway's (`pay_...`) report as captured; anything
  /// else is unknown.
  async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment> {
    tokio::time::sleep(self.latency).await;
    if !payment_id.starts_with(MOCK_PAYMENT_PREFIX) {
      return Err(CommerceError::NotFound("Payment not found".to_string()));
    }
    Ok(GatewayPayment {
      id: payment_id.to_string(),
      order_id: None,
      amount: 0,
      currency: "INR".to_string(),
      status: "captured".to_string(),
      method: Some("mock".to_string()),
    })
  }
}
