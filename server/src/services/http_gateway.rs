// shopflow_server/src/services/http_gateway.rs

//! Payment gateway reached over HTTP. Intents are created with
//! `POST {base_url}/orders` and payments read with
//! `GET {base_url}/payments/{id}`, both using basic auth with the key id and
//! secret.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shopflow::payment::gateway::GATEWAY_SERVICE;
use shopflow::payment::{GatewayIntent, GatewayPayment, IntentRequest, PaymentGateway};
use shopflow::{CommerceError, Result};
use std::time::Duration;
use tracing::{info, instrument, warn};

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
  amount: i64,
  currency: &'a str,
  receipt: &'a str,
  notes: &'a Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
  id: String,
  amount: i64,
  currency: String,
  #[serde(default = "created")]
  status: String,
}

fn created() -> String {
  "created".to_string()
}

#[derive(Clone)]
pub struct HttpGateway {
  base_url: String,
  key_id: String,
  key_secret: String,
  http_client: Client,
}

impl std::fmt::Debug for HttpGateway {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("HttpGateway")
      .field("base_url", &self.base_url)
      .field("key_id", &self.key_id)
      .finish_non_exhaustive()
  }
}

impl HttpGateway {
  /// `timeout` bounds each request at the transport level; the engine applies
  /// its own bound on top.
  pub fn new(base_url: impl Into<String>, key_id: impl Into<String>, key_secret: impl Into<String>, timeout: Duration) -> Result<Self> {
    let http_client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| CommerceError::Internal(format!("failed to build HTTP client: {e}")))?;
    Ok(Self {
      base_url: base_url.into().trim_end_matches('/').to_string(),
      key_id: key_id.into(),
      key_secret: key_secret.into(),
      http_client,
    })
  }

  /// Sends an authenticated request. Transport failures and non-2xx answers
  /// become gateway errors; a 404 is handed back to the caller as `None`.
  async fn send(&self, request: RequestBuilder, what: &str) -> Result<Option<Response>> {
    let response = request
      .basic_auth(&self.key_id, Some(&self.key_secret))
      .send()
      .await
      .map_err(|e| {
        warn!(error = %e, "Gateway request failed.");
        gateway_error(format!("request failed: {e}"), e.is_timeout() || e.is_connect())
      })?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !status.is_success() {
      let detail = response.text().await.unwrap_or_default();
      warn!(%status, %detail, "Gateway rejected {what}.");
      return Err(gateway_error(
        format!("gateway responded with {status}"),
        is_retryable_status(status),
      ));
    }
    Ok(Some(response))
  }
}

fn gateway_error(message: String, retryable: bool) -> CommerceError {
  CommerceError::ExternalService {
    service: GATEWAY_SERVICE.to_string(),
    message,
    retryable,
  }
}

/// Transport failures and 5xx/429 responses may succeed on retry; other
/// rejections will not.
fn is_retryable_status(status: StatusCode) -> bool {
  status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[async_trait]
impl PaymentGateway for HttpGateway {
  fn name(&self) -> &str {
    "http"
  }

  #[instrument(name = "http_gateway::create_intent", skip_all, fields(receipt = %request.receipt))]
  async fn create_intent(&self, request: &IntentRequest) -> Result<GatewayIntent> {
    let body = CreateOrderBody {
      amount: request.amount,
      currency: &request.currency,
      receipt: &request.receipt,
      notes: &request.metadata,
    };

    let response = self
      .send(self.http_client.post(format!("{}/orders", self.base_url)).json(&body), "intent creation")
      .await?
      .ok_or_else(|| gateway_error("intent endpoint not found".to_string(), false))?;

    let created = response
      .json::<CreateOrderResponse>()
      .await
      .map_err(|e| gateway_error(format!("unreadable gateway response: {e}"), false))?;
    info!(intent_id = %created.id, "Gateway created intent.");
    Ok(GatewayIntent {
      id: created.id,
      amount: created.amount,
      currency: created.currency,
      status: created.status,
    })
  }

  #[instrument(name = "http_gateway::fetch_payment", skip(self))]
  async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment> {
    let url = format!("{}/payments/{}", self.base_url, payment_id);
    let Some(response) = self.send(self.http_client.get(url), "payment lookup").await? else {
      return Err(CommerceError::not_found("Payment"));
    };
    response
      .json::<GatewayPayment>()
      .await
      .map_err(|e| gateway_error(format!("unreadable gateway response: {e}"), false))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn retryable_statuses() {
    assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
    assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
    assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
    assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
  }

  #[test]
  fn base_url_loses_trailing_slash() {
    let gw = HttpGateway::new("https://pay.example.test/v1/", "key", "secret", Duration::from_secs(1)).unwrap();
    assert_eq!(gw.base_url, "https://pay.example.test/v1");
    assert!(!format!("{gw:?}").contains("secret"));
  }

  #[tokio::test]
  async fn unreachable_gateway_is_retryable() {
    // Port 9 (discard) is closed on loopback.
    let gw = HttpGateway::new("http://127.0.0.1:9", "key", "secret", Duration::from_millis(500)).unwrap();
    let request = IntentRequest {
      amount: 100,
      currency: "INR".into(),
      receipt: "RCPT-ORD-10001".into(),
      metadata: Map::new(),
    };
    match gw.create_intent(&request).await {
      Err(CommerceError::ExternalService { retryable, .. }) => assert!(retryable),
      other => panic!("expected external service error, got {other:?}"),
    }
    match gw.fetch_payment("pay_1").await {
      Err(CommerceError::ExternalService { retryable, .. }) => assert!(retryable),
      other => panic!("expected external service error, got {other:?}"),
    }
  }
}
