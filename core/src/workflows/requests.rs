// shopflow/src/workflows/requests.rs

//! Typed request payloads accepted by the workflows. Totals are never part of
//! a request; unknown fields such as client-side totals are ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{CommerceError, Result};
use crate::order::{CustomerDetails, Order, PaymentDetails, PaymentMethod, PaymentStatus, ShippingAddress, Variant};
use crate::payment::GatewayIntent;
use crate::pricing::{CartLine, MAX_LINE_QUANTITY};

fn one() -> u32 {
  1
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutItem {
  pub product_id: Uuid,
  #[serde(default = "one")]
  pub quantity: u32,
  #[serde(default)]
  pub variant: Option<Variant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
  pub customer_details: CustomerDetails,
  pub items: Vec<CheckoutItem>,
  pub shipping_address: ShippingAddress,
  #[serde(default)]
  pub coupon_id: Option<Uuid>,
  #[serde(default)]
  pub notes: Option<String>,
  #[serde(default)]
  pub payment_method: Option<PaymentMethod>,
}

impl CheckoutRequest {
  pub fn payment_method(&self) -> PaymentMethod {
    self.payment_method.unwrap_or(PaymentMethod::Online)
  }

  pub fn cart_lines(&self) -> Vec<CartLine> {
    self
      .items
      .iter()
      .map(|item| CartLine {
        product_id: item.product_id,
        quantity: item.quantity,
        variant: item.variant.clone(),
      })
      .collect()
  }

  /// Reports every problem at once.
  pub fn validate(&self) -> Result<()> {
    let mut problems = Vec::new();
    if self.items.is_empty() {
      problems.push("items must not be empty".to_string());
    }
    for item in &self.items {
      if item.quantity == 0 || item.quantity > MAX_LINE_QUANTITY {
        problems.push(format!(
          "quantity for product {} must be between 1 and {MAX_LINE_QUANTITY}",
          item.product_id
        ));
      }
    }
    if self.customer_details.name.trim().is_empty() {
      problems.push("customer_details.name is required".to_string());
    }
    if !self.customer_details.email.contains('@') {
      problems.push("customer_details.email is invalid".to_string());
    }
    let address = &self.shipping_address;
    for (field, value) in [
      ("address_line_1", &address.address_line_1),
      ("city", &address.city),
      ("state", &address.state),
      ("pincode", &address.pincode),
    ] {
      if value.trim().is_empty() {
        problems.push(format!("shipping_address.{field} is required"));
      }
    }
    if self.payment_method == Some(PaymentMethod::Pending) {
      problems.push("payment_method must be COD or Online".to_string());
    }
    if problems.is_empty() {
      Ok(())
    } else {
      Err(CommerceError::Validation(format!("Validation error: {}", problems.join(" | "))))
    }
  }
}

/// Result of a successful checkout. `gateway_intent` is absent for COD.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
  pub order: Order,
  pub gateway_intent: Option<GatewayIntent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentRequest {
  pub order_id: Uuid,
  pub gateway_order_id: String,
  pub gateway_payment_id: String,
  pub gateway_signature: String,
  #[serde(default)]
  pub metadata: Map<String, Value>,
}

impl VerifyPaymentRequest {
  pub(crate) fn payment_details(&self) -> PaymentDetails {
    PaymentDetails {
      gateway_order_id: Some(self.gateway_order_id.clone()),
      gateway_payment_id: Some(self.gateway_payment_id.clone()),
      gateway_signature: Some(self.gateway_signature.clone()),
      metadata: self.metadata.clone(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentStatusUpdate {
  pub payment_status: PaymentStatus,
  #[serde(default)]
  pub payment_details: Option<PaymentDetails>,
}
