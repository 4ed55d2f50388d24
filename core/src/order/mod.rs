// shopflow/src/order/mod.rs

//! The order aggregate: line snapshots, the payment and shipment sub-records,
//! and the top-level lifecycle status.

pub mod query;
pub mod settlement;
pub mod status;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub use query::{OrderFilter, OrderPage, PageRequest};
pub use settlement::{Settlement, SettlementOutcome, StockDecrement};
pub use status::ShipmentUpdate;

pub const ORDER_CODE_PREFIX: &str = "ORD-";
pub const RECEIPT_PREFIX: &str = "RCPT-";
/// Value of the order counter before the first order; the first code is
/// `ORD-10001`.
pub const ORDER_SEQUENCE_START: u64 = 10000;

pub fn order_code(number: u64) -> String {
  format!("{ORDER_CODE_PREFIX}{number}")
}

/// Gateway receipt for an order code. The intent is opened before the
/// order exists, so this works from the code alone.
pub fn receipt_ref(order_code: &str) -> String {
  format!("{RECEIPT_PREFIX}{order_code}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
  pub name: String,
  pub email: String,
  #[serde(default)]
  pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
  Home,
  Work,
  Other,
}

fn default_country() -> String {
  "India".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
  pub kind: AddressKind,
  pub address_line_1: String,
  #[serde(default)]
  pub address_line_2: Option<String>,
  pub city: String,
  pub state: String,
  #[serde(default = "default_country")]
  pub country: String,
  pub pincode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
  #[serde(default)]
  pub package_weight: Option<String>,
  #[serde(default)]
  pub number_of_pieces: Option<u32>,
}

/// Frozen copy of the catalog entry at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
  pub product_id: Uuid,
  pub sku: String,
  pub name: String,
  pub variant: Option<Variant>,
  pub unit_price: Decimal,
  pub discount_percentage: Decimal,
  pub line_total: Decimal,
  pub quantity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
  #[serde(rename = "COD")]
  Cod,
  Online,
  Pending,
}

impl PaymentMethod {
  pub fn as_str(self) -> &'static str {
    match self {
      PaymentMethod::Cod => "COD",
      PaymentMethod::Online => "Online",
      PaymentMethod::Pending => "Pending",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
  Pending,
  Paid,
  Canceled,
  Authorized,
  Failed,
}

impl PaymentStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      PaymentStatus::Pending => "Pending",
      PaymentStatus::Paid => "Paid",
      PaymentStatus::Canceled => "Canceled",
      PaymentStatus::Authorized => "Authorized",
      PaymentStatus::Failed => "Failed",
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
  pub gateway_order_id: Option<String>,
  pub gateway_payment_id: Option<String>,
  pub gateway_signature: Option<String>,
  /// Free-form gateway payload, merged key by key on every update.
  #[serde(default)]
  pub metadata: Map<String, Value>,
}

impl PaymentDetails {
  /// Overlays the fields present in `update`.
  pub fn merge(&mut self, update: PaymentDetails) {
    if update.gateway_order_id.is_some() {
      self.gateway_order_id = update.gateway_order_id;
    }
    if update.gateway_payment_id.is_some() {
      self.gateway_payment_id = update.gateway_payment_id;
    }
    if update.gateway_signature.is_some() {
      self.gateway_signature = update.gateway_signature;
    }
    self.metadata.extend(update.metadata);
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
  pub product_total: Decimal,
  pub shipping_charge: Decimal,
  pub discount_amount: Decimal,
  pub coupon_discount_amount: Decimal,
  pub total_amount: Decimal,
  pub payment_method: PaymentMethod,
  pub payment_status: PaymentStatus,
  pub payment_details: PaymentDetails,
  /// Set on the first transition to `Paid`; the marker that stock and coupon
  /// effects have already been applied for this order.
  #[serde(default)]
  pub settled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipmentStatus {
  Pending,
  Shipped,
  Delivered,
  Cancelled,
}

impl ShipmentStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      ShipmentStatus::Pending => "pending",
      ShipmentStatus::Shipped => "shipped",
      ShipmentStatus::Delivered => "delivered",
      ShipmentStatus::Cancelled => "cancelled",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
  pub tracking_id: Option<String>,
  pub carrier: Option<String>,
  pub tracking_url: Option<String>,
  pub status: ShipmentStatus,
  pub confirmed: bool,
  pub shipped_at: Option<DateTime<Utc>>,
}

impl Default for Shipment {
  fn default() -> Self {
    Self {
      tracking_id: None,
      carrier: None,
      tracking_url: None,
      status: ShipmentStatus::Pending,
      confirmed: false,
      shipped_at: None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Processing,
  Accept,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Processing => "processing",
      OrderStatus::Accept => "accept",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
    }
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
  }
}

impl std::fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  pub id: Uuid,
  pub order_code: String,
  pub customer_id: Uuid,
  pub customer_details: CustomerDetails,
  pub items: Vec<OrderItem>,
  pub shipping_address: ShippingAddress,
  pub payment: Payment,
  pub shipment: Shipment,
  pub order_status: OrderStatus,
  pub coupon_id: Option<Uuid>,
  pub notes: Option<String>,
  /// Bumped by the store on every write; used for optimistic concurrency.
  pub version: i64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  pub fn receipt_ref(&self) -> String {
    receipt_ref(&self.order_code)
  }

  pub fn gateway_order_id(&self) -> Option<&str> {
    self.payment.payment_details.gateway_order_id.as_deref()
  }
}
