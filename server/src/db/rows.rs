// shopflow_server/src/db/rows.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shopflow::catalog::Product;
use shopflow::coupon::{Coupon, CouponStatus};
use shopflow::order::Order;
use shopflow::CommerceError;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

pub(super) const PRODUCT_COLUMNS: &str =
  "id, sku, name, website_price, discount_percentage, shipping_charge, stock_qty";

pub(super) const COUPON_COLUMNS: &str =
  "id, code, percentage, status, note, expiry_date, no_expiry, usage_count, order_ids, created_at, updated_at";

#[derive(Debug, FromRow)]
pub(super) struct ProductRow {
  pub id: Uuid,
  pub sku: String,
  pub name: String,
  pub website_price: Decimal,
  pub discount_percentage: Decimal,
  pub shipping_charge: Decimal,
  pub stock_qty: i64,
}

impl From<ProductRow> for Product {
  fn from(row: ProductRow) -> Self {
    Product {
      id: row.id,
      sku: row.sku,
      name: row.name,
      website_price: row.website_price,
      discount_percentage: row.discount_percentage,
      shipping_charge: row.shipping_charge,
      stock_qty: row.stock_qty,
    }
  }
}

#[derive(Debug, FromRow)]
pub(super) struct CouponRow {
  pub id: Uuid,
  pub code: String,
  pub percentage: Decimal,
  pub status: String,
  pub note: String,
  pub expiry_date: Option<DateTime<Utc>>,
  pub no_expiry: bool,
  pub usage_count: i32,
  pub order_ids: Vec<Uuid>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl TryFrom<CouponRow> for Coupon {
  type Error = CommerceError;

  fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
    let status = CouponStatus::parse(&row.status)
      .ok_or_else(|| CommerceError::Internal(format!("unknown coupon status '{}' for {}", row.status, row.id)))?;
    Ok(Coupon {
      id: row.id,
      code: row.code,
      percentage: row.percentage,
      status,
      note: row.note,
      expiry_date: row.expiry_date,
      no_expiry: row.no_expiry,
      usage_count: u32::try_from(row.usage_count).unwrap_or(0),
      order_ids: row.order_ids,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

#[derive(Debug, FromRow)]
pub(super) struct OrderRow {
  pub document: Json<Order>,
  pub version: i64,
}

impl From<OrderRow> for Order {
  /// The column is authoritative for the version.
  fn from(row: OrderRow) -> Self {
    let mut order = row.document.0;
    order.version = row.version;
    order
  }
}
