// shopflow/src/catalog.rs

//! Read-only view of the product catalog consumed by pricing.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: Uuid,
  pub sku: String,
  pub name: String,
  /// Current selling price per unit.
  pub website_price: Decimal,
  /// Per-item discount, 0..=100.
  pub discount_percentage: Decimal,
  /// Flat charge added once per order line that contains this product.
  pub shipping_charge: Decimal,
  pub stock_qty: i64,
}

impl Product {
  /// Takes `quantity` units out of stock, flooring at zero. Returns `true` when
  /// the floor was hit.
  pub fn decrement_stock(&mut self, quantity: u32) -> bool {
    let remaining = self.stock_qty - i64::from(quantity);
    self.stock_qty = remaining.max(0);
    remaining < 0
  }
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
  async fn product(&self, id: Uuid) -> Result<Option<Product>>;

  /// Inserts or replaces a product. Used for seeding; catalog administration
  /// lives outside this crate.
  async fn upsert_product(&self, product: &Product) -> Result<()>;
}
