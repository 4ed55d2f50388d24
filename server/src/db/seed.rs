// shopflow_server/src/db/seed.rs

//! Demo catalog and a welcome coupon, loaded when `SEED_DB=true`.

use chrono::Utc;
use rust_decimal::Decimal;
use shopflow::catalog::{CatalogStore, Product};
use shopflow::coupon::{CouponDraft, CouponStatus, CouponStore};
use shopflow::{CommerceError, Result};
use tracing::info;
use uuid::Uuid;

pub const WELCOME_COUPON: &str = "WELCOME10";

/// Fixed ids so repeated seeding upserts rather than duplicates.
pub fn demo_products() -> Vec<Product> {
  vec![
    Product {
      id: Uuid::from_u128(0x5e3d_0000_0000_0000_0000_0000_0000_0001),
      sku: "TEA-ASSAM-250".to_string(),
      name: "Assam Breakfast Tea 250g".to_string(),
      website_price: Decimal::new(100, 0),
      discount_percentage: Decimal::new(10, 0),
      shipping_charge: Decimal::new(20, 0),
      stock_qty: 250,
    },
    Product {
      id: Uuid::from_u128(0x5e3d_0000_0000_0000_0000_0000_0000_0002),
      sku: "TEA-DARJ-100".to_string(),
      name: "Darjeeling First Flush 100g".to_string(),
      website_price: Decimal::new(45000, 2),
      discount_percentage: Decimal::ZERO,
      shipping_charge: Decimal::new(40, 0),
      stock_qty: 80,
    },
    Product {
      id: Uuid::from_u128(0x5e3d_0000_0000_0000_0000_0000_0000_0003),
      sku: "MUG-STONE-01".to_string(),
      name: "Stoneware Mug".to_string(),
      website_price: Decimal::new(29900, 2),
      discount_percentage: Decimal::new(5, 0),
      shipping_charge: Decimal::new(60, 0),
      stock_qty: 40,
    },
  ]
}

pub async fn seed(catalog: &dyn CatalogStore, coupons: &dyn CouponStore) -> Result<()> {
  let products = demo_products();
  for product in &products {
    catalog.upsert_product(product).await?;
  }

  let draft = CouponDraft {
    code: WELCOME_COUPON.to_string(),
    percentage: Decimal::new(10, 0),
    status: Some(CouponStatus::Active),
    note: Some("Ten percent off the first order".to_string()),
    expiry_date: None,
    no_expiry: true,
  };
  match coupons.insert_coupon(&draft.into_coupon(Utc::now())?).await {
    Ok(()) | Err(CommerceError::Duplicate { .. }) => {}
    Err(e) => return Err(e),
  }

  info!(products = products.len(), coupon = WELCOME_COUPON, "Seeded demo data.");
  Ok(())
}
