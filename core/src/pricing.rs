// shopflow/src/pricing.rs

//! Order totals from current catalog data and an optional coupon.
//!
//! Per line: `line_total = price * qty`, the per-item discount counts once per
//! unit, and the product's shipping charge counts once per line. The coupon
//! discount is taken from the undiscounted product total.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::catalog::{CatalogStore, Product};
use crate::error::{CommerceError, Result};
use crate::money::{percent_of, round2};
use crate::order::{OrderItem, Variant};

pub const MAX_LINE_QUANTITY: u32 = 9999;

/// One requested cart line before pricing.
#[derive(Debug, Clone)]
pub struct CartLine {
  pub product_id: Uuid,
  pub quantity: u32,
  pub variant: Option<Variant>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceBreakdown {
  pub product_total: Decimal,
  pub discount_amount: Decimal,
  pub coupon_discount_amount: Decimal,
  pub shipping_charge: Decimal,
  pub total_amount: Decimal,
}

#[derive(Debug, Clone)]
pub struct PricedCart {
  pub items: Vec<OrderItem>,
  pub totals: PriceBreakdown,
}

/// Prices already-resolved lines. `coupon_percentage` is `None` when no usable
/// coupon applies.
pub fn price_lines(lines: &[(Product, CartLine)], coupon_percentage: Option<Decimal>) -> Result<PricedCart> {
  if lines.is_empty() {
    return Err(CommerceError::Validation("Order must contain at least one item".to_string()));
  }
  let mut totals = PriceBreakdown::default();
  let mut items = Vec::with_capacity(lines.len());

  for (product, line) in lines {
    if line.quantity == 0 || line.quantity > MAX_LINE_QUANTITY {
      return Err(CommerceError::Validation(format!(
        "Quantity for product {} must be between 1 and {MAX_LINE_QUANTITY}",
        product.id
      )));
    }
    let quantity = Decimal::from(line.quantity);
    let item_price = product.website_price;
    let item_discount = percent_of(item_price, product.discount_percentage);
    let line_total = item_price * quantity;

    totals.product_total += line_total;
    totals.discount_amount += item_discount * quantity;
    totals.shipping_charge += product.shipping_charge;

    items.push(OrderItem {
      product_id: product.id,
      sku: product.sku.clone(),
      name: product.name.clone(),
      variant: line.variant.clone(),
      unit_price: item_price,
      discount_percentage: product.discount_percentage,
      line_total,
      quantity: line.quantity,
    });
  }

  if let Some(percentage) = coupon_percentage {
    totals.coupon_discount_amount = round2(percent_of(totals.product_total, percentage));
  }
  totals.total_amount = round2(
    totals.product_total - totals.discount_amount - totals.coupon_discount_amount + totals.shipping_charge,
  );
  if totals.total_amount < Decimal::ZERO {
    return Err(CommerceError::Validation(format!(
      "Computed order total {} is negative",
      totals.total_amount
    )));
  }
  Ok(PricedCart { items, totals })
}

/// Resolves every line against the catalog, then prices them. A single
/// missing product aborts the whole calculation.
#[instrument(name = "pricing::price_cart", skip_all, fields(lines = lines.len()))]
pub async fn price_cart(
  catalog: &dyn CatalogStore,
  lines: &[CartLine],
  coupon_percentage: Option<Decimal>,
) -> Result<PricedCart> {
  let mut resolved = Vec::with_capacity(lines.len());
  for line in lines {
    let product = catalog
      .product(line.product_id)
      .await?
      .ok_or_else(|| CommerceError::NotFound(format!("Product {} not found", line.product_id)))?;
    resolved.push((product, line.clone()));
  }
  let priced = price_lines(&resolved, coupon_percentage)?;
  debug!(total = %priced.totals.total_amount, "Cart priced.");
  Ok(priced)
}
