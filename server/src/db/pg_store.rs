// shopflow_server/src/db/pg_store.rs

use async_trait::async_trait;
use shopflow::catalog::{CatalogStore, Product};
use shopflow::coupon::{Coupon, CouponStore};
use shopflow::order::{Order, OrderFilter, OrderPage, PageRequest, Settlement, SettlementOutcome};
use shopflow::store::{OrderStore, PaymentMutation};
use shopflow::{CommerceError, Result};
use sqlx::postgres::PgExecutor;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::rows::{CouponRow, OrderRow, ProductRow, COUPON_COLUMNS, PRODUCT_COLUMNS};
use super::{db_error, map_db_error};

/// Orders are kept as JSONB documents with their filterable fields mirrored
/// into columns. Settlement locks the order, product and coupon rows it
/// touches and commits them together.
#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

/// Writes `order` (already carrying its new version) if the row is still at
/// `expected_version`. Returns whether a row was updated.
async fn write_order<'e, E: PgExecutor<'e>>(
  executor: E,
  order: &Order,
  expected_version: i64,
) -> std::result::Result<bool, sqlx::Error> {
  let result = sqlx::query(
    "UPDATE orders SET document = $1, order_status = $2, payment_status = $3, shipment_status = $4, \
     version = $5, updated_at = $6 WHERE id = $7 AND version = $8",
  )
  .bind(Json(order))
  .bind(order.order_status.as_str())
  .bind(order.payment.payment_status.as_str())
  .bind(order.shipment.status.as_str())
  .bind(order.version)
  .bind(order.updated_at)
  .bind(order.id)
  .bind(expected_version)
  .execute(executor)
  .await?;
  Ok(result.rows_affected() > 0)
}

/// Merges the settlement's stock lines per product, keyed in id order.
pub(super) fn stock_by_product(settlement: &Settlement) -> BTreeMap<Uuid, u32> {
  let mut merged = BTreeMap::new();
  for line in &settlement.stock {
    let quantity = merged.entry(line.product_id).or_insert(0u32);
    *quantity = quantity.saturating_add(line.quantity);
  }
  merged
}

/// Product rows are locked in ascending id order in a single statement, so
/// two settlements touching the same products in different item order queue
/// behind each other instead of deadlocking.
async fn apply_settlement(
  tx: &mut Transaction<'_, Postgres>,
  order_id: Uuid,
  settlement: &Settlement,
) -> std::result::Result<(), sqlx::Error> {
  let stock = stock_by_product(settlement);
  if !stock.is_empty() {
    let ids: Vec<Uuid> = stock.keys().copied().collect();
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
      "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE"
    ))
    .bind(&ids)
    .fetch_all(&mut **tx)
    .await?;

    let mut locked: BTreeMap<Uuid, Product> = rows.into_iter().map(|row| (row.id, Product::from(row))).collect();
    for (product_id, quantity) in stock {
      let Some(product) = locked.get_mut(&product_id) else {
        warn!(%product_id, %order_id, "Settled order references a missing product.");
        continue;
      };
      if product.decrement_stock(quantity) {
        warn!(%product_id, %order_id, "Stock floored at zero during settlement.");
      }
      sqlx::query("UPDATE products SET stock_qty = $2, updated_at = now() WHERE id = $1")
        .bind(product_id)
        .bind(product.stock_qty)
        .execute(&mut **tx)
        .await?;
    }
  }

  if let Some(coupon_id) = settlement.coupon_id {
    // The membership test keeps usage at most once per order.
    let result = sqlx::query(
      "UPDATE coupons SET order_ids = array_append(order_ids, $2), usage_count = usage_count + 1, \
       updated_at = now() WHERE id = $1 AND NOT ($2 = ANY(order_ids))",
    )
    .bind(coupon_id)
    .bind(order_id)
    .execute(&mut **tx)
    .await?;
    if result.rows_affected() == 0 {
      debug!(%coupon_id, %order_id, "Coupon missing or usage already recorded for order.");
    }
  }
  Ok(())
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
  builder.push(" WHERE TRUE");
  if let Some(customer_id) = filter.customer_id {
    builder.push(" AND customer_id = ").push_bind(customer_id);
  }
  if let Some(status) = filter.order_status {
    builder.push(" AND order_status = ").push_bind(status.as_str());
  }
  if let Some(status) = filter.payment_status {
    builder.push(" AND payment_status = ").push_bind(status.as_str());
  }
  if let Some(status) = filter.shipment_status {
    builder.push(" AND shipment_status = ").push_bind(status.as_str());
  }
  if let Some(from) = filter.created_from {
    builder.push(" AND created_at >= ").push_bind(from);
  }
  if let Some(to) = filter.created_to {
    builder.push(" AND created_at <= ").push_bind(to);
  }
}

#[async_trait]
impl CatalogStore for PgStore {
  async fn product(&self, id: Uuid) -> Result<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_error)?;
    Ok(row.map(Product::from))
  }

  async fn upsert_product(&self, product: &Product) -> Result<()> {
    sqlx::query(
      "INSERT INTO products (id, sku, name, website_price, discount_percentage, shipping_charge, stock_qty) \
       VALUES ($1, $2, $3, $4, $5, $6, $7) \
       ON CONFLICT (id) DO UPDATE SET sku = EXCLUDED.sku, name = EXCLUDED.name, \
       website_price = EXCLUDED.website_price, discount_percentage = EXCLUDED.discount_percentage, \
       shipping_charge = EXCLUDED.shipping_charge, stock_qty = EXCLUDED.stock_qty, updated_at = now()",
    )
    .bind(product.id)
    .bind(&product.sku)
    .bind(&product.name)
    .bind(product.website_price)
    .bind(product.discount_percentage)
    .bind(product.shipping_charge)
    .bind(product.stock_qty)
    .execute(&self.pool)
    .await
    .map_err(|e| map_db_error(e, "sku", &product.sku))?;
    Ok(())
  }
}

#[async_trait]
impl CouponStore for PgStore {
  async fn coupon(&self, id: Uuid) -> Result<Option<Coupon>> {
    let row = sqlx::query_as::<_, CouponRow>(&format!("SELECT {COUPON_COLUMNS} FROM coupons WHERE id = $1"))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_error)?;
    row.map(Coupon::try_from).transpose()
  }

  async fn coupon_by_code(&self, code: &str) -> Result<Option<Coupon>> {
    let row = sqlx::query_as::<_, CouponRow>(&format!("SELECT {COUPON_COLUMNS} FROM coupons WHERE code = $1"))
      .bind(code)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_error)?;
    row.map(Coupon::try_from).transpose()
  }

  async fn insert_coupon(&self, coupon: &Coupon) -> Result<()> {
    sqlx::query(&format!(
      "INSERT INTO coupons ({COUPON_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
    ))
    .bind(coupon.id)
    .bind(&coupon.code)
    .bind(coupon.percentage)
    .bind(coupon.status.as_str())
    .bind(&coupon.note)
    .bind(coupon.expiry_date)
    .bind(coupon.no_expiry)
    .bind(i32::try_from(coupon.usage_count).unwrap_or(i32::MAX))
    .bind(&coupon.order_ids)
    .bind(coupon.created_at)
    .bind(coupon.updated_at)
    .execute(&self.pool)
    .await
    .map_err(|e| map_db_error(e, "code", &coupon.code))?;
    Ok(())
  }

  async fn update_coupon(&self, coupon: &Coupon) -> Result<()> {
    let result = sqlx::query(
      "UPDATE coupons SET code = $2, percentage = $3, status = $4, note = $5, expiry_date = $6, \
       no_expiry = $7, updated_at = $8 WHERE id = $1",
    )
    .bind(coupon.id)
    .bind(&coupon.code)
    .bind(coupon.percentage)
    .bind(coupon.status.as_str())
    .bind(&coupon.note)
    .bind(coupon.expiry_date)
    .bind(coupon.no_expiry)
    .bind(coupon.updated_at)
    .execute(&self.pool)
    .await
    .map_err(|e| map_db_error(e, "code", &coupon.code))?;
    if result.rows_affected() == 0 {
      return Err(CommerceError::not_found("Coupon"));
    }
    Ok(())
  }

  async fn delete_coupon(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
      .map_err(db_error)?;
    Ok(result.rows_affected() > 0)
  }

  async fn list_coupons(&self) -> Result<Vec<Coupon>> {
    let rows = sqlx::query_as::<_, CouponRow>(&format!(
      "SELECT {COUPON_COLUMNS} FROM coupons ORDER BY created_at DESC"
    ))
    .fetch_all(&self.pool)
    .await
    .map_err(db_error)?;
    rows.into_iter().map(Coupon::try_from).collect()
  }
}

#[async_trait]
impl OrderStore for PgStore {
  async fn next_order_number(&self) -> Result<u64> {
    let value = sqlx::query_scalar::<_, i64>("UPDATE sequences SET value = value + 1 WHERE name = 'orders' RETURNING value")
      .fetch_one(&self.pool)
      .await
      .map_err(db_error)?;
    u64::try_from(value).map_err(|_| CommerceError::Internal(format!("order sequence is negative: {value}")))
  }

  #[instrument(name = "pg_insert_order", skip(self, order), fields(order_code = %order.order_code))]
  async fn insert_order(&self, order: &Order) -> Result<()> {
    sqlx::query(
      "INSERT INTO orders (id, order_code, customer_id, order_status, payment_status, shipment_status, \
       version, document, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(order.id)
    .bind(&order.order_code)
    .bind(order.customer_id)
    .bind(order.order_status.as_str())
    .bind(order.payment.payment_status.as_str())
    .bind(order.shipment.status.as_str())
    .bind(order.version)
    .bind(Json(order))
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&self.pool)
    .await
    .map_err(|e| map_db_error(e, "order_code", &order.order_code))?;
    Ok(())
  }

  async fn order(&self, id: Uuid) -> Result<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>("SELECT document, version FROM orders WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_error)?;
    Ok(row.map(Order::from))
  }

  async fn list_orders(&self, filter: &OrderFilter, page: PageRequest) -> Result<OrderPage> {
    let page = page.normalized();

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders");
    push_filter(&mut count, filter);
    let total = count
      .build_query_scalar::<i64>()
      .fetch_one(&self.pool)
      .await
      .map_err(db_error)?;

    let mut select = QueryBuilder::<Postgres>::new("SELECT document, version FROM orders");
    push_filter(&mut select, filter);
    select
      .push(" ORDER BY created_at DESC LIMIT ")
      .push_bind(i64::from(page.per_page))
      .push(" OFFSET ")
      .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
    let rows = select
      .build_query_as::<OrderRow>()
      .fetch_all(&self.pool)
      .await
      .map_err(db_error)?;

    let orders = rows.into_iter().map(Order::from).collect();
    Ok(OrderPage::new(orders, u64::try_from(total).unwrap_or(0), page))
  }

  async fn save_order(&self, order: &Order) -> Result<Order> {
    let mut next = order.clone();
    next.version = order.version + 1;
    if write_order(&self.pool, &next, order.version).await.map_err(db_error)? {
      return Ok(next);
    }
    match self.order(order.id).await? {
      Some(_) => Err(CommerceError::Conflict(format!(
        "Order {} was modified concurrently; reload and retry",
        order.order_code
      ))),
      None => Err(CommerceError::not_found("Order")),
    }
  }

  #[instrument(name = "pg_settle_payment", skip(self, mutation))]
  async fn settle_payment(&self, order_id: Uuid, mutation: PaymentMutation<'_>) -> Result<SettlementOutcome> {
    let mut tx = self.pool.begin().await.map_err(db_error)?;

    let row = sqlx::query_as::<_, OrderRow>("SELECT document, version FROM orders WHERE id = $1 FOR UPDATE")
      .bind(order_id)
      .fetch_optional(&mut *tx)
      .await
      .map_err(db_error)?;
    let mut order = row.map(Order::from).ok_or_else(|| CommerceError::not_found("Order"))?;
    let locked_version = order.version;

    // An error here drops `tx`, which rolls the unit back.
    let settlement = mutation(&mut order)?;
    if settlement.newly_settled {
      apply_settlement(&mut tx, order_id, &settlement).await.map_err(db_error)?;
    }

    order.version = locked_version + 1;
    write_order(&mut *tx, &order, locked_version).await.map_err(db_error)?;
    tx.commit().await.map_err(db_error)?;

    Ok(SettlementOutcome {
      order,
      newly_settled: settlement.newly_settled,
    })
  }
}
