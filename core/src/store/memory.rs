// shopflow/src/store/memory.rs

//! Everything behind one mutex, so settlement is trivially atomic. Backs the
//! test suites and `STORE_BACKEND=memory`.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{OrderStore, PaymentMutation};
use crate::catalog::{CatalogStore, Product};
use crate::coupon::{Coupon, CouponStore};
use crate::error::{CommerceError, Result};
use crate::order::{Order, OrderFilter, OrderPage, PageRequest, Settlement, SettlementOutcome, ORDER_SEQUENCE_START};

struct MemoryState {
  products: HashMap<Uuid, Product>,
  coupons: HashMap<Uuid, Coupon>,
  orders: HashMap<Uuid, Order>,
  order_sequence: u64,
}

pub struct MemoryStore {
  state: Mutex<MemoryState>,
}

impl Default for MemoryStore {
  fn default() -> Self {
    Self::new()
  }
}

impl MemoryStore {
  pub fn new() -> Self {
    Self {
      state: Mutex::new(MemoryState {
        products: HashMap::new(),
        coupons: HashMap::new(),
        orders: HashMap::new(),
        order_sequence: ORDER_SEQUENCE_START,
      }),
    }
  }

  pub fn order_count(&self) -> usize {
    self.state.lock().orders.len()
  }
}

/// Applies settlement effects to the locked state.
fn apply_settlement(state: &mut MemoryState, order_id: Uuid, settlement: &Settlement) {
  for line in &settlement.stock {
    match state.products.get_mut(&line.product_id) {
      Some(product) => {
        if product.decrement_stock(line.quantity) {
          warn!(product_id = %line.product_id, %order_id, "Stock floored at zero during settlement.");
        }
      }
      None => warn!(product_id = %line.product_id, %order_id, "Settled order references a missing product."),
    }
  }
  if let Some(coupon_id) = settlement.coupon_id {
    match state.coupons.get_mut(&coupon_id) {
      Some(coupon) => {
        if !coupon.record_usage(order_id) {
          debug!(%coupon_id, %order_id, "Coupon usage already recorded for order.");
        }
      }
      None => warn!(%coupon_id, %order_id, "Settled order references a missing coupon."),
    }
  }
}

#[async_trait]
impl CatalogStore for MemoryStore {
  async fn product(&self, id: Uuid) -> Result<Option<Product>> {
    Ok(self.state.lock().products.get(&id).cloned())
  }

  async fn upsert_product(&self, product: &Product) -> Result<()> {
    self.state.lock().products.insert(product.id, product.clone());
    Ok(())
  }
}

#[async_trait]
impl CouponStore for MemoryStore {
  async fn coupon(&self, id: Uuid) -> Result<Option<Coupon>> {
    Ok(self.state.lock().coupons.get(&id).cloned())
  }

  async fn coupon_by_code(&self, code: &str) -> Result<Option<Coupon>> {
    Ok(self.state.lock().coupons.values().find(|c| c.code == code).cloned())
  }

  async fn insert_coupon(&self, coupon: &Coupon) -> Result<()> {
    let mut state = self.state.lock();
    if state.coupons.values().any(|c| c.code == coupon.code) {
      return Err(CommerceError::Duplicate {
        field: "code".to_string(),
        value: coupon.code.clone(),
      });
    }
    state.coupons.insert(coupon.id, coupon.clone());
    Ok(())
  }

  async fn update_coupon(&self, coupon: &Coupon) -> Result<()> {
    let mut state = self.state.lock();
    if state.coupons.values().any(|c| c.code == coupon.code && c.id != coupon.id) {
      return Err(CommerceError::Duplicate {
        field: "code".to_string(),
        value: coupon.code.clone(),
      });
    }
    let stored = state.coupons.get_mut(&coupon.id).ok_or_else(|| CommerceError::not_found("Coupon"))?;
    stored.code = coupon.code.clone();
    stored.percentage = coupon.percentage;
    stored.status = coupon.status;
    stored.note = coupon.note.clone();
    stored.expiry_date = coupon.expiry_date;
    stored.no_expiry = coupon.no_expiry;
    stored.updated_at = coupon.updated_at;
    Ok(())
  }

  async fn delete_coupon(&self, id: Uuid) -> Result<bool> {
    Ok(self.state.lock().coupons.remove(&id).is_some())
  }

  async fn list_coupons(&self) -> Result<Vec<Coupon>> {
    let mut coupons: Vec<Coupon> = self.state.lock().coupons.values().cloned().collect();
    coupons.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(coupons)
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn next_order_number(&self) -> Result<u64> {
    let mut state = self.state.lock();
    state.order_sequence += 1;
    Ok(state.order_sequence)
  }

  async fn insert_order(&self, order: &Order) -> Result<()> {
    let mut state = self.state.lock();
    if state.orders.values().any(|o| o.order_code == order.order_code) {
      return Err(CommerceError::Duplicate {
        field: "order_code".to_string(),
        value: order.order_code.clone(),
      });
    }
    state.orders.insert(order.id, order.clone());
    Ok(())
  }

  async fn order(&self, id: Uuid) -> Result<Option<Order>> {
    Ok(self.state.lock().orders.get(&id).cloned())
  }

  async fn list_orders(&self, filter: &OrderFilter, page: PageRequest) -> Result<OrderPage> {
    let matches: Vec<Order> = self
      .state
      .lock()
      .orders
      .values()
      .filter(|o| filter.matches(o))
      .cloned()
      .collect();
    Ok(OrderPage::from_matches(matches, page))
  }

  async fn save_order(&self, order: &Order) -> Result<Order> {
    let mut state = self.state.lock();
    let stored = state.orders.get_mut(&order.id).ok_or_else(|| CommerceError::not_found("Order"))?;
    if stored.version != order.version {
      return Err(CommerceError::Conflict(format!(
        "Order {} was modified concurrently; reload and retry",
        order.order_code
      )));
    }
    let mut next = order.clone();
    next.version += 1;
    *stored = next.clone();
    Ok(next)
  }

  async fn settle_payment(&self, order_id: Uuid, mutation: PaymentMutation<'_>) -> Result<SettlementOutcome> {
    let mut state = self.state.lock();
    let mut order = state.orders.get(&order_id).cloned().ok_or_else(|| CommerceError::not_found("Order"))?;
    let settlement = mutation(&mut order)?;
    if settlement.newly_settled {
      apply_settlement(&mut state, order_id, &settlement);
    }
    order.version += 1;
    state.orders.insert(order_id, order.clone());
    Ok(SettlementOutcome {
      order,
      newly_settled: settlement.newly_settled,
    })
  }
}
