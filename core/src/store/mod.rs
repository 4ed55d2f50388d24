// shopflow/src/store/mod.rs

//! Persistence seams. The catalog and coupon traits live next to their models;
//! orders live here because settlement spans all three.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

pub use crate::catalog::CatalogStore;
pub use crate::coupon::CouponStore;
use crate::error::Result;
use crate::order::{Order, OrderFilter, OrderPage, PageRequest, Settlement, SettlementOutcome};
pub use memory::MemoryStore;

/// Applied to the freshly locked order inside the settlement unit. An error
/// aborts the unit with nothing written.
pub type PaymentMutation<'a> = &'a (dyn Fn(&mut Order) -> Result<Settlement> + Send + Sync);

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Atomically increments and returns the shared order counter.
  async fn next_order_number(&self) -> Result<u64>;

  async fn insert_order(&self, order: &Order) -> Result<()>;

  async fn order(&self, id: Uuid) -> Result<Option<Order>>;

  /// Newest first.
  async fn list_orders(&self, filter: &OrderFilter, page: PageRequest) -> Result<OrderPage>;

  /// Writes `order` if the stored version still equals `order.version`, and
  /// returns it with the bumped version. A stale version is a
  /// `CommerceError::Conflict`.
  async fn save_order(&self, order: &Order) -> Result<Order>;

  /// Runs `mutation` against the current order and, in the same atomic unit,
  /// applies the settlement it returns: stock decrements floored at zero and
  /// at-most-once coupon usage keyed by order id.
  async fn settle_payment(&self, order_id: Uuid, mutation: PaymentMutation<'_>) -> Result<SettlementOutcome>;
}
