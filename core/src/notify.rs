// shopflow/src/notify.rs

use async_trait::async_trait;

use crate::error::Result;
use crate::order::Order;

/// Customer notifications. Failures are logged by the workflows and never
/// reach the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
  async fn order_placed(&self, order: &Order) -> Result<()>;

  async fn payment_confirmed(&self, order: &Order) -> Result<()>;
}
