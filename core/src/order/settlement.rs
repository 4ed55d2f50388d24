// shopflow/src/order/settlement.rs

//! Moving an order to `Paid` and computing the one-time side effects that go
//! with it. Stores apply the returned effects in the same atomic unit as the
//! order write.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{Order, OrderStatus, PaymentDetails, PaymentStatus};
use crate::error::{CommerceError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockDecrement {
  pub product_id: Uuid,
  pub quantity: u32,
}

/// Effects owed by the first settlement of an order. Repeat settlements owe
/// nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settlement {
  pub stock: Vec<StockDecrement>,
  pub coupon_id: Option<Uuid>,
  pub newly_settled: bool,
}

impl Settlement {
  pub fn none() -> Self {
    Self::default()
  }
}

/// What a store hands back after committing a payment update.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
  pub order: Order,
  pub newly_settled: bool,
}

impl Order {
  /// Sets `payment_status`, merging `details`. Moving to `Paid` also moves a
  /// pending order to processing and, the first time only, yields the stock
  /// and coupon effects.
  pub fn apply_payment_status(
    &mut self,
    status: PaymentStatus,
    details: Option<PaymentDetails>,
    now: DateTime<Utc>,
  ) -> Result<Settlement> {
    if status == PaymentStatus::Paid && self.order_status == OrderStatus::Cancelled {
      return Err(CommerceError::InvalidTransition(
        "Cannot record payment for a cancelled order".to_string(),
      ));
    }
    if let Some(details) = details {
      self.payment.payment_details.merge(details);
    }
    self.payment.payment_status = status;
    self.updated_at = now;

    if status != PaymentStatus::Paid {
      return Ok(Settlement::none());
    }
    if self.order_status == OrderStatus::Pending {
      self.order_status = OrderStatus::Processing;
    }
    if self.payment.settled_at.is_some() {
      return Ok(Settlement::none());
    }
    self.payment.settled_at = Some(now);
    Ok(Settlement {
      stock: self
        .items
        .iter()
        .map(|item| StockDecrement {
          product_id: item.product_id,
          quantity: item.quantity,
        })
        .collect(),
      coupon_id: self.coupon_id,
      newly_settled: true,
    })
  }
}
