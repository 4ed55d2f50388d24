// shopflow/src/order/status.rs

//! Order lifecycle rules.
//!
//! ```text
//! pending -> processing -> accept -> delivered
//!    \___________\____________\----> cancelled
//! ```
//! `accept` needs COD or a paid order; `delivered` needs a confirmed
//! shipment. There is no way back.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{Order, OrderStatus, PaymentMethod, PaymentStatus, ShipmentStatus};
use crate::error::{CommerceError, Result};

fn invalid(message: impl Into<String>) -> CommerceError {
  CommerceError::InvalidTransition(message.into())
}

/// Checks whether `order` may move to `target` without touching it.
pub fn check_transition(order: &Order, target: OrderStatus) -> Result<()> {
  let current = order.order_status;
  if current == target {
    return Err(invalid(format!("Order is already in status {current}")));
  }
  if current.is_terminal() {
    return Err(invalid(format!("Order is {current}; no further changes are allowed")));
  }
  match target {
    OrderStatus::Pending => Err(invalid("Orders cannot be moved back to pending")),
    OrderStatus::Processing => {
      if current == OrderStatus::Pending {
        Ok(())
      } else {
        Err(invalid(format!("Cannot move from {current} to processing")))
      }
    }
    OrderStatus::Accept => {
      let cod = order.payment.payment_method == PaymentMethod::Cod;
      if !cod && order.payment.payment_status != PaymentStatus::Paid {
        return Err(invalid("Cannot accept order: payment not completed"));
      }
      Ok(())
    }
    OrderStatus::Delivered => {
      if current != OrderStatus::Accept {
        return Err(invalid(format!("Cannot move from {current} to delivered")));
      }
      if !order.shipment.confirmed {
        return Err(invalid("Cannot deliver order: shipment not confirmed"));
      }
      Ok(())
    }
    OrderStatus::Cancelled => Ok(()),
  }
}

/// Admin-supplied carrier details.
#[derive(Debug, Clone, Deserialize)]
pub struct ShipmentUpdate {
  pub tracking_id: String,
  pub carrier: String,
  #[serde(default)]
  pub tracking_url: Option<String>,
}

impl Order {
  /// Moves the order to `target`, keeping the shipment record in step.
  pub fn transition_to(&mut self, target: OrderStatus, now: DateTime<Utc>) -> Result<()> {
    check_transition(self, target)?;
    match target {
      OrderStatus::Delivered => self.shipment.status = ShipmentStatus::Delivered,
      OrderStatus::Cancelled => self.shipment.status = ShipmentStatus::Cancelled,
      _ => {}
    }
    self.order_status = target;
    self.updated_at = now;
    Ok(())
  }

  /// Records carrier details and confirms the shipment. Only accepted orders
  /// can ship; re-sending corrects the tracking data.
  pub fn record_shipment(&mut self, update: ShipmentUpdate, now: DateTime<Utc>) -> Result<()> {
    let tracking_id = update.tracking_id.trim();
    let carrier = update.carrier.trim();
    if tracking_id.is_empty() || carrier.is_empty() {
      return Err(CommerceError::Validation(
        "Tracking ID and carrier are required".to_string(),
      ));
    }
    if self.order_status != OrderStatus::Accept {
      return Err(invalid(format!(
        "Shipment can only be updated for accepted orders (current status: {})",
        self.order_status
      )));
    }
    self.shipment.tracking_id = Some(tracking_id.to_string());
    self.shipment.carrier = Some(carrier.to_string());
    self.shipment.tracking_url = update.tracking_url.filter(|u| !u.trim().is_empty());
    self.shipment.status = ShipmentStatus::Shipped;
    self.shipment.confirmed = true;
    self.shipment.shipped_at.get_or_insert(now);
    self.updated_at = now;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::order::fixtures::order;

  fn shipment() -> ShipmentUpdate {
    ShipmentUpdate {
      tracking_id: "TRK1".into(),
      carrier: "BlueDart".into(),
      tracking_url: None,
    }
  }

  #[test]
  fn accept_requires_payment_unless_cod() {
    let mut online = order(PaymentMethod::Online);
    let err = online.transition_to(OrderStatus::Accept, Utc::now()).unwrap_err();
    assert!(matches!(err, CommerceError::InvalidTransition(ref m) if m.contains("payment not completed")));
    assert_eq!(online.order_status, OrderStatus::Pending);

    online.payment.payment_status = PaymentStatus::Paid;
    online.transition_to(OrderStatus::Accept, Utc::now()).unwrap();

    let mut cod = order(PaymentMethod::Cod);
    cod.transition_to(OrderStatus::Accept, Utc::now()).unwrap();
    assert_eq!(cod.order_status, OrderStatus::Accept);
  }

  #[test]
  fn delivery_requires_confirmed_shipment() {
    let mut o = order(PaymentMethod::Cod);
    o.transition_to(OrderStatus::Accept, Utc::now()).unwrap();
    assert!(o.transition_to(OrderStatus::Delivered, Utc::now()).is_err());

    o.record_shipment(shipment(), Utc::now()).unwrap();
    assert_eq!(o.shipment.status, ShipmentStatus::Shipped);
    o.transition_to(OrderStatus::Delivered, Utc::now()).unwrap();
    assert_eq!(o.shipment.status, ShipmentStatus::Delivered);
  }

  #[test]
  fn same_status_is_rejected() {
    let mut o = order(PaymentMethod::Cod);
    let err = o.transition_to(OrderStatus::Pending, Utc::now()).unwrap_err();
    assert_eq!(err.to_string(), "Order is already in status pending");
  }

  #[test]
  fn no_backward_path() {
    let mut o = order(PaymentMethod::Cod);
    o.transition_to(OrderStatus::Accept, Utc::now()).unwrap();
    assert!(o.transition_to(OrderStatus::Processing, Utc::now()).is_err());
    assert!(o.transition_to(OrderStatus::Pending, Utc::now()).is_err());
  }

  #[test]
  fn cancelled_is_terminal_and_cancels_shipment() {
    let mut o = order(PaymentMethod::Online);
    o.transition_to(OrderStatus::Cancelled, Utc::now()).unwrap();
    assert_eq!(o.shipment.status, ShipmentStatus::Cancelled);
    assert!(o.transition_to(OrderStatus::Processing, Utc::now()).is_err());
  }

  #[test]
  fn shipment_needs_accepted_order_and_both_fields() {
    let mut o = order(PaymentMethod::Cod);
    assert!(matches!(
      o.record_shipment(shipment(), Utc::now()),
      Err(CommerceError::InvalidTransition(_))
    ));
    o.transition_to(OrderStatus::Accept, Utc::now()).unwrap();
    let blank = ShipmentUpdate {
      carrier: "  ".into(),
      ..shipment()
    };
    assert!(matches!(o.record_shipment(blank, Utc::now()), Err(CommerceError::Validation(_))));
    assert!(!o.shipment.confirmed);
  }
}
