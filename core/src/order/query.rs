// shopflow/src/order/query.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Order, OrderStatus, PaymentStatus, ShipmentStatus};

const DEFAULT_PER_PAGE: u32 = 10;
const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
  #[serde(default)]
  pub customer_id: Option<Uuid>,
  #[serde(default)]
  pub order_status: Option<OrderStatus>,
  #[serde(default)]
  pub payment_status: Option<PaymentStatus>,
  #[serde(default)]
  pub shipment_status: Option<ShipmentStatus>,
  #[serde(default)]
  pub created_from: Option<DateTime<Utc>>,
  #[serde(default)]
  pub created_to: Option<DateTime<Utc>>,
}

impl OrderFilter {
  pub fn for_customer(customer_id: Uuid) -> Self {
    Self {
      customer_id: Some(customer_id),
      ..Self::default()
    }
  }

  pub fn matches(&self, order: &Order) -> bool {
    self.customer_id.map_or(true, |c| order.customer_id == c)
      && self.order_status.map_or(true, |s| order.order_status == s)
      && self.payment_status.map_or(true, |s| order.payment.payment_status == s)
      && self.shipment_status.map_or(true, |s| order.shipment.status == s)
      && self.created_from.map_or(true, |from| order.created_at >= from)
      && self.created_to.map_or(true, |to| order.created_at <= to)
  }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
  #[serde(default = "first_page")]
  pub page: u32,
  #[serde(default = "default_per_page")]
  pub per_page: u32,
}

fn first_page() -> u32 {
  1
}

fn default_per_page() -> u32 {
  DEFAULT_PER_PAGE
}

impl Default for PageRequest {
  fn default() -> Self {
    Self {
      page: first_page(),
      per_page: default_per_page(),
    }
  }
}

impl PageRequest {
  /// Clamps to page >= 1 and 1..=100 per page.
  pub fn normalized(self) -> Self {
    Self {
      page: self.page.max(1),
      per_page: self.per_page.clamp(1, MAX_PER_PAGE),
    }
  }

  pub fn offset(self) -> u64 {
    let p = self.normalized();
    u64::from(p.page - 1) * u64::from(p.per_page)
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderPage {
  pub orders: Vec<Order>,
  pub total: u64,
  pub page: u32,
  pub per_page: u32,
  pub total_pages: u64,
}

impl OrderPage {
  pub fn new(orders: Vec<Order>, total: u64, request: PageRequest) -> Self {
    let request = request.normalized();
    let per_page = u64::from(request.per_page);
    Self {
      orders,
      total,
      page: request.page,
      per_page: request.per_page,
      total_pages: total.div_ceil(per_page),
    }
  }

  /// Sorts newest first and slices one page out of an in-memory result set.
  pub fn from_matches(mut matches: Vec<Order>, request: PageRequest) -> Self {
    matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let total = matches.len() as u64;
    let request = request.normalized();
    let orders = matches
      .into_iter()
      .skip(request.offset() as usize)
      .take(request.per_page as usize)
      .collect();
    Self::new(orders, total, request)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::order::fixtures::order;
  use crate::order::PaymentMethod;
  use chrono::Duration;

  #[test]
  fn pages_are_newest_first() {
    let base = Utc::now();
    let orders: Vec<Order> = (0..25)
      .map(|i| {
        let mut o = order(PaymentMethod::Cod);
        o.created_at = base + Duration::minutes(i);
        o
      })
      .collect();
    let newest = orders[24].id;
    let oldest = orders[0].id;

    let first = OrderPage::from_matches(orders.clone(), PageRequest::default());
    assert_eq!(first.orders[0].id, newest);

    let last = OrderPage::from_matches(orders, PageRequest { page: 3, per_page: 10 });
    assert_eq!(last.total, 25);
    assert_eq!(last.total_pages, 3);
    assert_eq!(last.orders.len(), 5);
    assert_eq!(last.orders[4].id, oldest);
  }

  #[test]
  fn zero_values_are_clamped() {
    let p = PageRequest { page: 0, per_page: 0 }.normalized();
    assert_eq!((p.page, p.per_page), (1, 1));
    assert_eq!(PageRequest { page: 1, per_page: 500 }.normalized().per_page, 100);
  }

  #[test]
  fn filter_matches_on_every_field() {
    let o = order(PaymentMethod::Online);
    assert!(OrderFilter::for_customer(o.customer_id).matches(&o));
    assert!(!OrderFilter::for_customer(Uuid::new_v4()).matches(&o));
    let f = OrderFilter {
      payment_status: Some(PaymentStatus::Paid),
      ..Default::default()
    };
    assert!(!f.matches(&o));
    let f = OrderFilter {
      created_to: Some(o.created_at - Duration::seconds(1)),
      ..Default::default()
    };
    assert!(!f.matches(&o));
  }
}
