// tests/admin_tests.rs
mod common;

use chrono::{Duration, Utc};
use common::*;
use rust_decimal_macros::dec;
use serial_test::serial;
use shopflow::coupon::{CouponDraft, CouponPatch, CouponStatus};
use shopflow::order::{
  OrderFilter, OrderStatus, PageRequest, PaymentMethod, PaymentStatus, ShipmentStatus, ShipmentUpdate,
};
use shopflow::store::OrderStore;
use shopflow::workflows::PaymentStatusUpdate;
use shopflow::CommerceError;
use uuid::Uuid;

fn shipment() -> ShipmentUpdate {
  ShipmentUpdate {
    tracking_id: "TRK-1".into(),
    carrier: "Delhivery".into(),
    tracking_url: Some("https://track.example/TRK-1".into()),
  }
}

async fn place(h: &Harness, method: PaymentMethod) -> Uuid {
  let product = h.reference_product(10).await;
  let mut request = checkout_request(vec![(product.id, 1)], None);
  request.payment_method = Some(method);
  h.engine.place_order(h.customer_id, request).await.unwrap().order.id
}

#[tokio::test]
#[serial]
async fn online_order_cannot_be_accepted_before_payment() {
  let h = Harness::new();
  let order_id = place(&h, PaymentMethod::Online).await;

  let err = h.engine.update_order_status(order_id, OrderStatus::Accept).await.unwrap_err();
  assert!(matches!(err, CommerceError::InvalidTransition(_)));
  assert_eq!(err.status_code(), 400);
  assert_eq!(h.engine.order(order_id).await.unwrap().order_status, OrderStatus::Pending);

  h.engine
    .update_payment_status(
      order_id,
      PaymentStatusUpdate {
        payment_status: PaymentStatus::Paid,
        payment_details: None,
      },
    )
    .await
    .unwrap();
  let accepted = h.engine.update_order_status(order_id, OrderStatus::Accept).await.unwrap();
  assert_eq!(accepted.order_status, OrderStatus::Accept);
}

#[tokio::test]
#[serial]
async fn cod_order_runs_the_full_lifecycle() {
  let h = Harness::new();
  let order_id = place(&h, PaymentMethod::Cod).await;

  h.engine.update_order_status(order_id, OrderStatus::Processing).await.unwrap();
  h.engine.update_order_status(order_id, OrderStatus::Accept).await.unwrap();

  let err = h.engine.update_order_status(order_id, OrderStatus::Delivered).await.unwrap_err();
  assert!(err.to_string().contains("shipment not confirmed"));

  let shipped = h.engine.update_shipment(order_id, shipment()).await.unwrap();
  assert!(shipped.shipment.confirmed);
  assert_eq!(shipped.shipment.status, ShipmentStatus::Shipped);

  let delivered = h.engine.update_order_status(order_id, OrderStatus::Delivered).await.unwrap();
  assert_eq!(delivered.order_status, OrderStatus::Delivered);
  assert_eq!(delivered.shipment.status, ShipmentStatus::Delivered);

  let err = h.engine.update_order_status(order_id, OrderStatus::Cancelled).await.unwrap_err();
  assert!(matches!(err, CommerceError::InvalidTransition(_)));
}

#[tokio::test]
#[serial]
async fn shipment_requires_accepted_order() {
  let h = Harness::new();
  let order_id = place(&h, PaymentMethod::Cod).await;
  let err = h.engine.update_shipment(order_id, shipment()).await.unwrap_err();
  assert!(matches!(err, CommerceError::InvalidTransition(_)));
}

#[tokio::test]
#[serial]
async fn repeated_status_is_rejected() {
  let h = Harness::new();
  let order_id = place(&h, PaymentMethod::Cod).await;
  h.engine.update_order_status(order_id, OrderStatus::Processing).await.unwrap();
  let err = h.engine.update_order_status(order_id, OrderStatus::Processing).await.unwrap_err();
  assert_eq!(err.to_string(), "Order is already in status processing");
}

#[tokio::test]
#[serial]
async fn stale_writes_conflict() {
  let h = Harness::new();
  let order_id = place(&h, PaymentMethod::Cod).await;
  let stale = h.engine.order(order_id).await.unwrap();
  h.engine.update_order_status(order_id, OrderStatus::Processing).await.unwrap();

  let err = h.store.save_order(&stale).await.unwrap_err();
  assert!(matches!(err, CommerceError::Conflict(_)));
  assert_eq!(err.status_code(), 409);
  assert!(err.is_retryable());
}

#[tokio::test]
#[serial]
async fn unknown_order_is_not_found() {
  let h = Harness::new();
  let err = h
    .engine
    .update_order_status(Uuid::new_v4(), OrderStatus::Accept)
    .await
    .unwrap_err();
  assert_eq!(err.status_code(), 404);
}

#[tokio::test]
#[serial]
async fn customers_only_see_their_own_orders() {
  let h = Harness::new();
  let order_id = place(&h, PaymentMethod::Cod).await;
  assert!(h.engine.customer_order(h.customer_id, order_id).await.is_ok());
  let err = h.engine.customer_order(Uuid::new_v4(), order_id).await.unwrap_err();
  assert_eq!(err.status_code(), 404);

  let mine = h.engine.customer_orders(h.customer_id, PageRequest::default()).await.unwrap();
  assert_eq!(mine.total, 1);
  let theirs = h.engine.customer_orders(Uuid::new_v4(), PageRequest::default()).await.unwrap();
  assert_eq!(theirs.total, 0);
}

#[tokio::test]
#[serial]
async fn admin_listing_filters_and_paginates() {
  let h = Harness::new();
  for _ in 0..3 {
    place(&h, PaymentMethod::Cod).await;
  }
  let online = place(&h, PaymentMethod::Online).await;
  h.engine
    .update_payment_status(
      online,
      PaymentStatusUpdate {
        payment_status: PaymentStatus::Paid,
        payment_details: None,
      },
    )
    .await
    .unwrap();

  let all = h
    .engine
    .list_orders(&OrderFilter::default(), PageRequest { page: 1, per_page: 2 })
    .await
    .unwrap();
  assert_eq!(all.total, 4);
  assert_eq!(all.total_pages, 2);
  assert_eq!(all.orders.len(), 2);

  let paid = OrderFilter {
    payment_status: Some(PaymentStatus::Paid),
    ..Default::default()
  };
  let page = h.engine.list_orders(&paid, PageRequest::default()).await.unwrap();
  assert_eq!(page.total, 1);
  assert_eq!(page.orders[0].id, online);
  assert_eq!(page.orders[0].order_status, OrderStatus::Processing);
}

#[tokio::test]
#[serial]
async fn coupon_admin_round_trip() {
  let h = Harness::new();
  let created = h
    .engine
    .create_coupon(CouponDraft {
      code: " diwali20 ".into(),
      percentage: dec!(20),
      status: None,
      note: Some("festive".into()),
      expiry_date: Some(Utc::now() + Duration::days(3)),
      no_expiry: false,
    })
    .await
    .unwrap();
  assert_eq!(created.code, "DIWALI20");

  let quote = h.engine.validate_coupon("diwali20").await.unwrap();
  assert_eq!(quote.code, "DIWALI20");
  assert_eq!(quote.discount_percentage, dec!(20));

  let dup = h
    .engine
    .create_coupon(CouponDraft {
      code: "DIWALI20".into(),
      percentage: dec!(5),
      status: None,
      note: None,
      expiry_date: None,
      no_expiry: true,
    })
    .await
    .unwrap_err();
  assert_eq!(dup.to_string(), "Duplicate value for 'code': 'DIWALI20'. Choose another.");
  assert_eq!(dup.status_code(), 400);

  let updated = h
    .engine
    .update_coupon(
      created.id,
      CouponPatch {
        status: Some(CouponStatus::Inactive),
        ..Default::default()
      },
    )
    .await
    .unwrap();
  assert_eq!(updated.status, CouponStatus::Inactive);
  let err = h.engine.validate_coupon("DIWALI20").await.unwrap_err();
  assert_eq!(err.to_string(), "Coupon is inactive");

  assert_eq!(h.engine.list_coupons().await.unwrap().len(), 1);
  assert_eq!(h.engine.coupon(created.id).await.unwrap().total_orders, 0);

  h.engine.delete_coupon(created.id).await.unwrap();
  assert_eq!(h.engine.delete_coupon(created.id).await.unwrap_err().status_code(), 404);
  assert_eq!(h.engine.validate_coupon("DIWALI20").await.unwrap_err().status_code(), 404);
}

#[tokio::test]
#[serial]
async fn validate_coupon_reports_expiry() {
  let h = Harness::new();
  let created = h
    .engine
    .create_coupon(CouponDraft {
      code: "GONE".into(),
      percentage: dec!(5),
      status: None,
      note: None,
      expiry_date: Some(Utc::now() - Duration::seconds(1)),
      no_expiry: false,
    })
    .await
    .unwrap();
  let err = h.engine.validate_coupon(&created.code).await.unwrap_err();
  assert_eq!(err.to_string(), "Coupon has expired");
  assert_eq!(err.status_code(), 400);
}

#[tokio::test]
#[serial]
async fn coupon_edit_keeps_usage_recorded_by_settlement() {
  let h = Harness::new();
  let product = h.reference_product(10).await;
  let coupon = h.add_coupon("KEEP", dec!(5)).await;
  let placed = h
    .engine
    .place_order(h.customer_id, checkout_request(vec![(product.id, 1)], Some(coupon.id)))
    .await
    .unwrap();
  h.engine
    .update_payment_status(
      placed.order.id,
      PaymentStatusUpdate {
        payment_status: PaymentStatus::Paid,
        payment_details: None,
      },
    )
    .await
    .unwrap();

  let edited = h
    .engine
    .update_coupon(
      coupon.id,
      CouponPatch {
        note: Some("edited".into()),
        ..Default::default()
      },
    )
    .await
    .unwrap();
  assert_eq!(edited.note, "edited");
  assert_eq!(edited.usage_count, 1);
  assert_eq!(edited.order_ids, vec![placed.order.id]);
}
