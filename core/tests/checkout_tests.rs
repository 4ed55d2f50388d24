// tests/checkout_tests.rs
mod common;

use common::*;
use rust_decimal_macros::dec;
use serial_test::serial;
use shopflow::catalog::CatalogStore;
use shopflow::coupon::CouponStore;
use shopflow::order::{OrderStatus, PaymentMethod, PaymentStatus};
use shopflow::CommerceError;
use std::sync::atomic::Ordering;
use std::time::Duration;
use uuid::Uuid;

#[tokio::test]
#[serial]
async fn places_reference_order_with_coupon() {
  let h = Harness::new();
  let product = h.reference_product(10).await;
  let coupon = h.add_coupon("SAVE5", dec!(5)).await;

  let placed = h
    .engine
    .place_order(h.customer_id, checkout_request(vec![(product.id, 2)], Some(coupon.id)))
    .await
    .unwrap();

  let order = &placed.order;
  assert_eq!(order.payment.product_total, dec!(200));
  assert_eq!(order.payment.discount_amount, dec!(20));
  assert_eq!(order.payment.coupon_discount_amount, dec!(10));
  assert_eq!(order.payment.shipping_charge, dec!(20));
  assert_eq!(order.payment.total_amount, dec!(190));
  assert_eq!(order.order_status, OrderStatus::Pending);
  assert_eq!(order.payment.payment_status, PaymentStatus::Pending);
  assert_eq!(order.payment.payment_method, PaymentMethod::Online);
  assert_eq!(order.coupon_id, Some(coupon.id));
  assert_eq!(order.order_code, "ORD-10001");
  assert_eq!(order.gateway_order_id(), Some("intent_1"));

  let intent = placed.gateway_intent.expect("online orders carry an intent");
  assert_eq!(intent.amount, 19000);
  assert_eq!(intent.currency, "INR");
  assert_eq!(*h.gateway.receipts.lock(), vec![order.receipt_ref()]);

  // Usage and stock only move on payment.
  assert_eq!(h.coupon_state(coupon.id).await.usage_count, 0);
  assert_eq!(h.stock_of(product.id).await, 10);
  assert_eq!(h.notifier.placed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
#[serial]
async fn order_codes_increase() {
  let h = Harness::new();
  let product = h.reference_product(10).await;
  let first = h
    .engine
    .place_order(h.customer_id, checkout_request(vec![(product.id, 1)], None))
    .await
    .unwrap();
  let second = h
    .engine
    .place_order(h.customer_id, checkout_request(vec![(product.id, 1)], None))
    .await
    .unwrap();
  assert_eq!(first.order.order_code, "ORD-10001");
  assert_eq!(second.order.order_code, "ORD-10002");
}

#[tokio::test]
#[serial]
async fn missing_product_aborts_without_an_order() {
  let h = Harness::new();
  let product = h.reference_product(10).await;
  let err = h
    .engine
    .place_order(h.customer_id, checkout_request(vec![(product.id, 1), (Uuid::new_v4(), 1)], None))
    .await
    .unwrap_err();

  assert!(matches!(err, CommerceError::NotFound(_)));
  assert_eq!(err.status_code(), 404);
  assert_eq!(h.store.order_count(), 0);
  assert_eq!(h.gateway.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
#[serial]
async fn invalid_request_is_a_validation_error() {
  let h = Harness::new();
  let err = h
    .engine
    .place_order(h.customer_id, checkout_request(vec![], None))
    .await
    .unwrap_err();
  assert_eq!(err.status_code(), 400);
  assert_eq!(h.store.order_count(), 0);
}

#[tokio::test]
#[serial]
async fn cod_skips_the_gateway() {
  let h = Harness::new();
  let product = h.reference_product(10).await;
  let mut request = checkout_request(vec![(product.id, 1)], None);
  request.payment_method = Some(PaymentMethod::Cod);

  let placed = h.engine.place_order(h.customer_id, request).await.unwrap();
  assert!(placed.gateway_intent.is_none());
  assert_eq!(placed.order.payment.payment_method, PaymentMethod::Cod);
  assert_eq!(placed.order.gateway_order_id(), None);
  assert_eq!(h.gateway.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
#[serial]
async fn expired_coupon_is_ignored() {
  let h = Harness::new();
  let product = h.reference_product(10).await;
  let mut coupon = h.add_coupon("OLD10", dec!(10)).await;
  coupon.expiry_date = Some(chrono::Utc::now() - chrono::Duration::days(1));
  h.store.update_coupon(&coupon).await.unwrap();

  let placed = h
    .engine
    .place_order(h.customer_id, checkout_request(vec![(product.id, 2)], Some(coupon.id)))
    .await
    .unwrap();
  assert_eq!(placed.order.coupon_id, None);
  assert_eq!(placed.order.payment.coupon_discount_amount, dec!(0));
  assert_eq!(placed.order.payment.total_amount, dec!(200));
}

#[tokio::test]
#[serial]
async fn gateway_failure_persists_nothing() {
  let mut gateway = StubGateway::new("intent_x");
  gateway.fail = true;
  let h = Harness::with(gateway, RecordingNotifier::default(), Duration::from_secs(2));
  let product = h.reference_product(10).await;

  let err = h
    .engine
    .place_order(h.customer_id, checkout_request(vec![(product.id, 1)], None))
    .await
    .unwrap_err();
  assert!(matches!(err, CommerceError::ExternalService { .. }));
  assert_eq!(h.store.order_count(), 0);
}

#[tokio::test]
#[serial]
async fn gateway_timeout_is_retryable_and_persists_nothing() {
  let mut gateway = StubGateway::new("intent_slow");
  gateway.delay = Duration::from_millis(300);
  let h = Harness::with(gateway, RecordingNotifier::default(), Duration::from_millis(20));
  let product = h.reference_product(10).await;

  let err = h
    .engine
    .place_order(h.customer_id, checkout_request(vec![(product.id, 1)], None))
    .await
    .unwrap_err();
  assert!(err.is_retryable());
  assert_eq!(err.status_code(), 503);
  assert_eq!(h.store.order_count(), 0);
}

#[tokio::test]
#[serial]
async fn notifier_failure_does_not_fail_checkout() {
  let notifier = RecordingNotifier {
    fail: true,
    ..Default::default()
  };
  let h = Harness::with(StubGateway::new("intent_1"), notifier, Duration::from_secs(2));
  let product = h.reference_product(10).await;

  let placed = h
    .engine
    .place_order(h.customer_id, checkout_request(vec![(product.id, 1)], None))
    .await
    .unwrap();
  assert_eq!(h.store.order_count(), 1);
  assert_eq!(h.notifier.placed.load(Ordering::SeqCst), 1);
  assert_eq!(placed.order.order_status, OrderStatus::Pending);
}

#[tokio::test]
#[serial]
async fn snapshots_survive_catalog_changes() {
  let h = Harness::new();
  let mut product = h.reference_product(10).await;
  let placed = h
    .engine
    .place_order(h.customer_id, checkout_request(vec![(product.id, 1)], None))
    .await
    .unwrap();

  product.website_price = dec!(999);
  h.store.upsert_product(&product).await.unwrap();

  let stored = h.engine.order(placed.order.id).await.unwrap();
  assert_eq!(stored.items[0].unit_price, dec!(100));
  assert_eq!(stored.payment.total_amount, placed.order.payment.total_amount);
}
