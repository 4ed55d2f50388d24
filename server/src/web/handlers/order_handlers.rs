// shopflow_server/src/web/handlers/order_handlers.rs

//! Customer-facing order endpoints: checkout, payment verification and the
//! customer's own order history.

use actix_web::{web, HttpResponse};
use serde_json::json;
use shopflow::order::PageRequest;
use shopflow::workflows::{CheckoutRequest, VerifyPaymentRequest};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CustomerUser;

#[instrument(
  name = "handler::place_order",
  skip(app_state, customer, payload),
  fields(user_id = %customer.0.user_id)
)]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  customer: CustomerUser,
  payload: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
  let placed = app_state
    .engine
    .place_order(customer.0.user_id, payload.into_inner())
    .await?;
  info!(order_code = %placed.order.order_code, "Order placed.");
  Ok(HttpResponse::Created().json(json!({
    "success": true,
    "order": placed.order,
    "gateway_intent": placed.gateway_intent,
  })))
}

#[instrument(
  name = "handler::verify_payment",
  skip(app_state, customer, payload),
  fields(user_id = %customer.0.user_id, order_id = %payload.order_id)
)]
pub async fn verify_payment_handler(
  app_state: web::Data<AppState>,
  customer: CustomerUser,
  payload: web::Json<VerifyPaymentRequest>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .engine
    .verify_payment(Some(customer.0.user_id), payload.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": "Payment verified",
    "order": order,
  })))
}

#[instrument(name = "handler::payment_status", skip(app_state, customer), fields(user_id = %customer.0.user_id))]
pub async fn payment_status_handler(
  app_state: web::Data<AppState>,
  customer: CustomerUser,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let payment = app_state.engine.fetch_payment(&path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": "Payment status fetched successfully",
    "data": payment,
  })))
}

#[instrument(name = "handler::my_orders", skip(app_state, customer), fields(user_id = %customer.0.user_id))]
pub async fn list_my_orders_handler(
  app_state: web::Data<AppState>,
  customer: CustomerUser,
  page: web::Query<PageRequest>,
) -> Result<HttpResponse, AppError> {
  let page = app_state
    .engine
    .customer_orders(customer.0.user_id, page.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page })))
}

#[instrument(name = "handler::my_order", skip(app_state, customer), fields(user_id = %customer.0.user_id))]
pub async fn get_my_order_handler(
  app_state: web::Data<AppState>,
  customer: CustomerUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .engine
    .customer_order(customer.0.user_id, path.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "order": order })))
}
