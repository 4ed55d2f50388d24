// shopflow_server/src/web/handlers/admin_order_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use shopflow::order::{OrderFilter, OrderStatus, PageRequest, PaymentStatus, ShipmentStatus, ShipmentUpdate};
use shopflow::workflows::PaymentStatusUpdate;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AdminUser;

/// Query string for the admin order listing. Kept flat because
/// `serde_urlencoded` cannot decode numbers through `#[serde(flatten)]`.
#[derive(Debug, Default, Deserialize)]
pub struct AdminOrderQuery {
  pub customer_id: Option<Uuid>,
  pub order_status: Option<OrderStatus>,
  pub payment_status: Option<PaymentStatus>,
  pub shipment_status: Option<ShipmentStatus>,
  pub created_from: Option<DateTime<Utc>>,
  pub created_to: Option<DateTime<Utc>>,
  pub page: Option<u32>,
  pub per_page: Option<u32>,
}

impl AdminOrderQuery {
  fn into_parts(self) -> (OrderFilter, PageRequest) {
    let defaults = PageRequest::default();
    let filter = OrderFilter {
      customer_id: self.customer_id,
      order_status: self.order_status,
      payment_status: self.payment_status,
      shipment_status: self.shipment_status,
      created_from: self.created_from,
      created_to: self.created_to,
    };
    let page = PageRequest {
      page: self.page.unwrap_or(defaults.page),
      per_page: self.per_page.unwrap_or(defaults.per_page),
    };
    (filter, page)
  }
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusPayload {
  pub status: OrderStatus,
}

#[instrument(name = "handler::admin_list_orders", skip(app_state, admin), fields(admin_id = %admin.0.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  query: web::Query<AdminOrderQuery>,
) -> Result<HttpResponse, AppError> {
  let (filter, page) = query.into_inner().into_parts();
  let page = app_state.engine.list_orders(&filter, page).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page })))
}

#[instrument(name = "handler::admin_get_order", skip(app_state, admin), fields(admin_id = %admin.0.user_id))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.engine.order(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "order": order })))
}

#[instrument(
  name = "handler::admin_update_payment_status",
  skip(app_state, admin, payload),
  fields(admin_id = %admin.0.user_id, payment_status = payload.payment_status.as_str())
)]
pub async fn update_payment_status_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<PaymentStatusUpdate>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .engine
    .update_payment_status(path.into_inner(), payload.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": "Payment status updated",
    "order": order,
  })))
}

#[instrument(
  name = "handler::admin_update_order_status",
  skip(app_state, admin, payload),
  fields(admin_id = %admin.0.user_id, target = %payload.status)
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<OrderStatusPayload>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .engine
    .update_order_status(path.into_inner(), payload.status)
    .await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": format!("Order status updated to {}", order.order_status),
    "order": order,
  })))
}

#[instrument(name = "handler::admin_update_shipment", skip(app_state, admin, payload), fields(admin_id = %admin.0.user_id))]
pub async fn update_shipment_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<ShipmentUpdate>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .engine
    .update_shipment(path.into_inner(), payload.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": "Shipment details updated",
    "order": order,
  })))
}
