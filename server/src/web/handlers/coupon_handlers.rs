// shopflow_server/src/web/handlers/coupon_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use shopflow::coupon::{CouponDraft, CouponPatch};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};

#[derive(Debug, Deserialize)]
pub struct ValidateCouponPayload {
  pub code: String,
}

#[instrument(name = "handler::validate_coupon", skip(app_state, user, payload), fields(user_id = %user.user_id))]
pub async fn validate_coupon_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<ValidateCouponPayload>,
) -> Result<HttpResponse, AppError> {
  if payload.code.trim().is_empty() {
    return Err(AppError::validation("Validation error: code is required"));
  }
  let quote = app_state.engine.validate_coupon(&payload.code).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "data": quote })))
}

#[instrument(name = "handler::create_coupon", skip(app_state, admin, payload), fields(admin_id = %admin.0.user_id))]
pub async fn create_coupon_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  payload: web::Json<CouponDraft>,
) -> Result<HttpResponse, AppError> {
  let coupon = app_state.engine.create_coupon(payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(json!({ "success": true, "data": coupon })))
}

pub async fn list_coupons_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  let coupons = app_state.engine.list_coupons().await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "data": coupons })))
}

pub async fn get_coupon_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let coupon = app_state.engine.coupon(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "data": coupon })))
}

#[instrument(name = "handler::update_coupon", skip(app_state, admin, payload), fields(admin_id = %admin.0.user_id))]
pub async fn update_coupon_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<CouponPatch>,
) -> Result<HttpResponse, AppError> {
  let coupon = app_state
    .engine
    .update_coupon(path.into_inner(), payload.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "data": coupon })))
}

#[instrument(name = "handler::delete_coupon", skip(app_state, admin), fields(admin_id = %admin.0.user_id))]
pub async fn delete_coupon_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  app_state.engine.delete_coupon(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Coupon deleted" })))
}
