// shopflow_server/src/web/routes.rs

use actix_web::{error, web, HttpResponse};
use serde_json::json;

use super::handlers::{admin_order_handlers, coupon_handlers, order_handlers};
use crate::errors::AppError;
use crate::state::AppState;

async fn health_check_handler(app_state: web::Data<AppState>) -> HttpResponse {
  HttpResponse::Ok().json(json!({
    "status": "ok",
    "store": app_state.config.store_backend.as_str(),
  }))
}

/// Body, query and path decode failures share the validation envelope.
fn decode_error(detail: impl std::fmt::Display) -> error::Error {
  AppError::validation(format!("Validation error: {detail}")).into()
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(|err, _req| decode_error(err)))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| decode_error(err)))
    .app_data(web::PathConfig::default().error_handler(|err, _req| decode_error(err)));

  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      // Customer
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::place_order_handler))
          .route("", web::get().to(order_handlers::list_my_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_my_order_handler)),
      )
      .route("/payments/verify", web::post().to(order_handlers::verify_payment_handler))
      .route(
        "/payments/status/{payment_id}",
        web::get().to(order_handlers::payment_status_handler),
      )
      .route("/coupons/validate", web::post().to(coupon_handlers::validate_coupon_handler))
      // Admin
      .service(
        web::scope("/admin")
          .service(
            web::scope("/orders")
              .route("", web::get().to(admin_order_handlers::list_orders_handler))
              .route("/{order_id}", web::get().to(admin_order_handlers::get_order_handler))
              .route(
                "/{order_id}/status",
                web::patch().to(admin_order_handlers::update_order_status_handler),
              )
              .route(
                "/{order_id}/payment-status",
                web::patch().to(admin_order_handlers::update_payment_status_handler),
              )
              .route(
                "/{order_id}/shipment",
                web::patch().to(admin_order_handlers::update_shipment_handler),
              ),
          )
          .service(
            web::scope("/coupons")
              .route("", web::get().to(coupon_handlers::list_coupons_handler))
              .route("", web::post().to(coupon_handlers::create_coupon_handler))
              .route("/{coupon_id}", web::get().to(coupon_handlers::get_coupon_handler))
              .route("/{coupon_id}", web::patch().to(coupon_handlers::update_coupon_handler))
              .route("/{coupon_id}", web::delete().to(coupon_handlers::delete_coupon_handler)),
          ),
      ),
  );
}
