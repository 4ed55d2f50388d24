// shopflow_server/src/web/handlers/mod.rs

pub mod admin_order_handlers;
pub mod coupon_handlers;
pub mod order_handlers;
