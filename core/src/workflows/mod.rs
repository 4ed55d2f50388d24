//! Order placement and payment reconciliation expressed as pipelines.

pub mod checkout;
pub mod contexts;
pub mod reconcile;
pub mod requests;

pub use checkout::checkout_pipeline;
pub use contexts::{CheckoutCtx, EngineConfig, PaymentStatusCtx, Services, VerifyPaymentCtx};
pub use reconcile::{payment_status_pipeline, verify_payment_pipeline};
pub use requests::{CheckoutItem, CheckoutRequest, PaymentStatusUpdate, PlacedOrder, VerifyPaymentRequest};
