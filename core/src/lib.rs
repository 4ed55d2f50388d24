// shopflow/src/lib.rs

//! Shopflow: order placement and payment reconciliation for a storefront
//! backend.
//!
//! The crate has two layers:
//!  - a small asynchronous step pipeline (`pipeline`, `registry`): named steps
//!    with before/on/after handlers, optional steps, skip conditions and
//!    shared `ContextData`, dispatched by context type;
//!  - the commerce domain built on it: pricing, coupons, the order aggregate
//!    and its status rules, gateway intents and signed callbacks, and the
//!    store traits that make payment settlement atomic.
//!
//! `OrderEngine` ties the two together and is what an HTTP layer calls.

pub mod catalog;
pub mod coupon;
pub mod engine;
pub mod error;
pub mod money;
pub mod notify;
pub mod order;
pub mod payment;
pub mod pipeline;
pub mod pricing;
pub mod registry;
pub mod store;
pub mod workflows;

pub use crate::engine::{CouponView, OrderEngine};
pub use crate::error::{CommerceError, PipelineError, PipelineResult, Result};
pub use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineOutcome};
pub use crate::registry::Registry;
pub use crate::workflows::{EngineConfig, Services};
