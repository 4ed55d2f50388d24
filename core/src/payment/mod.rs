pub mod gateway;
pub mod signature;

pub use gateway::{
  create_intent_bounded, fetch_payment_bounded, GatewayIntent, GatewayPayment, IntentRequest, MockGateway, PaymentGateway,
};
