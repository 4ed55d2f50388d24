// shopflow_server/src/services/mod.rs

pub mod email_notifier;
pub mod http_gateway;

pub use email_notifier::EmailNotifier;
pub use http_gateway::HttpGateway;
