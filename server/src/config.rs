// shopflow_server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use shopflow::EngineConfig;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

impl StoreBackend {
  pub fn as_str(self) -> &'static str {
    match self {
      StoreBackend::Postgres => "postgres",
      StoreBackend::Memory => "memory",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayKind {
  Mock,
  Http,
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  pub database_url: Option<String>,
  pub seed_db: bool,

  pub payment_gateway: GatewayKind,
  pub payment_gateway_url: Option<String>,
  pub payment_key_id: String,
  pub payment_key_secret: String,
  pub payment_currency: String,
  pub gateway_timeout: Duration,

  pub notify_sender: String,
}

// Secrets stay out of logs.
impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("store_backend", &self.store_backend)
      .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
      .field("seed_db", &self.seed_db)
      .field("payment_gateway", &self.payment_gateway)
      .field("payment_gateway_url", &self.payment_gateway_url)
      .field("payment_key_id", &self.payment_key_id)
      .field("payment_key_secret", &"[REDACTED]")
      .field("payment_currency", &self.payment_currency)
      .field("gateway_timeout", &self.gateway_timeout)
      .field("notify_sender", &self.notify_sender)
      .finish()
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any key lookup; `from_env` passes the process
  /// environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
    let require = |name: &str| {
      lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{name}'")))
    };

    let server_host = get_or("SERVER_HOST", "127.0.0.1");
    let server_port = get_or("SERVER_PORT", "8080")
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {e}")))?;

    let store_backend = match get_or("STORE_BACKEND", "postgres").to_lowercase().as_str() {
      "postgres" => StoreBackend::Postgres,
      "memory" => StoreBackend::Memory,
      other => return Err(AppError::Config(format!("Invalid STORE_BACKEND: {other}"))),
    };
    let database_url = match store_backend {
      StoreBackend::Postgres => Some(require("DATABASE_URL")?),
      StoreBackend::Memory => lookup("DATABASE_URL"),
    };
    let seed_db = get_or("SEED_DB", "false")
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SEED_DB value: {e}")))?;

    let payment_gateway = match get_or("PAYMENT_GATEWAY", "mock").to_lowercase().as_str() {
      "mock" => GatewayKind::Mock,
      "http" => GatewayKind::Http,
      other => return Err(AppError::Config(format!("Invalid PAYMENT_GATEWAY: {other}"))),
    };
    let payment_gateway_url = match payment_gateway {
      GatewayKind::Http => Some(require("PAYMENT_GATEWAY_URL")?),
      GatewayKind::Mock => lookup("PAYMENT_GATEWAY_URL"),
    };
    let payment_key_id = get_or("PAYMENT_KEY_ID", "");
    let payment_key_secret = require("PAYMENT_KEY_SECRET")?;
    let payment_currency = get_or("PAYMENT_CURRENCY", "INR").to_uppercase();
    let gateway_timeout_ms = get_or("GATEWAY_TIMEOUT_MS", "10000")
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid GATEWAY_TIMEOUT_MS: {e}")))?;
    if gateway_timeout_ms == 0 {
      return Err(AppError::Config("GATEWAY_TIMEOUT_MS must be positive".to_string()));
    }
    let notify_sender = get_or("NOTIFY_SENDER", "noreply@example.com");

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      seed_db,
      payment_gateway,
      payment_gateway_url,
      payment_key_id,
      payment_key_secret,
      payment_currency,
      gateway_timeout: Duration::from_millis(gateway_timeout_ms),
      notify_sender,
    })
  }

  pub fn engine_config(&self) -> EngineConfig {
    EngineConfig {
      currency: self.payment_currency.clone(),
      payment_secret: self.payment_key_secret.clone(),
      gateway_timeout: self.gateway_timeout,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name| map.get(name).cloned()
  }

  #[test]
  fn memory_backend_needs_only_the_secret() {
    let cfg = AppConfig::from_lookup(lookup(&[("STORE_BACKEND", "memory"), ("PAYMENT_KEY_SECRET", "s")])).unwrap();
    assert_eq!(cfg.store_backend, StoreBackend::Memory);
    assert_eq!(cfg.server_port, 8080);
    assert_eq!(cfg.payment_currency, "INR");
    assert_eq!(cfg.gateway_timeout, Duration::from_secs(10));
    assert_eq!(cfg.payment_gateway, GatewayKind::Mock);
  }

  #[test]
  fn postgres_requires_database_url() {
    let err = AppConfig::from_lookup(lookup(&[("PAYMENT_KEY_SECRET", "s")])).unwrap_err();
    assert!(err.to_string().contains("DATABASE_URL"));
  }

  #[test]
  fn missing_secret_is_rejected() {
    assert!(AppConfig::from_lookup(lookup(&[("STORE_BACKEND", "memory")])).is_err());
  }

  #[test]
  fn http_gateway_requires_url_and_bad_values_fail() {
    assert!(AppConfig::from_lookup(lookup(&[
      ("STORE_BACKEND", "memory"),
      ("PAYMENT_KEY_SECRET", "s"),
      ("PAYMENT_GATEWAY", "http"),
    ]))
    .is_err());
    assert!(AppConfig::from_lookup(lookup(&[
      ("STORE_BACKEND", "memory"),
      ("PAYMENT_KEY_SECRET", "s"),
      ("SERVER_PORT", "eighty"),
    ]))
    .is_err());
  }

  #[test]
  fn debug_output_redacts_secrets() {
    let cfg = AppConfig::from_lookup(lookup(&[
      ("STORE_BACKEND", "memory"),
      ("PAYMENT_KEY_SECRET", "super-secret"),
      ("DATABASE_URL", "postgres://user:pw@host/db"),
    ]))
    .unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(!rendered.contains("pw@host"));
  }
}
