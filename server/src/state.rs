// shopflow_server/src/state.rs

use crate::config::{AppConfig, GatewayKind, StoreBackend};
use crate::db::{self, PgStore};
use crate::errors::{AppError, Result};
use crate::services::{EmailNotifier, HttpGateway};
use shopflow::catalog::CatalogStore;
use shopflow::coupon::CouponStore;
use shopflow::payment::{MockGateway, PaymentGateway};
use shopflow::store::{MemoryStore, OrderStore};
use shopflow::{OrderEngine, Services};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
  pub engine: Arc<OrderEngine>,
  pub config: Arc<AppConfig>,
}

/// One value implementing all three store traits.
trait CommerceStore: CatalogStore + CouponStore + OrderStore {}
impl<T: CatalogStore + CouponStore + OrderStore> CommerceStore for T {}

fn services_over<S: CommerceStore + 'static>(
  store: Arc<S>,
  gateway: Arc<dyn PaymentGateway>,
  config: &AppConfig,
) -> Services {
  Services {
    catalog: store.clone(),
    coupons: store.clone(),
    orders: store,
    gateway,
    notifier: Arc::new(EmailNotifier::new(config.notify_sender.clone())),
    config: Arc::new(config.engine_config()),
  }
}

fn gateway_for(config: &AppConfig) -> Result<Arc<dyn PaymentGateway>> {
  match config.payment_gateway {
    GatewayKind::Mock => Ok(Arc::new(MockGateway::default())),
    GatewayKind::Http => {
      let url = config
        .payment_gateway_url
        .as_deref()
        .ok_or_else(|| AppError::Config("PAYMENT_GATEWAY_URL is required for the http gateway".to_string()))?;
      let gateway = HttpGateway::new(
        url,
        config.payment_key_id.clone(),
        config.payment_key_secret.clone(),
        config.gateway_timeout,
      )?;
      Ok(Arc::new(gateway))
    }
  }
}

impl AppState {
  pub fn new(services: Services, config: Arc<AppConfig>) -> Self {
    Self {
      engine: Arc::new(OrderEngine::new(services)),
      config,
    }
  }

  /// Wires the configured store backend and gateway. For Postgres this
  /// connects, applies the schema and optionally seeds.
  pub async fn build(config: Arc<AppConfig>) -> Result<Self> {
    let gateway = gateway_for(&config)?;

    let services = match config.store_backend {
      StoreBackend::Postgres => {
        let url = config
          .database_url
          .as_deref()
          .ok_or_else(|| AppError::Config("DATABASE_URL is required for the postgres backend".to_string()))?;
        let pool = db::connect(url).await?;
        db::apply_schema(&pool).await?;
        services_over(Arc::new(PgStore::new(pool)), gateway, &config)
      }
      StoreBackend::Memory => {
        info!("Using the in-memory store; data is lost on restart.");
        services_over(Arc::new(MemoryStore::new()), gateway, &config)
      }
    };

    if config.seed_db {
      db::seed::seed(services.catalog.as_ref(), services.coupons.as_ref()).await?;
    }

    Ok(Self::new(services, config))
  }
}
