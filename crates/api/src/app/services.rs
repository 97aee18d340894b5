//! Service wiring: which hash store backs the repository.
//!
//! The store handle is acquired once here and owned by [`AppServices`]; handlers
//! reach it through an `Extension<Arc<AppServices>>`. Dropping the last
//! `AppServices` releases the connection.

use std::sync::Arc;

use registry_infra::config::{AppConfig, StoreBackend};
use registry_infra::residents::ResidentRepository;
use registry_infra::store::{HashStore, InMemoryHashStore, StoreError};

pub type SharedStore = Arc<dyn HashStore>;

pub struct AppServices {
    residents: ResidentRepository<SharedStore>,
}

impl AppServices {
    pub fn new(store: SharedStore) -> Self {
        Self {
            residents: ResidentRepository::new(store),
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryHashStore::new()))
    }

    pub fn residents(&self) -> &ResidentRepository<SharedStore> {
        &self.residents
    }
}

/// Open the configured store and check that it answers before serving.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    let store = match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("RESIDENT_STORE=memory; residents are lost on exit");
            Arc::new(InMemoryHashStore::new()) as SharedStore
        }
        StoreBackend::Redis => connect_redis(&config.redis_url).await?,
    };

    store.ping().await?;
    Ok(AppServices::new(store))
}

#[cfg(feature = "redis")]
async fn connect_redis(redis_url: &str) -> Result<SharedStore, StoreError> {
    let store = registry_infra::store::RedisHashStore::connect(redis_url).await?;
    tracing::info!("connected to redis");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "redis"))]
async fn connect_redis(_redis_url: &str) -> Result<SharedStore, StoreError> {
    Err(StoreError::Connection(
        "built without the `redis` feature; set RESIDENT_STORE=memory".to_string(),
    ))
}
