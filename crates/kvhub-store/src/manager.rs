//! Store manager that selects the configured backend.

use std::sync::Arc;

use tracing::info;

use kvhub_core::config::store::StoreConfig;
use kvhub_core::error::AppError;
use kvhub_core::result::AppResult;
use kvhub_core::traits::store::Store;

/// Builds the store backend named by configuration.
#[derive(Debug, Clone)]
pub struct StoreManager {
    /// The selected backend.
    inner: Arc<dyn Store>,
}

impl StoreManager {
    /// Create a store from configuration.
    pub async fn new(config: &StoreConfig) -> AppResult<Self> {
        let inner: Arc<dyn Store> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis store");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Arc::new(crate::redis::RedisStore::new(
                    client,
                    config.redis.scan_count,
                ))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!(
                    max_capacity = config.memory.max_capacity,
                    "Initializing in-memory store"
                );
                Arc::new(crate::memory::MemoryStore::new(&config.memory))
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown store provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Wrap an existing backend.
    pub fn from_store(store: Arc<dyn Store>) -> Self {
        Self { inner: store }
    }

    /// Shared handle to the selected backend.
    pub fn store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.inner)
    }
}
