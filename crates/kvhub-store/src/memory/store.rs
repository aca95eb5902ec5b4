//! In-memory store implementation using the moka crate.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use moka::future::Cache;
use tracing::debug;

use kvhub_core::config::store::MemoryStoreConfig;
use kvhub_core::result::AppResult;
use kvhub_core::traits::store::{BatchStore, HealthChecker, Store};

/// In-memory store backed by a moka cache, unbounded unless configured.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    /// The underlying moka cache.
    cache: Cache<String, Bytes>,
}

impl MemoryStore {
    /// Create a new in-memory store from configuration.
    pub fn new(config: &MemoryStoreConfig) -> Self {
        let mut builder = Cache::builder();
        if config.max_capacity > 0 {
            builder = builder.max_capacity(config.max_capacity);
        }
        if config.time_to_live_seconds > 0 {
            builder = builder.time_to_live(Duration::from_secs(config.time_to_live_seconds));
        }

        Self {
            cache: builder.build(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(&MemoryStoreConfig::default())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn set(&self, key: &str, value: Bytes) -> AppResult<()> {
        self.cache.insert(key.to_string(), value).await;
        Ok(())
    }

    async fn get_raw(&self, key: &str) -> AppResult<Option<Bytes>> {
        Ok(self.cache.get(key).await)
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key).await;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<String>> {
        // Moka has no ordered index, so listing is a full scan.
        let mut keys: Vec<String> = self
            .cache
            .iter()
            .filter(|entry| entry.0.starts_with(prefix))
            .map(|entry| entry.0.to_string())
            .collect();
        keys.sort();

        debug!(prefix, count = keys.len(), "Listed keys");
        Ok(keys)
    }

    fn as_batch(&self) -> Option<&dyn BatchStore> {
        Some(self)
    }

    fn as_health(&self) -> Option<&dyn HealthChecker> {
        Some(self)
    }
}

#[async_trait]
impl BatchStore for MemoryStore {
    async fn batch_set(&self, items: Vec<(String, Bytes)>) -> AppResult<()> {
        for (key, value) in items {
            self.cache.insert(key, value).await;
        }
        Ok(())
    }

    async fn batch_get(&self, keys: &[String]) -> AppResult<Vec<Option<Bytes>>> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.cache.get(key).await);
        }
        Ok(values)
    }

    async fn batch_delete(&self, keys: &[String]) -> AppResult<()> {
        for key in keys {
            self.cache.remove(key).await;
        }
        Ok(())
    }
}

#[async_trait]
impl HealthChecker for MemoryStore {
    async fn health(&self) -> AppResult<()> {
        Ok(())
    }
}
