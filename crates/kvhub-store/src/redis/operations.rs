//! Redis store implementation.

use async_trait::async_trait;
use bytes::Bytes;
use redis::AsyncCommands;
use tracing::debug;

use kvhub_core::error::{AppError, ErrorKind};
use kvhub_core::result::AppResult;
use kvhub_core::traits::store::{BatchStore, HealthChecker, Store};

use super::client::RedisClient;

/// Redis-backed store.
#[derive(Debug, Clone)]
pub struct RedisStore {
    /// Redis client.
    client: RedisClient,
    /// `COUNT` hint for `SCAN`.
    scan_count: usize,
}

impl RedisStore {
    /// Create a new Redis store.
    pub fn new(client: RedisClient, scan_count: usize) -> Self {
        Self { client, scan_count }
    }

    /// Map a Redis error to an AppError.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Store, format!("Redis error: {e}"), e)
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn set(&self, key: &str, value: Bytes) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let _: () = conn
            .set(&full_key, value.as_ref())
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn get_raw(&self, key: &str) -> AppResult<Option<Bytes>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let result: Option<Vec<u8>> = conn.get(&full_key).await.map_err(Self::map_err)?;
        Ok(result.map(Bytes::from))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let _: () = conn.del(&full_key).await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<String>> {
        let pattern = self.client.scan_pattern(prefix);
        let mut conn = self.client.conn_mut();

        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(self.scan_count)
                .query_async(&mut conn)
                .await
                .map_err(Self::map_err)?;

            keys.extend(
                batch
                    .iter()
                    .map(|full_key| self.client.strip_prefix(full_key).to_string()),
            );

            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once.
        keys.sort();
        keys.dedup();

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
impl BatchStore for RedisStore {
    async fn batch_set(&self, items: Vec<(String, Bytes)>) -> AppResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        let pairs: Vec<(String, Vec<u8>)> = items
            .into_iter()
            .map(|(key, value)| (self.client.prefixed_key(&key), value.to_vec()))
            .collect();

        let mut conn = self.client.conn_mut();
        let _: () = conn.mset(&pairs).await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn batch_get(&self, keys: &[String]) -> AppResult<Vec<Option<Bytes>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let full_keys: Vec<String> = keys.iter().map(|k| self.client.prefixed_key(k)).collect();

        // Plain MGET, so a single key still comes back as a one-element list.
        let mut conn = self.client.conn_mut();
        let values: Vec<Option<Vec<u8>>> = redis::cmd("MGET")
            .arg(&full_keys)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        Ok(values.into_iter().map(|v| v.map(Bytes::from)).collect())
    }

    async fn batch_delete(&self, keys: &[String]) -> AppResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let full_keys: Vec<String> = keys.iter().map(|k| self.client.prefixed_key(k)).collect();
        let mut conn = self.client.conn_mut();
        let _: () = conn.del(&full_keys).await.map_err(Self::map_err)?;
        Ok(())
    }
}

#[async_trait]
impl HealthChecker for RedisStore {
    async fn health(&self) -> AppResult<()> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(AppError::service_unavailable(format!(
                "Unexpected PING reply from Redis: {pong}"
            )))
        }
    }
}
