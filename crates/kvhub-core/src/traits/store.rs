//! Store capability traits for pluggable key-value backends.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Base capability every key-value backend provides (Redis, in-memory, ...).
///
/// Values are opaque bytes; encoding is the caller's concern. Optional
/// capabilities are discovered through [`Store::as_batch`] and
/// [`Store::as_health`] rather than by downcasting.
#[async_trait]
pub trait Store: Send + Sync + std::fmt::Debug + 'static {
    /// Store raw bytes under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Bytes) -> AppResult<()>;

    /// Get the raw bytes for `key`. Returns `None` if the key does not exist.
    async fn get_raw(&self, key: &str) -> AppResult<Option<Bytes>>;

    /// Delete `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// List all keys starting with `prefix`.
    async fn list(&self, prefix: &str) -> AppResult<Vec<String>>;

    /// Returns the batch capability, if this backend has one.
    fn as_batch(&self) -> Option<&dyn BatchStore> {
        None
    }

    /// Returns the health-check capability, if this backend has one.
    fn as_health(&self) -> Option<&dyn HealthChecker> {
        None
    }
}

/// Optional multi-key operations.
#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Store every `(key, value)` pair.
    async fn batch_set(&self, items: Vec<(String, Bytes)>) -> AppResult<()>;

    /// Get values for `keys`, positionally. Missing keys yield `None`.
    async fn batch_get(&self, keys: &[String]) -> AppResult<Vec<Option<Bytes>>>;

    /// Delete every key in `keys`.
    async fn batch_delete(&self, keys: &[String]) -> AppResult<()>;
}

/// Optional liveness probe.
#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// Returns `Ok(())` when the backend is reachable and serving.
    async fn health(&self) -> AppResult<()>;
}
