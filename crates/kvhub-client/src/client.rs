//! Client facade over a store backend, codec, and hook registry.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use kvhub_core::config::store::StoreConfig;
use kvhub_core::error::AppError;
use kvhub_core::result::AppResult;
use kvhub_core::traits::codec::Codec;
use kvhub_core::traits::store::Store;
use kvhub_core::types::HookId;
use kvhub_hooks::{EventKind, HookErrors, HookHandler, HookOptions, HooksRegistry, Unregister};
use kvhub_store::StoreManager;

use crate::codec::JsonCodec;

/// Key-value client.
///
/// Mutating operations notify registered hooks after the backend call
/// succeeds. Hook failures never fail the operation. Cloning is cheap and
/// clones share the same backend and hooks.
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    store: Arc<dyn Store>,
    codec: Arc<dyn Codec>,
    hooks: HooksRegistry,
}

impl Client {
    /// Creates a client over `store` using the JSON codec.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_codec(store, Arc::new(JsonCodec))
    }

    /// Creates a client over `store` with a custom codec.
    pub fn with_codec(store: Arc<dyn Store>, codec: Arc<dyn Codec>) -> Self {
        info!(codec = codec.name(), "KvHub client created");
        Self {
            inner: Arc::new(ClientInner {
                store,
                codec,
                hooks: HooksRegistry::new(),
            }),
        }
    }

    /// Creates a client over the backend named by configuration.
    pub async fn from_config(config: &StoreConfig) -> AppResult<Self> {
        let manager = StoreManager::new(config).await?;
        Ok(Self::new(manager.store()))
    }

    /// The underlying store backend.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.inner.store
    }

    /// The value codec.
    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.inner.codec
    }

    /// This client's hook registry.
    pub fn hooks(&self) -> &HooksRegistry {
        &self.inner.hooks
    }

    // ── Hooks ──────────────────────────────────────────────

    /// Registers a hook on this client's operations.
    ///
    /// Drain the returned [`HookErrors`] to observe hook failures; once 100
    /// are buffered further ones are dropped.
    pub async fn register_hook<H>(
        &self,
        handler: H,
        options: HookOptions,
    ) -> (HookId, HookErrors, Unregister)
    where
        H: HookHandler + 'static,
    {
        self.inner.hooks.register(handler, options).await
    }

    // ── Writes ─────────────────────────────────────────────

    /// Encodes `value` and stores it under `key`. Dispatches [`EventKind::Set`].
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> AppResult<()> {
        validate_key(key)?;
        let bytes = self.encode(value)?;
        self.inner.store.set(key, bytes.clone()).await?;
        self.inner
            .hooks
            .dispatch(EventKind::Set, key, Some(bytes))
            .await;
        Ok(())
    }

    /// Stores raw bytes under `key`. Dispatches [`EventKind::SetRaw`].
    pub async fn set_raw(&self, key: &str, value: impl Into<Bytes>) -> AppResult<()> {
        validate_key(key)?;
        let bytes = value.into();
        self.inner.store.set(key, bytes.clone()).await?;
        self.inner
            .hooks
            .dispatch(EventKind::SetRaw, key, Some(bytes))
            .await;
        Ok(())
    }

    /// Deletes `key`. Dispatches [`EventKind::Delete`].
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        validate_key(key)?;
        self.inner.store.delete(key).await?;
        self.inner.hooks.dispatch(EventKind::Delete, key, None).await;
        Ok(())
    }

    /// Stores several values. Dispatches one [`EventKind::BatchSet`] per key.
    ///
    /// Uses the backend's batch capability when it has one, otherwise
    /// stores the items one by one.
    pub async fn batch_set<I, K, T>(&self, items: I) -> AppResult<()>
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Serialize,
    {
        let mut encoded = Vec::new();
        for (key, value) in items {
            let key = key.into();
            validate_key(&key)?;
            let bytes = self.encode(&value)?;
            encoded.push((key, bytes));
        }
        if encoded.is_empty() {
            return Ok(());
        }

        match self.inner.store.as_batch() {
            Some(batch) => batch.batch_set(encoded.clone()).await?,
            None => {
                debug!(
                    count = encoded.len(),
                    "Store has no batch support, setting keys one by one"
                );
                for (key, bytes) in &encoded {
                    self.inner.store.set(key, bytes.clone()).await?;
                }
            }
        }

        for (key, bytes) in encoded {
            self.inner
                .hooks
                .dispatch(EventKind::BatchSet, &key, Some(bytes))
                .await;
        }
        Ok(())
    }

    /// Deletes several keys. Dispatches one [`EventKind::BatchDelete`] per key.
    pub async fn batch_delete(&self, keys: &[String]) -> AppResult<()> {
        for key in keys {
            validate_key(key)?;
        }
        if keys.is_empty() {
            return Ok(());
        }

        match self.inner.store.as_batch() {
            Some(batch) => batch.batch_delete(keys).await?,
            None => {
                for key in keys {
                    self.inner.store.delete(key).await?;
                }
            }
        }

        for key in keys {
            self.inner
                .hooks
                .dispatch(EventKind::BatchDelete, key, None)
                .await;
        }
        Ok(())
    }

    // ── Reads ──────────────────────────────────────────────

    /// Gets and decodes the value under `key`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        match self.get_raw(key).await? {
            Some(bytes) => Ok(Some(self.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Gets the raw bytes under `key`.
    pub async fn get_raw(&self, key: &str) -> AppResult<Option<Bytes>> {
        validate_key(key)?;
        self.inner.store.get_raw(key).await
    }

    /// Lists keys starting with `prefix`.
    pub async fn list(&self, prefix: &str) -> AppResult<Vec<String>> {
        self.inner.store.list(prefix).await
    }

    /// Gets and decodes several values, positionally.
    pub async fn batch_get<T: DeserializeOwned>(
        &self,
        keys: &[String],
    ) -> AppResult<Vec<Option<T>>> {
        for key in keys {
            validate_key(key)?;
        }

        let raw = match self.inner.store.as_batch() {
            Some(batch) => batch.batch_get(keys).await?,
            None => {
                let mut values = Vec::with_capacity(keys.len());
                for key in keys {
                    values.push(self.inner.store.get_raw(key).await?);
                }
                values
            }
        };

        raw.into_iter()
            .map(|bytes| bytes.map(|b| self.decode(&b)).transpose())
            .collect()
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> AppResult<Bytes> {
        let value = serde_json::to_value(value)?;
        self.inner.codec.encode(&value)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> AppResult<T> {
        let value = self.inner.codec.decode(bytes)?;
        Ok(serde_json::from_value(value)?)
    }
}

fn validate_key(key: &str) -> AppResult<()> {
    if key.is_empty() {
        return Err(AppError::validation("Key must not be empty"));
    }
    Ok(())
}
