//! Store backend configuration.

use serde::{Deserialize, Serialize};

/// Top-level store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend type: `"memory"` or `"redis"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Redis-specific configuration.
    #[serde(default)]
    pub redis: RedisStoreConfig,
    /// In-memory configuration.
    #[serde(default)]
    pub memory: MemoryStoreConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            redis: RedisStoreConfig::default(),
            memory: MemoryStoreConfig::default(),
        }
    }
}

/// Redis backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisStoreConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Prefix applied to every key written through this store.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// `COUNT` hint passed to `SCAN` when listing keys.
    #[serde(default = "default_scan_count")]
    pub scan_count: usize,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
            scan_count: default_scan_count(),
        }
    }
}

/// In-memory backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStoreConfig {
    /// Maximum number of entries held. `0` leaves the store unbounded.
    ///
    /// When non-zero, entries beyond the limit are evicted in the
    /// background, possibly after `set` has returned and hooks have run.
    #[serde(default)]
    pub max_capacity: u64,
    /// Entry time-to-live in seconds. `0` keeps entries until evicted.
    #[serde(default)]
    pub time_to_live_seconds: u64,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_capacity: 0,
            time_to_live_seconds: 0,
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_key_prefix() -> String {
    "kvhub:".to_string()
}

fn default_scan_count() -> usize {
    500
}
