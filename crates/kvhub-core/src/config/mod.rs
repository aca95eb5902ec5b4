//! Configuration schemas.
//!
//! Deserialized from TOML files and `KVHUB__*` environment variables via
//! the `config` crate. Every field carries a serde default, so an empty
//! configuration is valid.

pub mod health;
pub mod logging;
pub mod store;

use serde::{Deserialize, Serialize};

use self::health::HealthConfig;
use self::logging::LoggingConfig;
use self::store::StoreConfig;

use crate::error::AppError;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KvConfig {
    /// Store backend settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Health monitor settings.
    #[serde(default)]
    pub health: HealthConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl KvConfig {
    /// Load configuration.
    ///
    /// Merges `config/default`, an environment-specific overlay
    /// `config/{env}`, and environment variables prefixed with `KVHUB__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("KVHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
