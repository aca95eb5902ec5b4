//! Health monitor configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Periodic health monitoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Seconds between the end of one health tick and the start of the next.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
}

impl HealthConfig {
    /// Returns the configured interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
        }
    }
}

fn default_interval() -> u64 {
    60
}
