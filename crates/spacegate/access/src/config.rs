//! Access engine configuration.
//!
//! One engine serves every deployment style. Profiles pick the wall and
//! history defaults for each.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Preset tunings for known deployment styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentProfile {
    /// Many spaces loaded from the directory, regions with their own walls.
    LockedSpaces,
    /// A single token-gated room with flush walls.
    TokenRoom,
}

/// Configuration for a space's access engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Service name used when resolving a player's linked wallet.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Wall thickness applied to regions that do not specify one.
    #[serde(default)]
    pub default_wall_thickness: i64,

    /// Number of legal positions remembered per player.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Upper bound on any single external lookup, in milliseconds.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            default_wall_thickness: 0,
            history_capacity: default_history_capacity(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

impl AccessConfig {
    /// Create config tuned for a deployment style.
    pub fn for_profile(profile: DeploymentProfile) -> Self {
        let mut config = Self::default();

        match profile {
            DeploymentProfile::LockedSpaces => {
                config.default_wall_thickness = 2;
                config.history_capacity = 3;
            }
            DeploymentProfile::TokenRoom => {
                config.default_wall_thickness = 0;
                config.history_capacity = 2;
            }
        }

        config
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_default_wall_thickness(mut self, thickness: i64) -> Self {
        self.default_wall_thickness = thickness;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

fn default_service_name() -> String {
    "gather".to_string()
}

fn default_history_capacity() -> usize {
    2
}

fn default_lookup_timeout_ms() -> u64 {
    5_000
}
