//! Configuration for spacegate-daemon

use serde::{Deserialize, Serialize};
use spacegate_access::{AccessConfig, DeploymentProfile};
use std::path::PathBuf;
use std::time::Duration;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Access engine configuration, shared by every space
    #[serde(default)]
    pub access: AccessConfig,

    /// Scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Directory configuration
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Space discovery interval in seconds
    #[serde(default = "default_discovery_interval")]
    pub discovery_interval_secs: u64,

    /// Recheck queue polling interval in milliseconds
    #[serde(default = "default_recheck_interval")]
    pub recheck_interval_ms: u64,

    /// How long a stopping session may take to drain, in seconds
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_secs: u64,

    /// Capacity of each space's inbox
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            discovery_interval_secs: default_discovery_interval(),
            recheck_interval_ms: default_recheck_interval(),
            drain_timeout_secs: default_drain_timeout(),
            inbox_capacity: default_inbox_capacity(),
        }
    }
}

impl SchedulerConfig {
    pub fn discovery_interval(&self) -> Duration {
        Duration::from_secs(self.discovery_interval_secs)
    }

    pub fn recheck_interval(&self) -> Duration {
        Duration::from_millis(self.recheck_interval_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

/// Directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DirectoryConfig {
    /// In-memory directory, optionally seeded from a JSON file
    Memory {
        #[serde(default)]
        seed: Option<PathBuf>,
    },
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        DirectoryConfig::Memory { seed: None }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_discovery_interval() -> u64 {
    60
}

fn default_recheck_interval() -> u64 {
    1000
}

fn default_drain_timeout() -> u64 {
    5
}

fn default_inbox_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration from file
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with SPACEGATE_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("SPACEGATE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Configuration tuned for a deployment profile
    pub fn for_profile(profile: DeploymentProfile) -> Self {
        Self {
            access: AccessConfig::for_profile(profile),
            ..Default::default()
        }
    }

    /// Seed file of the in-memory directory, if any
    pub fn seed_path(&self) -> Option<&PathBuf> {
        match &self.directory {
            DirectoryConfig::Memory { seed } => seed.as_ref(),
        }
    }
}
