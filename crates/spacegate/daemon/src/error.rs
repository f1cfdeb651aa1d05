//! Error types for spacegate-daemon

use spacegate_access::AccessError;
use spacegate_types::SpaceId;
use thiserror::Error;

/// Failures of a world session.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The session could not be established.
    #[error("failed to connect to {space_id}: {reason}")]
    Connect { space_id: SpaceId, reason: String },

    /// The session is gone; further actions are dropped.
    #[error("session for {0} is closed")]
    Closed(SpaceId),

    /// A single action was rejected by the world.
    #[error("world rejected action: {0}")]
    Rejected(String),
}

/// Daemon errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// World transport error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Access engine error
    #[error("Access error: {0}")]
    Access(#[from] AccessError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for DaemonError {
    fn from(e: config::ConfigError) -> Self {
        DaemonError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for DaemonError {
    fn from(e: serde_json::Error) -> Self {
        DaemonError::Config(e.to_string())
    }
}

/// Result type for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
