//! Spacegate Daemon - region access control for virtual spaces
//!
//! The daemon provides:
//! - Discovery of monitored spaces from the directory
//! - One access-enforcing session per space
//! - Recheck polling for permission changes

use clap::Parser;
use spacegate_access::DeploymentProfile;
use spacegate_daemon::config::{DaemonConfig, DirectoryConfig};
use spacegate_daemon::error::{DaemonError, DaemonResult};
use spacegate_daemon::server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Spacegate Daemon CLI
#[derive(Parser)]
#[command(name = "spacegated")]
#[command(about = "Spacegate Daemon - Region access control for virtual spaces", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SPACEGATE_CONFIG")]
    config: Option<String>,

    /// Directory seed file (JSON)
    #[arg(short, long, env = "SPACEGATE_SEED")]
    seed: Option<String>,

    /// Deployment profile (locked-spaces, token-room)
    #[arg(short, long, env = "SPACEGATE_PROFILE")]
    profile: Option<String>,

    /// Log level (overrides the configured level)
    #[arg(long, env = "SPACEGATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "SPACEGATE_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Initialize tracing
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into());

    if cli.json || config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Override with CLI args
    if let Some(profile) = cli.profile.as_deref() {
        let profile = match profile.to_lowercase().as_str() {
            "locked-spaces" | "locked_spaces" => DeploymentProfile::LockedSpaces,
            "token-room" | "token_room" => DeploymentProfile::TokenRoom,
            other => {
                return Err(DaemonError::Config(format!(
                    "Unknown deployment profile: {}",
                    other
                )));
            }
        };
        let service_name = config.access.service_name.clone();
        let lookup_timeout_ms = config.access.lookup_timeout_ms;
        config.access = spacegate_access::AccessConfig::for_profile(profile);
        config.access.service_name = service_name;
        config.access.lookup_timeout_ms = lookup_timeout_ms;
    }

    if let Some(seed) = cli.seed {
        config.directory = DirectoryConfig::Memory {
            seed: Some(seed.into()),
        };
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        seed = ?config.seed_path(),
        "Spacegate daemon configured"
    );

    // Create and run server
    let server = Server::new(config).await?;
    server.run().await
}
