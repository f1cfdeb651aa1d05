//! Server setup and lifecycle management

use crate::collab::{Collaborators, InMemoryDirectory, LoopbackConnector};
use crate::config::DaemonConfig;
use crate::error::DaemonResult;
use crate::supervisor::Supervisor;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Spacegate daemon server
pub struct Server {
    config: DaemonConfig,
    directory: Arc<InMemoryDirectory>,
    connector: Arc<LoopbackConnector>,
    supervisor: Arc<Supervisor>,
    discover_rx: mpsc::Receiver<()>,
}

impl Server {
    /// Create a new server with the given configuration
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        // Create directory
        let directory = match config.seed_path() {
            Some(path) => Arc::new(InMemoryDirectory::load_seed(path).await?),
            None => Arc::new(InMemoryDirectory::new()),
        };

        let connector = Arc::new(LoopbackConnector::new(config.scheduler.inbox_capacity));
        let collaborators = Collaborators::in_memory(directory.clone(), connector.clone());

        // Create supervisor
        let (supervisor, discover_rx) = Supervisor::new(
            config.scheduler.clone(),
            config.access.clone(),
            collaborators,
        );

        Ok(Self {
            config,
            directory,
            connector,
            supervisor,
            discover_rx,
        })
    }

    pub fn directory(&self) -> &Arc<InMemoryDirectory> {
        &self.directory
    }

    pub fn connector(&self) -> &Arc<LoopbackConnector> {
        &self.connector
    }

    pub fn supervisor(&self) -> &Arc<Supervisor> {
        &self.supervisor
    }

    /// Run until a shutdown signal arrives
    pub async fn run(self) -> DaemonResult<()> {
        tracing::info!(
            service = %self.config.access.service_name,
            history_capacity = self.config.access.history_capacity,
            default_wall_thickness = self.config.access.default_wall_thickness,
            "Spacegate daemon starting"
        );

        // Start supervisor in background
        let supervisor = self.supervisor.clone();
        let supervisor_task = tokio::spawn(supervisor.start(self.discover_rx));

        shutdown_signal().await;

        tracing::info!("Spacegate daemon shutting down");

        // Stop supervisor and drain sessions
        self.supervisor.stop().await;
        if let Err(e) = supervisor_task.await {
            tracing::error!(error = %e, "Supervisor task failed");
        }

        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
