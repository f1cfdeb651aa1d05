//! Discovery loop and recheck polling

use crate::collab::{Collaborators, SpaceRecord};
use crate::config::SchedulerConfig;
use crate::error::DaemonResult;
use crate::session::{SessionHandle, SpaceSession};
use spacegate_access::{diff, AccessConfig, AccessEngine, PermissionResolver, SpaceDiff};
use spacegate_types::SpaceId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

/// Outcome of one recheck-queue pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecheckReport {
    /// Jobs applied by a running session
    pub delivered: usize,
    /// Malformed or unsupported jobs discarded
    pub discarded: usize,
    /// Jobs left pending because their space is not running, or stopped
    /// before applying them
    pub deferred: usize,
}

/// Keeps the set of running sessions in line with the directory
pub struct Supervisor {
    config: SchedulerConfig,
    access: AccessConfig,
    collaborators: Collaborators,
    sessions: RwLock<HashMap<SpaceId, SessionHandle>>,
    discover_tx: mpsc::Sender<()>,
    running: Arc<RwLock<bool>>,
    stopped: AtomicBool,
}

impl Supervisor {
    /// Create a new supervisor
    pub fn new(
        config: SchedulerConfig,
        access: AccessConfig,
        collaborators: Collaborators,
    ) -> (Arc<Self>, mpsc::Receiver<()>) {
        let (discover_tx, discover_rx) = mpsc::channel(10);

        let supervisor = Arc::new(Self {
            config,
            access,
            collaborators,
            sessions: RwLock::new(HashMap::new()),
            discover_tx,
            running: Arc::new(RwLock::new(false)),
            stopped: AtomicBool::new(false),
        });

        (supervisor, discover_rx)
    }

    /// Trigger an immediate discovery pass
    pub async fn trigger_discovery(&self) {
        let _ = self.discover_tx.send(()).await;
    }

    /// Ids of the spaces with a live session
    pub async fn running_spaces(&self) -> Vec<SpaceId> {
        let sessions = self.sessions.read().await;
        let mut ids: Vec<SpaceId> = sessions
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Start the supervisor background tasks
    pub async fn start(self: Arc<Self>, mut discover_rx: mpsc::Receiver<()>) {
        {
            let mut running = self.running.write().await;
            *running = true;
        }

        tracing::info!(
            discovery_interval_secs = self.config.discovery_interval_secs,
            recheck_interval_ms = self.config.recheck_interval_ms,
            "Supervisor started"
        );

        // Spawn discovery loop
        let discovery_supervisor = self.clone();
        let discovery_handle = tokio::spawn(async move {
            let mut interval = interval(discovery_supervisor.config.discovery_interval());

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    Some(_) = discover_rx.recv() => {
                        tracing::debug!("Discovery triggered");
                    }
                    else => break,
                }

                let running = discovery_supervisor.running.read().await;
                if !*running {
                    break;
                }
                drop(running);

                if let Err(e) = discovery_supervisor.discover().await {
                    tracing::error!(error = %e, "Discovery failed");
                }
            }
        });

        // Spawn recheck polling loop
        let recheck_supervisor = self.clone();
        let recheck_handle = tokio::spawn(async move {
            let mut interval = interval(recheck_supervisor.config.recheck_interval());

            loop {
                interval.tick().await;

                let running = recheck_supervisor.running.read().await;
                if !*running {
                    break;
                }
                drop(running);

                if let Err(e) = recheck_supervisor.drain_rechecks().await {
                    tracing::error!(error = %e, "Recheck polling failed");
                }
            }
        });

        // Wait for shutdown
        tokio::select! {
            _ = discovery_handle => {}
            _ = recheck_handle => {}
        }

        tracing::info!("Supervisor stopped");
    }

    /// Stop the supervisor and every running session
    pub async fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        {
            let mut running = self.running.write().await;
            *running = false;
        }
        // wake the discovery loop so it observes the flag
        let _ = self.discover_tx.try_send(());

        let sessions: Vec<SessionHandle> = {
            let mut sessions = self.sessions.write().await;
            sessions.drain().map(|(_, handle)| handle).collect()
        };

        let drain = self.config.drain_timeout();
        futures::future::join_all(sessions.into_iter().map(|handle| handle.shutdown(drain))).await;
    }

    /// Bring the running set in line with the directory
    pub async fn discover(&self) -> DaemonResult<SpaceDiff> {
        let records = self.collaborators.directory.list_spaces().await?;
        self.prune_finished().await;

        let running = self.running_spaces().await;
        let listed: Vec<SpaceId> = records.iter().map(|r| r.id.clone()).collect();
        let plan = diff(&listed, &running);

        if !plan.is_empty() {
            tracing::info!(
                to_start = plan.to_start.len(),
                to_stop = plan.to_stop.len(),
                "Reconciling spaces"
            );
        }

        for space_id in &plan.to_stop {
            self.stop_space(space_id).await;
        }

        for space_id in &plan.to_start {
            if let Some(record) = records.iter().find(|r| &r.id == space_id) {
                self.start_space(record).await;
            }
        }

        self.reload_changed(&records, &plan).await;

        Ok(plan)
    }

    /// Deliver pending recheck jobs to their sessions
    pub async fn drain_rechecks(&self) -> DaemonResult<RecheckReport> {
        let jobs = self.collaborators.queue.pending_jobs().await?;
        let mut report = RecheckReport::default();

        for job in jobs {
            let request = match job.request() {
                Ok(request) => request,
                Err(e) => {
                    tracing::warn!(job_id = %job.id, message = %job.message, error = %e, "Discarding recheck job");
                    self.collaborators.queue.mark_completed(&job.id).await?;
                    report.discarded += 1;
                    continue;
                }
            };

            let ack = {
                let sessions = self.sessions.read().await;
                match sessions.get(&request.space_id) {
                    Some(handle) if !handle.is_finished() => {
                        handle.recheck(request.player_id.clone()).await
                    }
                    _ => None,
                }
            };

            // completed only once the session has applied the recheck
            let applied = match ack {
                Some(ack) => ack.await.ok(),
                None => None,
            };

            if let Some(recomputed) = applied {
                let waited = chrono::Utc::now().signed_duration_since(job.requested_at);
                tracing::debug!(
                    job_id = %job.id,
                    waited_ms = waited.num_milliseconds(),
                    space_id = %request.space_id,
                    player_id = %request.player_id,
                    wallet = %request.wallet,
                    recomputed,
                    "Recheck applied"
                );
                self.collaborators.queue.mark_completed(&job.id).await?;
                report.delivered += 1;
            } else {
                report.deferred += 1;
            }
        }

        Ok(report)
    }

    async fn prune_finished(&self) {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|space_id, handle| {
            let finished = handle.is_finished();
            if finished {
                tracing::warn!(space_id = %space_id, "Session ended, will restart on discovery");
            }
            !finished
        });
    }

    async fn stop_space(&self, space_id: &SpaceId) {
        let handle = self.sessions.write().await.remove(space_id);
        if let Some(handle) = handle {
            tracing::info!(space_id = %space_id, "Stopping space");
            handle.shutdown(self.config.drain_timeout()).await;
        }
    }

    async fn start_space(&self, record: &SpaceRecord) {
        let space_id = &record.id;
        let timeout = self.access.lookup_timeout();

        match tokio::time::timeout(
            timeout,
            self.collaborators.reachability.space_exists(space_id),
        )
        .await
        {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                tracing::warn!(space_id = %space_id, "Space unreachable, skipping");
                return;
            }
            Ok(Err(e)) => {
                tracing::warn!(space_id = %space_id, error = %e, "Reachability check failed, skipping");
                return;
            }
            Err(_) => {
                tracing::warn!(
                    space_id = %space_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Reachability check timed out, skipping"
                );
                return;
            }
        }

        let definition = match record.definition(&self.access) {
            Ok(definition) => definition,
            Err(e) => {
                tracing::error!(space_id = %space_id, error = %e, "Invalid space configuration, not starting");
                return;
            }
        };

        let link = match self.collaborators.connector.connect(space_id).await {
            Ok(link) => link,
            Err(e) => {
                tracing::error!(space_id = %space_id, error = %e, "Failed to connect, will retry");
                return;
            }
        };

        let resolver = PermissionResolver::new(
            self.collaborators.identity.clone(),
            self.collaborators.permissions.clone(),
            &self.access,
        );
        let engine = AccessEngine::new(definition, resolver, &self.access);
        let handle = SpaceSession::spawn(engine, link, record.clone(), self.config.inbox_capacity);

        // stop() raises the flag before draining, so checking under the lock
        // never leaves a session behind
        let mut sessions = self.sessions.write().await;
        if self.stopped.load(Ordering::SeqCst) {
            drop(sessions);
            handle.shutdown(self.config.drain_timeout()).await;
            return;
        }

        tracing::info!(space_id = %space_id, "Space started");
        sessions.insert(space_id.clone(), handle);
    }

    /// Hot-reload sessions whose directory record changed
    async fn reload_changed(&self, records: &[SpaceRecord], plan: &SpaceDiff) {
        let mut sessions = self.sessions.write().await;

        for record in records {
            if plan.to_start.contains(&record.id) {
                continue;
            }
            let Some(handle) = sessions.get_mut(&record.id) else {
                continue;
            };
            if handle.record() == record {
                continue;
            }

            match record.definition(&self.access) {
                Ok(definition) => {
                    tracing::info!(space_id = %record.id, "Space configuration changed, reloading");
                    handle.reload(record.clone(), definition).await;
                }
                Err(e) => {
                    tracing::error!(
                        space_id = %record.id,
                        error = %e,
                        "Changed space configuration is invalid, keeping previous"
                    );
                }
            }
        }
    }
}
