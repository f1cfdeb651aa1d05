//! Per-space session loop
//!
//! Each monitored space gets one task that owns its [`AccessEngine`]. World
//! events and control messages are consumed by that single task, so events
//! for a player are handled strictly one after another.

use crate::collab::{SpaceRecord, WorldLink, WorldSession};
use crate::error::TransportError;
use spacegate_access::{AccessEngine, SpaceDefinition};
use spacegate_types::{PlayerId, SpaceId, WorldAction, WorldEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Control messages for a running session.
#[derive(Debug)]
pub enum SessionMessage {
    /// Recompute a player's permissions. The ack fires once the recheck has
    /// been applied, carrying whether a snapshot was recomputed.
    Recheck(PlayerId, oneshot::Sender<bool>),
    /// Swap in a changed space definition.
    Reload(SpaceDefinition),
    Shutdown,
}

/// Why a session loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    Shutdown,
    ConnectionLost,
    EventsClosed,
}

/// Supervisor-side handle to a running session.
pub struct SessionHandle {
    space_id: SpaceId,
    record: SpaceRecord,
    world: Arc<dyn WorldSession>,
    inbox: mpsc::Sender<SessionMessage>,
    task: JoinHandle<SessionExit>,
}

impl SessionHandle {
    pub fn space_id(&self) -> &SpaceId {
        &self.space_id
    }

    /// Directory record the session's definition was built from
    pub fn record(&self) -> &SpaceRecord {
        &self.record
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Queue a recheck for a player.
    ///
    /// Returns the ack to await for the applied result, or `None` when the
    /// session is no longer accepting messages.
    pub async fn recheck(&self, player_id: PlayerId) -> Option<oneshot::Receiver<bool>> {
        let (ack, applied) = oneshot::channel();
        self.inbox
            .send(SessionMessage::Recheck(player_id, ack))
            .await
            .ok()
            .map(|_| applied)
    }

    /// Hand the session a changed definition
    pub async fn reload(&mut self, record: SpaceRecord, definition: SpaceDefinition) -> bool {
        let delivered = self
            .inbox
            .send(SessionMessage::Reload(definition))
            .await
            .is_ok();
        if delivered {
            self.record = record;
        }
        delivered
    }

    /// Stop the session, aborting it if it does not finish within `drain`
    pub async fn shutdown(self, drain: Duration) -> Option<SessionExit> {
        let SessionHandle {
            space_id,
            world,
            inbox,
            mut task,
            ..
        } = self;

        let drained = tokio::time::timeout(drain, async {
            let _ = inbox.send(SessionMessage::Shutdown).await;
            (&mut task).await
        })
        .await;

        match drained {
            Ok(Ok(exit)) => Some(exit),
            Ok(Err(e)) => {
                error!(space_id = %space_id, error = %e, "Session task failed");
                None
            }
            Err(_) => {
                warn!(
                    space_id = %space_id,
                    drain_ms = drain.as_millis() as u64,
                    "Session did not drain in time, aborting"
                );
                task.abort();
                // the loop never reached its own disconnect
                world.disconnect().await;
                None
            }
        }
    }
}

/// The session loop itself.
pub struct SpaceSession {
    engine: AccessEngine,
    world: Arc<dyn WorldSession>,
    events: mpsc::Receiver<WorldEvent>,
    inbox: mpsc::Receiver<SessionMessage>,
}

impl SpaceSession {
    /// Start a session task for `engine` over an open world link
    pub fn spawn(
        engine: AccessEngine,
        link: WorldLink,
        record: SpaceRecord,
        inbox_capacity: usize,
    ) -> SessionHandle {
        let (tx, rx) = mpsc::channel(inbox_capacity.max(1));
        let space_id = engine.space_id().clone();

        let session = SpaceSession {
            engine,
            world: link.session.clone(),
            events: link.events,
            inbox: rx,
        };
        let task = tokio::spawn(session.run());

        SessionHandle {
            space_id,
            record,
            world: link.session,
            inbox: tx,
            task,
        }
    }

    async fn run(mut self) -> SessionExit {
        let space_id = self.engine.space_id().clone();
        info!(
            space_id = %space_id,
            regions = self.engine.catalog().len(),
            "Session started"
        );

        let exit = loop {
            tokio::select! {
                biased;

                message = self.inbox.recv() => match message {
                    Some(SessionMessage::Recheck(player_id, ack)) => {
                        let applied = self.engine.recheck(&player_id).await;
                        if applied {
                            debug!(space_id = %space_id, player_id = %player_id, "Recheck applied");
                        }
                        let _ = ack.send(applied);
                    }
                    Some(SessionMessage::Reload(definition)) => {
                        self.engine.replace_space(definition);
                    }
                    Some(SessionMessage::Shutdown) | None => break self.drain().await,
                },

                event = self.events.recv() => match event {
                    Some(event) => {
                        if let Some(exit) = self.handle_event(event).await {
                            break exit;
                        }
                    }
                    None => break SessionExit::EventsClosed,
                },
            }
        };

        self.world.disconnect().await;
        info!(space_id = %space_id, exit = ?exit, "Session ended");
        exit
    }

    /// Handle events already delivered before stopping.
    async fn drain(&mut self) -> SessionExit {
        while let Ok(event) = self.events.try_recv() {
            if let Some(exit) = self.handle_event(event).await {
                return exit;
            }
        }
        SessionExit::Shutdown
    }

    async fn handle_event(&mut self, event: WorldEvent) -> Option<SessionExit> {
        trace!(
            space_id = %self.engine.space_id(),
            player_id = ?event.player_id(),
            "World event"
        );

        let actions = match event {
            WorldEvent::Connection { connected: true } => {
                info!(space_id = %self.engine.space_id(), "Connected");
                return None;
            }
            WorldEvent::Connection { connected: false } => {
                warn!(space_id = %self.engine.space_id(), "Connection lost");
                return Some(SessionExit::ConnectionLost);
            }
            WorldEvent::PlayerJoined { player } => {
                debug!(
                    space_id = %self.engine.space_id(),
                    player_id = %player.id,
                    name = %player.name,
                    "Player joined"
                );
                self.engine.on_join(&player).await
            }
            WorldEvent::PlayerMoved {
                player_id,
                map,
                position,
            } => {
                self.engine
                    .on_move(&player_id, &map, position)
                    .await
                    .actions
            }
            WorldEvent::PlayerChatted { sender, text } => {
                let players = match self.world.players().await {
                    Ok(players) => players,
                    Err(e) => return self.transport_failure(e),
                };
                match players.iter().find(|p| p.id == sender) {
                    Some(info) => self.engine.on_chat(info, &text, &players).await,
                    None => {
                        debug!(
                            space_id = %self.engine.space_id(),
                            player_id = %sender,
                            "Chat from player not in the player list"
                        );
                        Vec::new()
                    }
                }
            }
            WorldEvent::PlayerLeft { player_id } => {
                self.engine.on_leave(&player_id);
                Vec::new()
            }
        };

        match self.apply(&actions).await {
            Ok(()) => None,
            Err(e) => self.transport_failure(e),
        }
    }

    /// Perform actions in order. Rejected actions are logged and skipped; a
    /// closed session stops the batch.
    async fn apply(&self, actions: &[WorldAction]) -> Result<(), TransportError> {
        for action in actions {
            match self.world.apply(action).await {
                Ok(()) => {}
                Err(TransportError::Rejected(reason)) => {
                    warn!(
                        space_id = %self.engine.space_id(),
                        action = ?action,
                        reason = %reason,
                        "World rejected action"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn transport_failure(&self, e: TransportError) -> Option<SessionExit> {
        error!(space_id = %self.engine.space_id(), error = %e, "World session failed");
        Some(SessionExit::ConnectionLost)
    }
}
