//! Access decision engine
//!
//! One engine owns the state of one space: its catalog, the permission
//! snapshots of its players and their position histories. It turns world
//! events into [`WorldAction`]s and never talks to the world itself.

use crate::catalog::RegionCatalog;
use crate::command::ModeratorCommand;
use crate::config::AccessConfig;
use crate::error::AccessError;
use crate::history::PositionHistoryStore;
use crate::resolver::PermissionResolver;
use crate::snapshot::PermissionSnapshotStore;
use crate::space::SpaceDefinition;
use spacegate_types::{MapId, PlayerId, PlayerInfo, Point, SpaceId, WorldAction};
use tracing::{debug, info, warn};

/// A region the player stood in without permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub region: String,
    pub requirement: String,
}

/// Outcome of evaluating one movement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveDecision {
    pub denials: Vec<Denial>,
    pub actions: Vec<WorldAction>,
}

impl MoveDecision {
    /// Whether the player was expelled this tick.
    pub fn warped_out(&self) -> bool {
        !self.denials.is_empty()
    }
}

/// Access engine for a single space.
pub struct AccessEngine {
    space: SpaceDefinition,
    snapshots: PermissionSnapshotStore,
    history: PositionHistoryStore,
    resolver: PermissionResolver,
}

impl AccessEngine {
    pub fn new(space: SpaceDefinition, resolver: PermissionResolver, config: &AccessConfig) -> Self {
        Self {
            space,
            snapshots: PermissionSnapshotStore::new(),
            history: PositionHistoryStore::new(config.history_capacity),
            resolver,
        }
    }

    pub fn space_id(&self) -> &SpaceId {
        &self.space.id
    }

    pub fn space(&self) -> &SpaceDefinition {
        &self.space
    }

    pub fn catalog(&self) -> &RegionCatalog {
        &self.space.catalog
    }

    pub fn snapshots(&self) -> &PermissionSnapshotStore {
        &self.snapshots
    }

    pub fn history(&self) -> &PositionHistoryStore {
        &self.history
    }

    /// Swap in a new definition (catalog drift). Every snapshot is dropped
    /// because verdicts are keyed by region name.
    pub fn replace_space(&mut self, space: SpaceDefinition) {
        info!(
            space_id = %self.space.id,
            regions = space.catalog.len(),
            "Reloading region catalog"
        );
        self.space = space;
        self.snapshots.invalidate_all();
    }

    /// Recompute the player's snapshot from scratch.
    pub async fn recompute(&mut self, player_id: &PlayerId) {
        let snapshot = self
            .resolver
            .resolve(player_id, &self.space.id, &self.space.catalog)
            .await;
        debug!(
            space_id = %self.space.id,
            player_id = %player_id,
            allowed = snapshot.allowed_regions().count(),
            "Permission snapshot recomputed"
        );
        self.snapshots.replace(player_id.clone(), snapshot);
    }

    /// Make sure every catalog region has a verdict for the player.
    pub async fn ensure_snapshot(&mut self, player_id: &PlayerId) {
        if !self.snapshots.is_current(player_id, &self.space.catalog) {
            self.recompute(player_id).await;
        }
    }

    /// Drop the player's snapshot; the next event recomputes it.
    pub fn invalidate(&mut self, player_id: &PlayerId) -> bool {
        self.snapshots.invalidate(player_id)
    }

    /// Handle an external recheck signal: invalidate and recompute now.
    ///
    /// Players without a snapshot are left to be computed on their next
    /// event. Returns whether a recompute happened.
    pub async fn recheck(&mut self, player_id: &PlayerId) -> bool {
        if !self.invalidate(player_id) {
            return false;
        }
        self.recompute(player_id).await;
        true
    }

    /// Player joined: place them at the spawn point, then compute permissions.
    pub async fn on_join(&mut self, player: &PlayerInfo) -> Vec<WorldAction> {
        let mut actions = Vec::new();

        if let Some(spawn) = &self.space.spawn {
            debug!(
                space_id = %self.space.id,
                player_id = %player.id,
                map = %spawn.map,
                position = %spawn.position,
                "Placing joining player at spawn"
            );
            actions.push(WorldAction::teleport(
                player.id.clone(),
                spawn.map.clone(),
                spawn.position,
            ));
        }

        self.recompute(&player.id).await;
        actions
    }

    /// Player left: forget everything about them.
    pub fn on_leave(&mut self, player_id: &PlayerId) {
        self.snapshots.invalidate(player_id);
        self.history.forget(player_id);
    }

    /// Evaluate a move against the current snapshot without mutating state.
    ///
    /// Every contained region is checked; each denial yields its own teleport
    /// (when a legal position is known) and its own private message. A region
    /// without a verdict counts as denied.
    pub fn evaluate(&self, player_id: &PlayerId, map: &MapId, position: Point) -> MoveDecision {
        let mut decision = MoveDecision::default();
        let fallback = self.history.latest(player_id);

        for region in self.space.catalog.containing(map, position) {
            let allowed = self.snapshots.get(player_id, &region.name).unwrap_or(false);
            if allowed {
                continue;
            }

            warn!(
                space_id = %self.space.id,
                player_id = %player_id,
                region = %region.name,
                position = %position,
                "Player entered region without permission"
            );

            if let Some(back) = fallback {
                decision
                    .actions
                    .push(WorldAction::teleport(player_id.clone(), map.clone(), back));
            }
            decision.actions.push(WorldAction::private_chat(
                player_id.clone(),
                map.clone(),
                region.denial_message(),
            ));
            decision.denials.push(Denial {
                region: region.name.clone(),
                requirement: region.requirement.clone(),
            });
        }

        decision
    }

    /// Player moved: evaluate and, when the position is legal, remember it.
    pub async fn on_move(&mut self, player_id: &PlayerId, map: &MapId, position: Point) -> MoveDecision {
        self.ensure_snapshot(player_id).await;

        let decision = self.evaluate(player_id, map, position);
        if !decision.warped_out() {
            self.history.record(player_id, position);
        }
        decision
    }

    /// Player chatted: serve moderator commands from the space owner.
    ///
    /// Non-commands and senders who are not the owner produce nothing.
    /// Parse failures and unknown targets are reported to the sender only.
    pub async fn on_chat(
        &mut self,
        sender: &PlayerInfo,
        text: &str,
        players: &[PlayerInfo],
    ) -> Vec<WorldAction> {
        let parsed = ModeratorCommand::parse(text);
        if matches!(parsed, Ok(None)) {
            return Vec::new();
        }

        if !self.is_moderator(&sender.id).await {
            debug!(
                space_id = %self.space.id,
                player_id = %sender.id,
                "Ignoring command from non-owner"
            );
            return Vec::new();
        }

        let result = parsed.and_then(|command| match command {
            Some(command) => {
                info!(
                    space_id = %self.space.id,
                    player_id = %sender.id,
                    command = ?command,
                    "Moderator command"
                );
                command.execute(sender, players, &self.space.catalog)
            }
            None => Ok(Vec::new()),
        });

        match result {
            Ok(actions) => actions,
            Err(e) => {
                if !e.is_user_facing() {
                    warn!(space_id = %self.space.id, error = %e, "Moderator command failed");
                }
                vec![error_reply(sender, &e)]
            }
        }
    }

    async fn is_moderator(&self, player_id: &PlayerId) -> bool {
        if self.space.owner.is_none() {
            return false;
        }

        match self.resolver.linked_wallet(player_id).await {
            Ok(Some(wallet)) => self.space.is_owner(&wallet),
            Ok(None) => false,
            Err(e) => {
                warn!(
                    space_id = %self.space.id,
                    player_id = %player_id,
                    error = %e,
                    "Owner check failed"
                );
                false
            }
        }
    }
}

fn error_reply(sender: &PlayerInfo, error: &AccessError) -> WorldAction {
    WorldAction::private_chat(sender.id.clone(), sender.map.clone(), error.to_string())
}
