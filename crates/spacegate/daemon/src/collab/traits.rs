//! Collaborator trait definitions
//!
//! Everything the daemon needs from the outside world: the space directory,
//! the recheck queue, reachability checks and world sessions. Identity and
//! permission lookups use the access crate's traits.

use crate::error::{DaemonResult, TransportError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use spacegate_access::{
    AccessConfig, AccessResult, IdentityResolver, PermissionSource, RegionCatalog,
    SpaceDefinition,
};
use spacegate_types::{
    JobId, MapId, PlayerId, PlayerInfo, Point, RecheckJob, SpaceId, WalletAddress, WorldAction,
    WorldEvent,
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A space as listed by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRecord {
    pub id: SpaceId,

    /// Serialized region list; empty means no restricted regions.
    #[serde(default)]
    pub regions: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn_map: Option<String>,

    /// Spawn position as `"x, y"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn_coordinates: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_wallet: Option<WalletAddress>,
}

impl SpaceRecord {
    pub fn new(id: SpaceId) -> Self {
        Self {
            id,
            regions: String::new(),
            spawn_map: None,
            spawn_coordinates: None,
            owner_wallet: None,
        }
    }

    pub fn with_regions(mut self, regions: impl Into<String>) -> Self {
        self.regions = regions.into();
        self
    }

    pub fn with_spawn(mut self, map: impl Into<String>, coordinates: impl Into<String>) -> Self {
        self.spawn_map = Some(map.into());
        self.spawn_coordinates = Some(coordinates.into());
        self
    }

    pub fn with_owner(mut self, owner: WalletAddress) -> Self {
        self.owner_wallet = Some(owner);
        self
    }

    /// Validate the record into an engine definition.
    ///
    /// A spawn needs both a map and coordinates; either alone is ignored.
    pub fn definition(&self, config: &AccessConfig) -> AccessResult<SpaceDefinition> {
        let catalog =
            RegionCatalog::from_json(&self.id, &self.regions, config.default_wall_thickness)?;
        let mut definition = SpaceDefinition::new(self.id.clone(), catalog);

        if let (Some(map), Some(coordinates)) = (&self.spawn_map, &self.spawn_coordinates) {
            definition = definition.with_spawn(SpaceDefinition::parse_spawn(map, coordinates)?);
        }
        if let Some(owner) = &self.owner_wallet {
            definition = definition.with_owner(owner.clone());
        }

        Ok(definition)
    }
}

/// Lists the spaces that should be monitored.
#[async_trait]
pub trait Directory: Send + Sync {
    /// All spaces, in directory order
    async fn list_spaces(&self) -> DaemonResult<Vec<SpaceRecord>>;
}

/// Queue of permission recheck jobs fed by the permission indexer.
#[async_trait]
pub trait RecheckQueue: Send + Sync {
    /// Jobs not yet completed, oldest first
    async fn pending_jobs(&self) -> DaemonResult<Vec<RecheckJob>>;

    /// Mark a job done so it is not delivered again
    async fn mark_completed(&self, id: &JobId) -> DaemonResult<()>;
}

/// Checks that a space still exists before a session is opened for it.
#[async_trait]
pub trait Reachability: Send + Sync {
    async fn space_exists(&self, space_id: &SpaceId) -> DaemonResult<bool>;
}

/// An open session to one space.
#[async_trait]
pub trait WorldSession: Send + Sync {
    async fn teleport(
        &self,
        player_id: &PlayerId,
        map: &MapId,
        position: Point,
    ) -> Result<(), TransportError>;

    /// Chat visible only to `recipient`.
    async fn chat(&self, recipient: &PlayerId, map: &MapId, text: &str)
        -> Result<(), TransportError>;

    /// Players currently connected, in the world's own order.
    async fn players(&self) -> Result<Vec<PlayerInfo>, TransportError>;

    async fn disconnect(&self);

    /// Perform an engine action.
    async fn apply(&self, action: &WorldAction) -> Result<(), TransportError> {
        match action {
            WorldAction::Teleport {
                player_id,
                map,
                position,
            } => self.teleport(player_id, map, *position).await,
            WorldAction::PrivateChat {
                recipient,
                map,
                text,
            } => self.chat(recipient, map, text).await,
        }
    }
}

/// A connected session plus its event stream.
pub struct WorldLink {
    pub session: Arc<dyn WorldSession>,
    pub events: mpsc::Receiver<WorldEvent>,
}

/// Opens world sessions.
#[async_trait]
pub trait WorldConnector: Send + Sync {
    async fn connect(&self, space_id: &SpaceId) -> Result<WorldLink, TransportError>;
}

/// The full set of collaborators a supervisor works with.
#[derive(Clone)]
pub struct Collaborators {
    pub directory: Arc<dyn Directory>,
    pub identity: Arc<dyn IdentityResolver>,
    pub permissions: Arc<dyn PermissionSource>,
    pub queue: Arc<dyn RecheckQueue>,
    pub reachability: Arc<dyn Reachability>,
    pub connector: Arc<dyn WorldConnector>,
}
