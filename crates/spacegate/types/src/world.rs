//! World-facing data: connected players, inbound events and outbound actions.

use crate::geometry::Point;
use crate::ids::{MapId, PlayerId};
use serde::{Deserialize, Serialize};

/// A player currently connected to a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    /// Display name, as shown to other players
    pub name: String,
    pub map: MapId,
    pub position: Point,
}

impl PlayerInfo {
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        map: MapId,
        position: Point,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            map,
            position,
        }
    }
}

/// A map plus a position on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub map: MapId,
    pub position: Point,
}

impl Location {
    pub fn new(map: MapId, position: Point) -> Self {
        Self { map, position }
    }
}

/// Events delivered by a world session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorldEvent {
    /// The session connection went up or down.
    Connection { connected: bool },

    PlayerJoined { player: PlayerInfo },

    PlayerMoved {
        player_id: PlayerId,
        map: MapId,
        position: Point,
    },

    PlayerChatted { sender: PlayerId, text: String },

    PlayerLeft { player_id: PlayerId },
}

impl WorldEvent {
    /// Player the event concerns, if any.
    pub fn player_id(&self) -> Option<&PlayerId> {
        match self {
            WorldEvent::Connection { .. } => None,
            WorldEvent::PlayerJoined { player } => Some(&player.id),
            WorldEvent::PlayerMoved { player_id, .. } => Some(player_id),
            WorldEvent::PlayerChatted { sender, .. } => Some(sender),
            WorldEvent::PlayerLeft { player_id } => Some(player_id),
        }
    }
}

/// Side effects the engine asks a world session to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorldAction {
    Teleport {
        player_id: PlayerId,
        map: MapId,
        position: Point,
    },

    /// Chat visible only to `recipient`, sent on its behalf.
    PrivateChat {
        recipient: PlayerId,
        map: MapId,
        text: String,
    },
}

impl WorldAction {
    pub fn teleport(player_id: PlayerId, map: MapId, position: Point) -> Self {
        WorldAction::Teleport {
            player_id,
            map,
            position,
        }
    }

    pub fn private_chat(recipient: PlayerId, map: MapId, text: impl Into<String>) -> Self {
        WorldAction::PrivateChat {
            recipient,
            map,
            text: text.into(),
        }
    }

    pub fn is_teleport(&self) -> bool {
        matches!(self, WorldAction::Teleport { .. })
    }
}
