//! Loopback world transport
//!
//! An in-process world: players are driven by calling methods on
//! [`LoopbackWorld`], and every action the daemon performs is recorded.

use super::traits::{WorldConnector, WorldLink, WorldSession};
use crate::error::TransportError;
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use spacegate_types::{MapId, PlayerId, PlayerInfo, Point, SpaceId, WorldAction, WorldEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// One loopback space.
#[derive(Debug)]
pub struct LoopbackWorld {
    space_id: SpaceId,
    players: RwLock<Vec<PlayerInfo>>,
    actions: RwLock<Vec<WorldAction>>,
    events: mpsc::Sender<WorldEvent>,
    connected: AtomicBool,
}

impl LoopbackWorld {
    fn new(space_id: SpaceId, events: mpsc::Sender<WorldEvent>) -> Self {
        Self {
            space_id,
            players: RwLock::new(Vec::new()),
            actions: RwLock::new(Vec::new()),
            events,
            connected: AtomicBool::new(true),
        }
    }

    pub fn space_id(&self) -> &SpaceId {
        &self.space_id
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Actions performed so far, in order
    pub async fn actions(&self) -> Vec<WorldAction> {
        self.actions.read().await.clone()
    }

    pub async fn clear_actions(&self) {
        self.actions.write().await.clear();
    }

    pub async fn join(&self, player: PlayerInfo) -> Result<(), TransportError> {
        self.players.write().await.push(player.clone());
        self.emit(WorldEvent::PlayerJoined { player }).await
    }

    pub async fn move_player(
        &self,
        player_id: &PlayerId,
        map: MapId,
        position: Point,
    ) -> Result<(), TransportError> {
        self.place(player_id, &map, position).await;
        self.emit(WorldEvent::PlayerMoved {
            player_id: player_id.clone(),
            map,
            position,
        })
        .await
    }

    pub async fn say(&self, player_id: &PlayerId, text: &str) -> Result<(), TransportError> {
        self.emit(WorldEvent::PlayerChatted {
            sender: player_id.clone(),
            text: text.to_string(),
        })
        .await
    }

    pub async fn leave(&self, player_id: &PlayerId) -> Result<(), TransportError> {
        self.players.write().await.retain(|p| &p.id != player_id);
        self.emit(WorldEvent::PlayerLeft {
            player_id: player_id.clone(),
        })
        .await
    }

    /// Simulate the connection dropping.
    pub async fn drop_connection(&self) -> Result<(), TransportError> {
        let result = self.emit(WorldEvent::Connection { connected: false }).await;
        self.connected.store(false, Ordering::SeqCst);
        result
    }

    async fn emit(&self, event: WorldEvent) -> Result<(), TransportError> {
        self.events
            .send(event)
            .await
            .map_err(|_| TransportError::Closed(self.space_id.clone()))
    }

    async fn place(&self, player_id: &PlayerId, map: &MapId, position: Point) {
        let mut players = self.players.write().await;
        if let Some(player) = players.iter_mut().find(|p| &p.id == player_id) {
            player.map = map.clone();
            player.position = position;
        }
    }

    fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(TransportError::Closed(self.space_id.clone()))
        }
    }
}

#[async_trait]
impl WorldSession for LoopbackWorld {
    async fn teleport(
        &self,
        player_id: &PlayerId,
        map: &MapId,
        position: Point,
    ) -> Result<(), TransportError> {
        self.ensure_connected()?;
        self.place(player_id, map, position).await;
        self.actions.write().await.push(WorldAction::teleport(
            player_id.clone(),
            map.clone(),
            position,
        ));
        Ok(())
    }

    async fn chat(
        &self,
        recipient: &PlayerId,
        map: &MapId,
        text: &str,
    ) -> Result<(), TransportError> {
        self.ensure_connected()?;
        self.actions.write().await.push(WorldAction::private_chat(
            recipient.clone(),
            map.clone(),
            text,
        ));
        Ok(())
    }

    async fn players(&self) -> Result<Vec<PlayerInfo>, TransportError> {
        self.ensure_connected()?;
        Ok(self.players.read().await.clone())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

/// Connector handing out [`LoopbackWorld`]s.
#[derive(Debug)]
pub struct LoopbackConnector {
    worlds: DashMap<SpaceId, Arc<LoopbackWorld>>,
    refused: DashSet<SpaceId>,
    capacity: usize,
}

impl Default for LoopbackConnector {
    fn default() -> Self {
        Self::new(256)
    }
}

impl LoopbackConnector {
    /// Create a connector whose event channels hold `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            worlds: DashMap::new(),
            refused: DashSet::new(),
            capacity: capacity.max(1),
        }
    }

    /// Most recent world opened for a space
    pub fn world(&self, space_id: &SpaceId) -> Option<Arc<LoopbackWorld>> {
        self.worlds.get(space_id).map(|w| w.value().clone())
    }

    /// Make connection attempts to a space fail
    pub fn refuse(&self, space_id: &SpaceId, refused: bool) {
        if refused {
            self.refused.insert(space_id.clone());
        } else {
            self.refused.remove(space_id);
        }
    }
}

#[async_trait]
impl WorldConnector for LoopbackConnector {
    async fn connect(&self, space_id: &SpaceId) -> Result<WorldLink, TransportError> {
        if self.refused.contains(space_id) {
            return Err(TransportError::Connect {
                space_id: space_id.clone(),
                reason: "connection refused".to_string(),
            });
        }

        let (tx, rx) = mpsc::channel(self.capacity);
        let world = Arc::new(LoopbackWorld::new(space_id.clone(), tx));
        self.worlds.insert(space_id.clone(), world.clone());

        Ok(WorldLink {
            session: world,
            events: rx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lobby() -> MapId {
        MapId::new("lobby")
    }

    #[tokio::test]
    async fn test_events_and_actions() {
        let connector = LoopbackConnector::default();
        let space = SpaceId::new("space-1");
        let mut link = connector.connect(&space).await.unwrap();
        let world = connector.world(&space).unwrap();

        let alice = PlayerInfo::new(PlayerId::new("a"), "Alice", lobby(), Point::new(0, 0));
        world.join(alice.clone()).await.unwrap();
        assert_eq!(
            link.events.recv().await,
            Some(WorldEvent::PlayerJoined { player: alice.clone() })
        );

        link.session
            .teleport(&alice.id, &lobby(), Point::new(4, 4))
            .await
            .unwrap();
        let players = link.session.players().await.unwrap();
        assert_eq!(players[0].position, Point::new(4, 4));
        assert_eq!(world.actions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_disconnected_session_rejects_actions() {
        let connector = LoopbackConnector::default();
        let space = SpaceId::new("space-1");
        let link = connector.connect(&space).await.unwrap();

        link.session.disconnect().await;
        let result = link
            .session
            .chat(&PlayerId::new("a"), &lobby(), "hello")
            .await;
        assert!(matches!(result, Err(TransportError::Closed(_))));
    }

    #[tokio::test]
    async fn test_refused_connection() {
        let connector = LoopbackConnector::default();
        let space = SpaceId::new("space-1");
        connector.refuse(&space, true);

        assert!(matches!(
            connector.connect(&space).await,
            Err(TransportError::Connect { .. })
        ));
    }
}
