//! Collaborators for spacegate-daemon
//!
//! Directory, recheck queue, reachability and world transport, plus the
//! in-process implementations used for development and testing.

mod loopback;
mod memory;
mod traits;

pub use loopback::{LoopbackConnector, LoopbackWorld};
pub use memory::{DirectorySeed, InMemoryDirectory, RegionGrant, TokenHolding, WalletLink};
pub use traits::{
    Collaborators, Directory, Reachability, RecheckQueue, SpaceRecord, WorldConnector, WorldLink,
    WorldSession,
};

use std::sync::Arc;

impl Collaborators {
    /// Wire every collaborator to the in-process implementations
    pub fn in_memory(directory: Arc<InMemoryDirectory>, connector: Arc<LoopbackConnector>) -> Self {
        Self {
            directory: directory.clone(),
            identity: directory.clone(),
            permissions: directory.clone(),
            queue: directory.clone(),
            reachability: directory,
            connector,
        }
    }
}
