//! Spacegate shared types
//!
//! Identifiers, grid geometry and the world event/action vocabulary shared by
//! the access engine and the daemon.

#![deny(unsafe_code)]

pub mod geometry;
pub mod ids;
pub mod job;
pub mod world;

pub use geometry::{GeometryError, Point, Rect};
pub use ids::{JobId, MapId, PlayerId, SpaceId, WalletAddress};
pub use job::{JobParseError, RecheckJob, RecheckRequest};
pub use world::{Location, PlayerInfo, WorldAction, WorldEvent};
