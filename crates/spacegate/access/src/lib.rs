//! Spacegate access engine
//!
//! Decides whether a player may stand where they just moved, and turns every
//! denial into world actions that put them back. Also serves the owner-only
//! `/teleport` and `/list` chat commands.
//!
//! The engine never talks to the world or to the permission backends
//! directly: identity and permission lookups go through [`IdentityResolver`]
//! and [`PermissionSource`], and every decision comes back as a list of
//! [`WorldAction`](spacegate_types::WorldAction)s for the caller to apply.

#![deny(unsafe_code)]

pub mod catalog;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod lifecycle;
pub mod region;
pub mod resolver;
pub mod snapshot;
pub mod source;
pub mod space;

pub use catalog::RegionCatalog;
pub use command::{region_listing, Destination, ModeratorCommand};
pub use config::{AccessConfig, DeploymentProfile};
pub use engine::{AccessEngine, Denial, MoveDecision};
pub use error::{AccessError, AccessResult};
pub use history::{PositionHistory, PositionHistoryStore};
pub use lifecycle::{diff, SpaceDiff};
pub use region::{AccessGate, Region, RegionRecord};
pub use resolver::{bounded, PermissionResolver};
pub use snapshot::{PermissionSnapshot, PermissionSnapshotStore};
pub use source::{IdentityResolver, PermissionSource};
pub use space::SpaceDefinition;
