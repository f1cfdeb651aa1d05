//! Spacegate daemon library
//!
//! This module provides the runtime around the access engine:
//! - Collaborator traits and in-process implementations
//! - Per-space session loops
//! - The supervisor (discovery and recheck polling)
//! - Server lifecycle management

pub mod collab;
pub mod config;
pub mod error;
pub mod server;
pub mod session;
pub mod supervisor;

pub use collab::{Collaborators, InMemoryDirectory, LoopbackConnector, SpaceRecord};
pub use config::DaemonConfig;
pub use error::{DaemonError, DaemonResult, TransportError};
pub use server::Server;
pub use session::{SessionExit, SessionHandle, SpaceSession};
pub use supervisor::{RecheckReport, Supervisor};
