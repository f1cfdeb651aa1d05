//! Space supervisor
//!
//! Polls the directory to start and stop per-space sessions, hot-reloads
//! changed space configurations and forwards recheck jobs to running
//! sessions.

mod reconciler;

pub use reconciler::{RecheckReport, Supervisor};
