//! Per-player permission snapshots.
//!
//! A snapshot maps every region of a space to a verdict. Snapshots are
//! replaced wholesale when recomputed and never merged.

use crate::catalog::RegionCatalog;
use spacegate_types::PlayerId;
use std::collections::HashMap;

/// Verdicts for one player across the regions of one space.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSnapshot {
    verdicts: HashMap<String, bool>,
}

impl PermissionSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot denying every region of the catalog.
    pub fn deny_all(catalog: &RegionCatalog) -> Self {
        Self {
            verdicts: catalog.names().map(|n| (n.to_string(), false)).collect(),
        }
    }

    pub fn set(&mut self, region: impl Into<String>, allowed: bool) {
        self.verdicts.insert(region.into(), allowed);
    }

    /// Verdict for `region`; `None` means not evaluated.
    pub fn get(&self, region: &str) -> Option<bool> {
        self.verdicts.get(region).copied()
    }

    /// Whether every region of `catalog` has a verdict.
    pub fn covers(&self, catalog: &RegionCatalog) -> bool {
        catalog.names().all(|n| self.verdicts.contains_key(n))
    }

    pub fn allowed_regions(&self) -> impl Iterator<Item = &str> {
        self.verdicts
            .iter()
            .filter(|(_, allowed)| **allowed)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }
}

/// Snapshot cache for the players of one space.
#[derive(Debug, Clone, Default)]
pub struct PermissionSnapshotStore {
    snapshots: HashMap<PlayerId, PermissionSnapshot>,
}

impl PermissionSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verdict for a player and region; `None` when unknown.
    pub fn get(&self, player_id: &PlayerId, region: &str) -> Option<bool> {
        self.snapshots.get(player_id).and_then(|s| s.get(region))
    }

    pub fn snapshot(&self, player_id: &PlayerId) -> Option<&PermissionSnapshot> {
        self.snapshots.get(player_id)
    }

    /// Whether the player has a snapshot covering every catalog region.
    pub fn is_current(&self, player_id: &PlayerId, catalog: &RegionCatalog) -> bool {
        self.snapshots
            .get(player_id)
            .map(|s| s.covers(catalog))
            .unwrap_or(false)
    }

    /// Install a freshly computed snapshot, discarding the previous one.
    pub fn replace(&mut self, player_id: PlayerId, snapshot: PermissionSnapshot) {
        self.snapshots.insert(player_id, snapshot);
    }

    /// Drop the player's snapshot so the next lookup recomputes it.
    pub fn invalidate(&mut self, player_id: &PlayerId) -> bool {
        self.snapshots.remove(player_id).is_some()
    }

    pub fn invalidate_all(&mut self) {
        self.snapshots.clear();
    }

    pub fn player_count(&self) -> usize {
        self.snapshots.len()
    }
}
