//! In-memory directory implementation

use super::traits::*;
use crate::error::{DaemonError, DaemonResult};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};
use spacegate_access::{AccessResult, IdentityResolver, PermissionSource};
use spacegate_types::{JobId, PlayerId, RecheckJob, SpaceId, WalletAddress};
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::RwLock;

/// A player's wallet link for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletLink {
    pub player_id: PlayerId,
    pub wallet: WalletAddress,
    #[serde(default = "default_service")]
    pub service: String,
}

/// Regions of a space a wallet may enter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionGrant {
    pub wallet: WalletAddress,
    pub space_id: SpaceId,
    pub regions: Vec<String>,
}

/// A token held by a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHolding {
    pub wallet: WalletAddress,
    pub contract: String,
}

/// Initial contents of an [`InMemoryDirectory`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySeed {
    #[serde(default)]
    pub spaces: Vec<SpaceRecord>,
    #[serde(default)]
    pub links: Vec<WalletLink>,
    #[serde(default)]
    pub grants: Vec<RegionGrant>,
    #[serde(default)]
    pub holdings: Vec<TokenHolding>,
}

fn default_service() -> String {
    "gather".to_string()
}

/// In-memory directory, identity store, permission source and recheck queue
/// for development and testing
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    spaces: RwLock<Vec<SpaceRecord>>,
    unreachable: DashSet<SpaceId>,
    links: DashMap<(String, PlayerId), WalletAddress>,
    grants: DashMap<(WalletAddress, SpaceId), HashSet<String>>,
    holdings: DashSet<(WalletAddress, String)>,
    jobs: RwLock<Vec<RecheckJob>>,
}

impl InMemoryDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory populated from a seed
    pub fn from_seed(seed: DirectorySeed) -> Self {
        let directory = Self {
            spaces: RwLock::new(seed.spaces),
            ..Default::default()
        };

        for link in seed.links {
            directory
                .links
                .insert((link.service, link.player_id), link.wallet);
        }
        for grant in seed.grants {
            directory
                .grants
                .entry((grant.wallet, grant.space_id))
                .or_default()
                .extend(grant.regions);
        }
        for holding in seed.holdings {
            directory
                .holdings
                .insert((holding.wallet, holding.contract.to_ascii_lowercase()));
        }

        directory
    }

    /// Load a JSON seed file
    pub async fn load_seed(path: impl AsRef<Path>) -> DaemonResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let seed: DirectorySeed = serde_json::from_str(&raw).map_err(|e| {
            DaemonError::Config(format!("invalid seed file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            spaces = seed.spaces.len(),
            links = seed.links.len(),
            "Loaded directory seed"
        );

        Ok(Self::from_seed(seed))
    }

    /// Add a space, or replace the record with the same id in place
    pub async fn upsert_space(&self, record: SpaceRecord) {
        let mut spaces = self.spaces.write().await;
        match spaces.iter_mut().find(|s| s.id == record.id) {
            Some(existing) => *existing = record,
            None => spaces.push(record),
        }
    }

    pub async fn remove_space(&self, space_id: &SpaceId) -> bool {
        let mut spaces = self.spaces.write().await;
        let before = spaces.len();
        spaces.retain(|s| &s.id != space_id);
        spaces.len() != before
    }

    /// Make reachability checks for a space fail (or succeed again)
    pub fn set_reachable(&self, space_id: &SpaceId, reachable: bool) {
        if reachable {
            self.unreachable.remove(space_id);
        } else {
            self.unreachable.insert(space_id.clone());
        }
    }

    pub fn link_wallet(&self, player_id: PlayerId, service: &str, wallet: WalletAddress) {
        self.links.insert((service.to_string(), player_id), wallet);
    }

    pub fn grant(&self, wallet: &WalletAddress, space_id: &SpaceId, region: &str) {
        self.grants
            .entry((wallet.clone(), space_id.clone()))
            .or_default()
            .insert(region.to_string());
    }

    pub fn revoke(&self, wallet: &WalletAddress, space_id: &SpaceId, region: &str) -> bool {
        self.grants
            .get_mut(&(wallet.clone(), space_id.clone()))
            .map(|mut regions| regions.remove(region))
            .unwrap_or(false)
    }

    pub fn give_token(&self, wallet: &WalletAddress, contract: &str) {
        self.holdings
            .insert((wallet.clone(), contract.to_ascii_lowercase()));
    }

    /// Queue a recheck job
    pub async fn enqueue(&self, job: RecheckJob) -> JobId {
        let id = job.id.clone();
        self.jobs.write().await.push(job);
        id
    }

    /// Queue the canonical `check` job for a player
    pub async fn request_recheck(
        &self,
        wallet: &WalletAddress,
        space_id: &SpaceId,
        player_id: &PlayerId,
    ) -> JobId {
        self.enqueue(RecheckJob::check(wallet, space_id, player_id))
            .await
    }

    pub async fn pending_count(&self) -> usize {
        self.jobs.read().await.len()
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn list_spaces(&self) -> DaemonResult<Vec<SpaceRecord>> {
        Ok(self.spaces.read().await.clone())
    }
}

#[async_trait]
impl Reachability for InMemoryDirectory {
    async fn space_exists(&self, space_id: &SpaceId) -> DaemonResult<bool> {
        if self.unreachable.contains(space_id) {
            return Ok(false);
        }
        let spaces = self.spaces.read().await;
        Ok(spaces.iter().any(|s| &s.id == space_id))
    }
}

#[async_trait]
impl RecheckQueue for InMemoryDirectory {
    async fn pending_jobs(&self) -> DaemonResult<Vec<RecheckJob>> {
        Ok(self.jobs.read().await.clone())
    }

    async fn mark_completed(&self, id: &JobId) -> DaemonResult<()> {
        self.jobs.write().await.retain(|job| &job.id != id);
        Ok(())
    }
}

#[async_trait]
impl IdentityResolver for InMemoryDirectory {
    async fn linked_wallet(
        &self,
        player_id: &PlayerId,
        service: &str,
    ) -> AccessResult<Option<WalletAddress>> {
        Ok(self
            .links
            .get(&(service.to_string(), player_id.clone()))
            .map(|wallet| wallet.value().clone()))
    }
}

#[async_trait]
impl PermissionSource for InMemoryDirectory {
    async fn permitted_regions(
        &self,
        wallet: &WalletAddress,
        space_id: &SpaceId,
    ) -> AccessResult<HashSet<String>> {
        Ok(self
            .grants
            .get(&(wallet.clone(), space_id.clone()))
            .map(|regions| regions.value().clone())
            .unwrap_or_default())
    }

    async fn holds_token(&self, wallet: &WalletAddress, contract: &str) -> AccessResult<bool> {
        Ok(self
            .holdings
            .contains(&(wallet.clone(), contract.to_ascii_lowercase())))
    }
}
