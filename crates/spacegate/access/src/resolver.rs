//! Permission resolution against the identity and permission collaborators.
//!
//! Every lookup is bounded by the configured timeout and every failure
//! resolves to a denial; a computed snapshot never contains unknown verdicts.

use crate::catalog::RegionCatalog;
use crate::config::AccessConfig;
use crate::error::{AccessError, AccessResult};
use crate::region::AccessGate;
use crate::snapshot::PermissionSnapshot;
use crate::source::{IdentityResolver, PermissionSource};
use spacegate_types::{PlayerId, SpaceId, WalletAddress};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Run an external lookup under a deadline.
pub async fn bounded<T, F>(lookup: &'static str, timeout: Duration, fut: F) -> AccessResult<T>
where
    F: Future<Output = AccessResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(AccessError::LookupTimeout {
            lookup,
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

/// Computes permission snapshots for players of a space.
#[derive(Clone)]
pub struct PermissionResolver {
    identity: Arc<dyn IdentityResolver>,
    permissions: Arc<dyn PermissionSource>,
    service_name: String,
    timeout: Duration,
}

impl PermissionResolver {
    pub fn new(
        identity: Arc<dyn IdentityResolver>,
        permissions: Arc<dyn PermissionSource>,
        config: &AccessConfig,
    ) -> Self {
        Self {
            identity,
            permissions,
            service_name: config.service_name.clone(),
            timeout: config.lookup_timeout(),
        }
    }

    /// Linked wallet of a player, bounded by the lookup timeout.
    pub async fn linked_wallet(&self, player_id: &PlayerId) -> AccessResult<Option<WalletAddress>> {
        bounded(
            "wallet",
            self.timeout,
            self.identity.linked_wallet(player_id, &self.service_name),
        )
        .await
    }

    /// Compute a complete snapshot for `player_id` over `catalog`.
    ///
    /// Players without a linked wallet, and any region whose lookup fails,
    /// are denied.
    pub async fn resolve(
        &self,
        player_id: &PlayerId,
        space_id: &SpaceId,
        catalog: &RegionCatalog,
    ) -> PermissionSnapshot {
        let wallet = match self.linked_wallet(player_id).await {
            Ok(Some(wallet)) => wallet,
            Ok(None) => {
                info!(
                    space_id = %space_id,
                    player_id = %player_id,
                    "Player has no linked wallet, denying all regions"
                );
                return PermissionSnapshot::deny_all(catalog);
            }
            Err(e) => {
                warn!(
                    space_id = %space_id,
                    player_id = %player_id,
                    error = %e,
                    "Wallet lookup failed, denying all regions"
                );
                return PermissionSnapshot::deny_all(catalog);
            }
        };

        self.resolve_for_wallet(&wallet, player_id, space_id, catalog)
            .await
    }

    /// Compute a snapshot for a known wallet.
    pub async fn resolve_for_wallet(
        &self,
        wallet: &WalletAddress,
        player_id: &PlayerId,
        space_id: &SpaceId,
        catalog: &RegionCatalog,
    ) -> PermissionSnapshot {
        let needs_listing = catalog
            .regions()
            .any(|r| matches!(r.gate, AccessGate::Listed));

        let permitted: HashSet<String> = if needs_listing {
            match bounded(
                "permission",
                self.timeout,
                self.permissions.permitted_regions(wallet, space_id),
            )
            .await
            {
                Ok(permitted) => permitted,
                Err(e) => {
                    warn!(
                        space_id = %space_id,
                        player_id = %player_id,
                        wallet = %wallet,
                        error = %e,
                        "Permitted-region lookup failed, denying listed regions"
                    );
                    HashSet::new()
                }
            }
        } else {
            HashSet::new()
        };

        let mut holdings: HashMap<&str, bool> = HashMap::new();
        let mut snapshot = PermissionSnapshot::new();

        for region in catalog.regions() {
            let allowed = match &region.gate {
                AccessGate::Listed => permitted.contains(&region.name),
                AccessGate::TokenHolding { contract } => {
                    if let Some(held) = holdings.get(contract.as_str()) {
                        *held
                    } else {
                        let held = self.holds_token(wallet, contract, space_id).await;
                        holdings.insert(contract.as_str(), held);
                        held
                    }
                }
            };

            debug!(
                space_id = %space_id,
                player_id = %player_id,
                region = %region.name,
                allowed,
                "Region verdict"
            );
            snapshot.set(region.name.clone(), allowed);
        }

        snapshot
    }

    async fn holds_token(&self, wallet: &WalletAddress, contract: &str, space_id: &SpaceId) -> bool {
        match bounded(
            "token holding",
            self.timeout,
            self.permissions.holds_token(wallet, contract),
        )
        .await
        {
            Ok(held) => held,
            Err(e) => {
                warn!(
                    space_id = %space_id,
                    wallet = %wallet,
                    contract = %contract,
                    error = %e,
                    "Token holding lookup failed, denying"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Region;
    use async_trait::async_trait;
    use spacegate_types::{Point, Rect};

    struct FixedIdentity(Option<WalletAddress>);

    #[async_trait]
    impl IdentityResolver for FixedIdentity {
        async fn linked_wallet(
            &self,
            _player_id: &PlayerId,
            _service: &str,
        ) -> AccessResult<Option<WalletAddress>> {
            Ok(self.0.clone())
        }
    }

    struct FixedPermissions {
        permitted: AccessResult<HashSet<String>>,
        contracts: HashSet<String>,
    }

    #[async_trait]
    impl PermissionSource for FixedPermissions {
        async fn permitted_regions(
            &self,
            _wallet: &WalletAddress,
            _space_id: &SpaceId,
        ) -> AccessResult<HashSet<String>> {
            self.permitted.clone()
        }

        async fn holds_token(&self, _wallet: &WalletAddress, contract: &str) -> AccessResult<bool> {
            Ok(self.contracts.contains(contract))
        }
    }

    struct StalledPermissions;

    #[async_trait]
    impl PermissionSource for StalledPermissions {
        async fn permitted_regions(
            &self,
            _wallet: &WalletAddress,
            _space_id: &SpaceId,
        ) -> AccessResult<HashSet<String>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(HashSet::from(["balcony".to_string()]))
        }

        async fn holds_token(&self, _wallet: &WalletAddress, _contract: &str) -> AccessResult<bool> {
            Ok(true)
        }
    }

    fn catalog() -> RegionCatalog {
        let r = Rect::new(Point::new(0, 0), Point::new(1, 1)).unwrap();
        RegionCatalog::from_regions(vec![
            Region::new("balcony", r, ""),
            Region::new("roofTop", r, ""),
            Region::new("records", r, "").with_gate(AccessGate::TokenHolding {
                contract: "0xc0ffee".into(),
            }),
        ])
        .unwrap()
    }

    fn resolver(
        wallet: Option<&str>,
        permissions: Arc<dyn PermissionSource>,
    ) -> PermissionResolver {
        PermissionResolver::new(
            Arc::new(FixedIdentity(wallet.map(WalletAddress::new))),
            permissions,
            &AccessConfig::default().with_lookup_timeout(Duration::from_millis(50)),
        )
    }

    #[tokio::test]
    async fn test_no_wallet_denies_everything() {
        let permissions = Arc::new(FixedPermissions {
            permitted: Ok(HashSet::from(["balcony".to_string()])),
            contracts: HashSet::from(["0xc0ffee".to_string()]),
        });
        let snapshot = resolver(None, permissions)
            .resolve(&PlayerId::new("p"), &SpaceId::new("s"), &catalog())
            .await;

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.allowed_regions().count(), 0);
    }

    #[tokio::test]
    async fn test_membership_and_token_gates() {
        let permissions = Arc::new(FixedPermissions {
            permitted: Ok(HashSet::from(["balcony".to_string(), "unknown".to_string()])),
            contracts: HashSet::from(["0xc0ffee".to_string()]),
        });
        let snapshot = resolver(Some("0xAA"), permissions)
            .resolve(&PlayerId::new("p"), &SpaceId::new("s"), &catalog())
            .await;

        assert_eq!(snapshot.get("balcony"), Some(true));
        assert_eq!(snapshot.get("roofTop"), Some(false));
        assert_eq!(snapshot.get("records"), Some(true));
        assert_eq!(snapshot.get("unknown"), None);
    }

    #[tokio::test]
    async fn test_lookup_error_fails_closed() {
        let permissions = Arc::new(FixedPermissions {
            permitted: Err(AccessError::lookup("permission", "connection refused")),
            contracts: HashSet::new(),
        });
        let snapshot = resolver(Some("0xAA"), permissions)
            .resolve(&PlayerId::new("p"), &SpaceId::new("s"), &catalog())
            .await;

        assert!(snapshot.covers(&catalog()));
        assert_eq!(snapshot.allowed_regions().count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_timeout_fails_closed() {
        let snapshot = resolver(Some("0xAA"), Arc::new(StalledPermissions))
            .resolve(&PlayerId::new("p"), &SpaceId::new("s"), &catalog())
            .await;

        assert_eq!(snapshot.get("balcony"), Some(false));
        assert_eq!(snapshot.get("records"), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_reports_timeout() {
        let result: AccessResult<()> = bounded("wallet", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(())
        })
        .await;

        assert!(matches!(
            result,
            Err(AccessError::LookupTimeout { lookup: "wallet", timeout_ms: 10 })
        ));
    }
}
