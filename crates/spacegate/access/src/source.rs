//! External collaborators consulted when computing permissions.

use crate::error::AccessResult;
use async_trait::async_trait;
use spacegate_types::{PlayerId, SpaceId, WalletAddress};
use std::collections::HashSet;

/// Resolves a player's linked wallet.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Wallet linked to `player_id` for `service`, or `None` if the player
    /// never connected one.
    async fn linked_wallet(
        &self,
        player_id: &PlayerId,
        service: &str,
    ) -> AccessResult<Option<WalletAddress>>;
}

/// Answers which regions a wallet may enter.
#[async_trait]
pub trait PermissionSource: Send + Sync {
    /// Names of the regions of `space_id` the wallet is permitted to enter.
    async fn permitted_regions(
        &self,
        wallet: &WalletAddress,
        space_id: &SpaceId,
    ) -> AccessResult<HashSet<String>>;

    /// Whether the wallet holds any token of `contract`.
    async fn holds_token(&self, wallet: &WalletAddress, contract: &str) -> AccessResult<bool>;
}
