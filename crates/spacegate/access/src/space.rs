//! Per-space settings the engine is built from.

use crate::catalog::RegionCatalog;
use crate::error::{AccessError, AccessResult};
use spacegate_types::{Location, MapId, Point, SpaceId, WalletAddress};

/// Everything the engine needs to know about one space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceDefinition {
    pub id: SpaceId,
    pub catalog: RegionCatalog,
    /// Where joining players are placed; `None` leaves them where they land.
    pub spawn: Option<Location>,
    /// Wallet allowed to issue moderator commands.
    pub owner: Option<WalletAddress>,
}

impl SpaceDefinition {
    pub fn new(id: SpaceId, catalog: RegionCatalog) -> Self {
        Self {
            id,
            catalog,
            spawn: None,
            owner: None,
        }
    }

    pub fn with_spawn(mut self, spawn: Location) -> Self {
        self.spawn = Some(spawn);
        self
    }

    pub fn with_owner(mut self, owner: WalletAddress) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Parse a spawn location stored as a map name plus `"x,y"` text.
    pub fn parse_spawn(map: &str, coordinates: &str) -> AccessResult<Location> {
        let position: Point = coordinates
            .parse()
            .map_err(|e| AccessError::configuration("<spawn>", e))?;
        Ok(Location::new(MapId::new(map), position))
    }

    /// Whether `wallet` may moderate this space.
    pub fn is_owner(&self, wallet: &WalletAddress) -> bool {
        self.owner.as_ref() == Some(wallet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spawn() {
        let spawn = SpaceDefinition::parse_spawn("lobby", "31, 32").unwrap();
        assert_eq!(spawn.map, MapId::new("lobby"));
        assert_eq!(spawn.position, Point::new(31, 32));
        assert!(SpaceDefinition::parse_spawn("lobby", "31").is_err());
    }

    #[test]
    fn test_owner_check_ignores_case() {
        let space = SpaceDefinition::new(SpaceId::new("s"), RegionCatalog::new())
            .with_owner(WalletAddress::new("0xABC"));
        assert!(space.is_owner(&WalletAddress::new("0xabc")));
        assert!(!space.is_owner(&WalletAddress::new("0xdef")));

        let unowned = SpaceDefinition::new(SpaceId::new("s"), RegionCatalog::new());
        assert!(!unowned.is_owner(&WalletAddress::new("0xabc")));
    }
}
