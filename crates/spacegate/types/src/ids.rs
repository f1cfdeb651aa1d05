//! Strongly-typed identifiers for spacegate entities
//!
//! Space, player and map identifiers are opaque provider strings wrapped in
//! newtypes so they cannot be mixed up at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a monitored virtual space (provider path, e.g. `abc123\office`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceId(String);

impl SpaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "space:{}", self.0)
    }
}

/// Identifier of a player inside the world provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player:{}", self.0)
    }
}

/// Identifier of a map within a space
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapId(String);

impl MapId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// On-chain wallet address.
///
/// Addresses are hex strings whose case carries no meaning, so they are
/// normalized to lowercase on construction and compare case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn new(address: impl AsRef<str>) -> Self {
        Self(address.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for WalletAddress {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a queued permission recheck job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_address_is_case_insensitive() {
        let a = WalletAddress::new("0xAbCdEf");
        let b = WalletAddress::new(" 0xabcdef ");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "0xabcdef");
    }

    #[test]
    fn test_wallet_address_deserialize_normalizes() {
        let wallet: WalletAddress = serde_json::from_str("\"0xDEAD\"").unwrap();
        assert_eq!(wallet.as_str(), "0xdead");
    }

    #[test]
    fn test_job_id_generation() {
        let id1 = JobId::generate();
        let id2 = JobId::generate();
        assert_ne!(id1, id2);
        assert!(id1.to_string().starts_with("job:"));
    }

    #[test]
    fn test_space_id_display() {
        let id = SpaceId::new("abc\\office");
        assert_eq!(id.to_string(), "space:abc\\office");
        assert_eq!(id.as_str(), "abc\\office");
    }
}
