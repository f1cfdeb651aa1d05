//! Recheck jobs queued by the external permission indexer.

use crate::ids::{JobId, PlayerId, SpaceId, WalletAddress};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A pending job from the permission-source queue.
///
/// `message` is the raw queue payload, `check:<wallet>:<space>:<player>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecheckJob {
    pub id: JobId,
    pub message: String,
    pub requested_at: DateTime<Utc>,
}

impl RecheckJob {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: JobId::generate(),
            message: message.into(),
            requested_at: Utc::now(),
        }
    }

    /// Build the canonical `check` payload for a player.
    pub fn check(wallet: &WalletAddress, space_id: &SpaceId, player_id: &PlayerId) -> Self {
        Self::new(format!(
            "check:{}:{}:{}",
            wallet.as_str(),
            space_id.as_str(),
            player_id.as_str()
        ))
    }

    pub fn request(&self) -> Result<RecheckRequest, JobParseError> {
        self.message.parse()
    }
}

/// A decoded `check` job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecheckRequest {
    pub wallet: WalletAddress,
    pub space_id: SpaceId,
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobParseError {
    #[error("unsupported job action '{0}'")]
    UnsupportedAction(String),

    #[error("malformed job payload '{0}'")]
    Malformed(String),
}

impl std::str::FromStr for RecheckRequest {
    type Err = JobParseError;

    // Space ids may themselves contain ':' so the player id is taken from the
    // right and the space id is whatever sits between wallet and player.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || JobParseError::Malformed(s.to_string());

        let (action, rest) = s.split_once(':').ok_or_else(malformed)?;
        if action != "check" {
            return Err(JobParseError::UnsupportedAction(action.to_string()));
        }
        let (wallet, rest) = rest.split_once(':').ok_or_else(malformed)?;
        let (space, player) = rest.rsplit_once(':').ok_or_else(malformed)?;

        if wallet.is_empty() || space.is_empty() || player.is_empty() {
            return Err(malformed());
        }

        Ok(RecheckRequest {
            wallet: WalletAddress::new(wallet),
            space_id: SpaceId::new(space),
            player_id: PlayerId::new(player),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check_job() {
        let job = RecheckJob::new("check:0xABC:space\\one:player-9");
        let request = job.request().unwrap();
        assert_eq!(request.wallet, WalletAddress::new("0xabc"));
        assert_eq!(request.space_id, SpaceId::new("space\\one"));
        assert_eq!(request.player_id, PlayerId::new("player-9"));
    }

    #[test]
    fn test_check_round_trip() {
        let job = RecheckJob::check(
            &WalletAddress::new("0x1"),
            &SpaceId::new("s"),
            &PlayerId::new("p"),
        );
        assert_eq!(job.message, "check:0x1:s:p");
        assert!(job.request().is_ok());
    }

    #[test]
    fn test_unsupported_action() {
        let err = "purge:0x1:s:p".parse::<RecheckRequest>().unwrap_err();
        assert_eq!(err, JobParseError::UnsupportedAction("purge".into()));
    }

    #[test]
    fn test_malformed_job() {
        assert!("check:0x1".parse::<RecheckRequest>().is_err());
        assert!("check".parse::<RecheckRequest>().is_err());
        assert!("check::s:p".parse::<RecheckRequest>().is_err());
    }
}
