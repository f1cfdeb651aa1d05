//! Error types for the access engine.
//!
//! None of these are fatal to the process: each is scoped to one space or one
//! player interaction.

use spacegate_types::SpaceId;
use thiserror::Error;

/// Errors that can occur while building catalogs, resolving permissions or
/// handling moderator commands.
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    /// A region record is malformed (bad coordinates, inverted rectangle,
    /// duplicate name).
    #[error("invalid region '{region}': {reason}")]
    Configuration { region: String, reason: String },

    /// The serialized region list could not be decoded at all.
    #[error("invalid region list for {space_id}: {reason}")]
    CatalogDecode { space_id: SpaceId, reason: String },

    /// An external lookup returned an error.
    #[error("{lookup} lookup failed: {reason}")]
    Lookup { lookup: &'static str, reason: String },

    /// An external lookup did not answer in time.
    #[error("{lookup} lookup timed out after {timeout_ms}ms")]
    LookupTimeout { lookup: &'static str, timeout_ms: u64 },

    /// A moderator command could not be parsed.
    #[error("{0}")]
    CommandParse(String),

    /// A moderator command referenced a player or area that does not exist.
    #[error("unknown {kind} '{name}'")]
    UnknownTarget { kind: &'static str, name: String },
}

impl AccessError {
    pub fn configuration(region: impl Into<String>, reason: impl ToString) -> Self {
        AccessError::Configuration {
            region: region.into(),
            reason: reason.to_string(),
        }
    }

    pub fn lookup(lookup: &'static str, reason: impl ToString) -> Self {
        AccessError::Lookup {
            lookup,
            reason: reason.to_string(),
        }
    }

    /// Errors that are reported back to a moderator as a private chat.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AccessError::CommandParse(_) | AccessError::UnknownTarget { .. }
        )
    }
}

/// Result type for access operations.
pub type AccessResult<T> = Result<T, AccessError>;
