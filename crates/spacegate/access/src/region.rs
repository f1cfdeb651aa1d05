//! Restricted regions.
//!
//! A region is a named rectangle on (optionally) one map, guarded by a
//! permission predicate. Regions arrive from the directory as loosely typed
//! JSON records and are validated into [`Region`] before use.

use crate::error::{AccessError, AccessResult};
use serde::{Deserialize, Deserializer, Serialize};
use spacegate_types::{MapId, Point, Rect};

/// Wire form of a region as stored in the directory.
///
/// Coordinates are `"x, y"` strings and the wall thickness may be a number or
/// a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionRecord {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,

    pub top_left: String,

    pub bottom_right: String,

    #[serde(
        default,
        deserialize_with = "lenient_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub wall_thickness: Option<i64>,

    /// Human-readable requirement shown to denied players.
    #[serde(default)]
    pub humanised: String,

    /// Contract whose tokens unlock the region; absent for listed regions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_contract: Option<String>,
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        Str(String),
    }

    match Option::<IntOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IntOrString::Int(v)) => Ok(Some(v)),
        Some(IntOrString::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(IntOrString::Str(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Predicate deciding who may enter a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessGate {
    /// Allowed when the permission source lists the region for the wallet.
    Listed,
    /// Allowed when the wallet holds a token of `contract` (lowercase hex).
    TokenHolding { contract: String },
}

/// A validated restricted region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    /// Map the region lives on; `None` matches every map.
    pub map: Option<MapId>,
    pub bounds: Rect,
    pub wall_thickness: i64,
    pub requirement: String,
    pub gate: AccessGate,
}

impl Region {
    /// Create a listed region with no wall tolerance.
    pub fn new(name: impl Into<String>, bounds: Rect, requirement: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            map: None,
            bounds,
            wall_thickness: 0,
            requirement: requirement.into(),
            gate: AccessGate::Listed,
        }
    }

    pub fn on_map(mut self, map: MapId) -> Self {
        self.map = Some(map);
        self
    }

    pub fn with_wall_thickness(mut self, thickness: i64) -> Self {
        self.wall_thickness = thickness;
        self
    }

    pub fn with_gate(mut self, gate: AccessGate) -> Self {
        self.gate = gate;
        self
    }

    /// Validate a directory record. `default_wall_thickness` applies when the
    /// record does not carry its own.
    pub fn from_record(record: &RegionRecord, default_wall_thickness: i64) -> AccessResult<Self> {
        let name = record.name.trim();
        if name.is_empty() {
            return Err(AccessError::configuration("<unnamed>", "region name is empty"));
        }

        let top_left: Point = record
            .top_left
            .parse()
            .map_err(|e| AccessError::configuration(name, e))?;
        let bottom_right: Point = record
            .bottom_right
            .parse()
            .map_err(|e| AccessError::configuration(name, e))?;
        let bounds =
            Rect::new(top_left, bottom_right).map_err(|e| AccessError::configuration(name, e))?;

        let gate = match record.token_contract.as_deref().map(str::trim) {
            Some(contract) if !contract.is_empty() => AccessGate::TokenHolding {
                contract: contract.to_ascii_lowercase(),
            },
            _ => AccessGate::Listed,
        };

        Ok(Self {
            name: name.to_string(),
            map: record
                .map
                .as_deref()
                .filter(|m| !m.is_empty())
                .map(MapId::new),
            bounds,
            wall_thickness: record.wall_thickness.unwrap_or(default_wall_thickness),
            requirement: record.humanised.clone(),
            gate,
        })
    }

    /// Whether a player standing at `point` on `map` is inside this region,
    /// wall tolerance included. A region bound to another map never matches.
    pub fn contains(&self, map: &MapId, point: Point) -> bool {
        if let Some(region_map) = &self.map {
            if region_map != map {
                return false;
            }
        }
        self.bounds.contains(point, self.wall_thickness)
    }

    pub fn center(&self) -> Point {
        self.bounds.center()
    }

    /// Private message shown to a player expelled from this region.
    pub fn denial_message(&self) -> String {
        format!("DENIED ACCESS[{}]:\n{}", self.name, self.requirement)
    }
}
