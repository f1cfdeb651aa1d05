//! Region catalog for a single space.

use crate::error::{AccessError, AccessResult};
use crate::region::{Region, RegionRecord};
use spacegate_types::{MapId, Point, SpaceId};
use std::collections::HashSet;

/// The ordered set of restricted regions of one space.
///
/// Order is the directory's declaration order; `/list` enumerates in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionCatalog {
    regions: Vec<Region>,
}

impl RegionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, rejecting duplicate region names.
    pub fn from_regions(regions: Vec<Region>) -> AccessResult<Self> {
        let mut seen = HashSet::new();
        for region in &regions {
            if !seen.insert(region.name.as_str()) {
                return Err(AccessError::configuration(
                    region.name.clone(),
                    "duplicate region name",
                ));
            }
        }
        Ok(Self { regions })
    }

    pub fn from_records(records: &[RegionRecord], default_wall_thickness: i64) -> AccessResult<Self> {
        let regions = records
            .iter()
            .map(|record| Region::from_record(record, default_wall_thickness))
            .collect::<AccessResult<Vec<_>>>()?;
        Self::from_regions(regions)
    }

    /// Decode the directory's serialized region list. An empty string is an
    /// empty catalog.
    pub fn from_json(
        space_id: &SpaceId,
        json: &str,
        default_wall_thickness: i64,
    ) -> AccessResult<Self> {
        if json.trim().is_empty() {
            return Ok(Self::new());
        }
        let records: Vec<RegionRecord> =
            serde_json::from_str(json).map_err(|e| AccessError::CatalogDecode {
                space_id: space_id.clone(),
                reason: e.to_string(),
            })?;
        Self::from_records(&records, default_wall_thickness)
    }

    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Regions whose rectangle (with tolerance) covers `point` on `map`.
    pub fn containing<'a>(
        &'a self,
        map: &'a MapId,
        point: Point,
    ) -> impl Iterator<Item = &'a Region> + 'a {
        self.regions.iter().filter(move |r| r.contains(map, point))
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|r| r.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
