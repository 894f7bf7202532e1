//! Region Lookup
//! Static marker and boundary coordinates per Brazilian region.

use crate::data::{normalize_key, SummaryTable};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Simplified outlines of the five regions, [lon, lat] pairs.
const DEFAULT_REGIONS: &str = include_str!("../../assets/brazil_regions.json");

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Failed to read region asset: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid region asset: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Region {0} is listed more than once")]
    DuplicateRegion(String),
    #[error("Region {0} has a boundary ring with fewer than 3 points")]
    DegenerateBoundary(String),
}

#[derive(Debug, Deserialize)]
struct RegionFile {
    #[allow(dead_code)]
    version: u32,
    regions: Vec<RawRegion>,
}

#[derive(Debug, Deserialize)]
struct RawRegion {
    name: String,
    marker: [f64; 2],
    boundary: Vec<Vec<[f64; 2]>>,
}

/// One region with its display name and normalized key.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub key: String,
    pub name: String,
    pub marker: [f64; 2],
    pub boundary: Vec<Vec<[f64; 2]>>,
}

/// Marker to draw for a region count.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMarker {
    pub key: String,
    pub name: String,
    pub position: [f64; 2],
    pub count: f64,
}

/// Name → coordinates lookup, keyed by trimmed uppercase name.
#[derive(Debug, Clone)]
pub struct RegionLookup {
    regions: Vec<Region>,
}

impl Default for RegionLookup {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RegionLookup {
    pub fn from_json(text: &str) -> Result<Self, GeoError> {
        let file: RegionFile = serde_json::from_str(text)?;
        let mut regions: Vec<Region> = Vec::with_capacity(file.regions.len());

        for raw in file.regions {
            let key = normalize_key(&raw.name);
            if regions.iter().any(|r| r.key == key) {
                return Err(GeoError::DuplicateRegion(raw.name));
            }
            if raw.boundary.iter().any(|ring| ring.len() < 3) {
                return Err(GeoError::DegenerateBoundary(raw.name));
            }
            regions.push(Region {
                key,
                name: raw.name,
                marker: raw.marker,
                boundary: raw.boundary,
            });
        }

        Ok(Self { regions })
    }

    pub fn from_file(path: &Path) -> Result<Self, GeoError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Lookup bundled with the binary.
    pub fn builtin() -> Self {
        match Self::from_json(DEFAULT_REGIONS) {
            Ok(lookup) => lookup,
            Err(e) => {
                log::error!("Bundled region asset is invalid: {}", e);
                Self {
                    regions: Vec::new(),
                }
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Region> {
        let key = normalize_key(name);
        self.regions.iter().find(|r| r.key == key)
    }

    pub fn marker(&self, name: &str) -> Option<[f64; 2]> {
        self.get(name).map(|r| r.marker)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Display names in asset order.
    pub fn names(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.name.clone()).collect()
    }

    /// Markers for each counted region; keys without coordinates get none.
    pub fn markers_for(&self, counts: &SummaryTable) -> Vec<RegionMarker> {
        counts
            .entries()
            .iter()
            .filter_map(|(label, count)| match self.get(label) {
                Some(region) => Some(RegionMarker {
                    key: region.key.clone(),
                    name: region.name.clone(),
                    position: region.marker,
                    count: *count,
                }),
                None => {
                    log::debug!("No marker for region {:?}", label);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_five_regions() {
        let lookup = RegionLookup::builtin();
        assert_eq!(lookup.regions().len(), 5);
    }

    #[test]
    fn test_lookup_ignores_case_and_padding() {
        let lookup = RegionLookup::builtin();
        let a = lookup.marker(" sul ");
        assert!(a.is_some());
        assert_eq!(a, lookup.marker("SUL"));
        assert_eq!(a, lookup.marker("Sul"));
    }

    #[test]
    fn test_unknown_key_gets_no_marker() {
        let lookup = RegionLookup::builtin();
        let counts: SummaryTable = vec![("SUL".to_string(), 3.0), ("ATLANTIDA".to_string(), 1.0)]
            .into_iter()
            .collect();

        let markers = lookup.markers_for(&counts);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].name, "Sul");
        assert_eq!(markers[0].count, 3.0);
    }

    #[test]
    fn test_duplicate_region_rejected() {
        let json = r#"{"version":1,"regions":[
            {"name":"Sul","marker":[0,0],"boundary":[]},
            {"name":" SUL","marker":[0,0],"boundary":[]}
        ]}"#;
        assert!(matches!(
            RegionLookup::from_json(json),
            Err(GeoError::DuplicateRegion(_))
        ));
    }
}
