//! Geo module - static region reference data

mod regions;

pub use regions::{GeoError, Region, RegionLookup, RegionMarker};
