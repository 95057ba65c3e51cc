//! Value objects for the domain layer.
//!
//! Immutable, validated data types: the sector index, the region
//! geometry, and the address-to-sector layout tables.

mod geometry;
mod sector_id;
mod sector_layout;

pub use geometry::{BlockGeometry, GeometryError, StorageGeometry};
pub use sector_id::SectorId;
pub use sector_layout::{SectorBand, SectorLayout};
