//! Ports define the interfaces between the domain and the outside world.
//!
//! This module contains the **secondary (driven) ports** the buffering
//! protocol depends on for storage access.

mod sector_store;

pub use sector_store::SectorStore;
