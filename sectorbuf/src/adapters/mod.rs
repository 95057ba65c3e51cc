//! Adapter layer - concrete implementations connecting the domain to
//! devices.
//!
//! The adapters implement the domain's [`SectorStore`] port over actual
//! flash hardware (or simulations of it):
//!
//! - **[`FlushEngine`]**: commits windows to any [`SectorFlash`] through
//!   the erase-then-program sequence
//! - **[`MemFlash`]**: RAM-backed simulator with NOR semantics
//! - **[`NorSectorFlash`]**: adapter for `embedded-storage` NOR flash
//!   drivers (feature `embedded-storage`)
//!
//! [`SectorStore`]: crate::domain::SectorStore
//! [`SectorFlash`]: sectorbuf_flash_device::SectorFlash

mod flush_engine;
mod mem_flash;

#[cfg(feature = "embedded-storage")]
mod nor_flash_adapter;

pub use flush_engine::FlushEngine;
pub use mem_flash::{MemFlash, MemFlashError};

#[cfg(feature = "embedded-storage")]
pub use nor_flash_adapter::{NorFlashIoError, NorRegionConfig, NorSectorFlash};

use crate::domain::{GeometryError, SectorBuffer, SectorLayout, StorageGeometry};
use sectorbuf_flash_device::SectorFlash;

/// Stack-windowed buffer wired directly over a flash device.
pub type FlashBuffer<F, const W: usize> = SectorBuffer<FlushEngine<F>, [u8; W]>;

impl<F: SectorFlash, const W: usize> FlashBuffer<F, W> {
    /// Wire `flash` through a [`FlushEngine`] resolving erase sectors via
    /// `layout`, with region offset 0 at physical `base_address`.
    pub fn for_flash(
        flash: F,
        layout: SectorLayout,
        base_address: u32,
        geometry: StorageGeometry,
    ) -> Result<Self, GeometryError> {
        Self::new_stack(FlushEngine::new(flash, layout, base_address), geometry)
    }
}

/// Heap-windowed buffer wired directly over a flash device.
#[cfg(feature = "alloc")]
pub type HeapFlashBuffer<F> = SectorBuffer<FlushEngine<F>, alloc::vec::Vec<u8>>;

#[cfg(feature = "alloc")]
impl<F: SectorFlash> HeapFlashBuffer<F> {
    /// Wire `flash` through a [`FlushEngine`] resolving erase sectors via
    /// `layout`, with region offset 0 at physical `base_address`.
    pub fn for_flash(
        flash: F,
        layout: SectorLayout,
        base_address: u32,
        geometry: StorageGeometry,
    ) -> Self {
        Self::new(FlushEngine::new(flash, layout, base_address), geometry)
    }
}
