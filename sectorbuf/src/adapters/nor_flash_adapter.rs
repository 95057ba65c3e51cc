//! Adapter for `embedded-storage` NOR flash drivers.
//!
//! This module wraps types implementing the `embedded-storage` NOR flash
//! traits and exposes them as a [`SectorFlash`], so external SPI NOR
//! parts and similar uniform-sector devices can sit under the flush
//! engine.

use core::cell::UnsafeCell;
use core::fmt;

use crate::domain::value_objects::SectorLayout;
use embedded_storage::nor_flash::{NorFlash, ReadNorFlash};
use sectorbuf_flash_device::SectorFlash;

/// Region of a uniform-sector NOR device handed to the buffer.
#[derive(Debug, Clone, Copy)]
pub struct NorRegionConfig {
    /// Byte offset of the region on the device; must be erase-aligned.
    pub start_offset: u32,
    /// Number of erase sectors in the region.
    pub sector_count: u32,
}

impl NorRegionConfig {
    /// Create a new region configuration.
    pub const fn new(start_offset: u32, sector_count: u32) -> Self {
        Self {
            start_offset,
            sector_count,
        }
    }
}

/// Error type for NOR flash operations.
///
/// `embedded-storage` error types only expose a device error kind, so
/// failures are collapsed into this unit error.
#[derive(Debug, Clone, Copy)]
pub struct NorFlashIoError;

impl fmt::Display for NorFlashIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NOR flash operation failed")
    }
}

impl core::error::Error for NorFlashIoError {}

/// Adapter exposing an `embedded-storage` NOR flash as a [`SectorFlash`].
///
/// The wrapped device has uniform erase sectors of `F::ERASE_SIZE` bytes;
/// sector indices count from device offset 0, so the matching layout for
/// a [`FlushEngine`](crate::adapters::FlushEngine) is
/// [`NorSectorFlash::layout`] with the engine's base address set to the
/// region's `start_offset`.
///
/// The device needs no unlock/lock pair; write enable is the driver's
/// business, so both are no-ops here.
///
/// # Safety
///
/// This type uses `UnsafeCell` for interior mutability because the
/// `embedded-storage` read path takes `&mut self` while
/// [`SectorFlash::read`] takes `&self`. This is safe in single-threaded
/// embedded contexts; multi-threaded use must synchronize externally.
pub struct NorSectorFlash<F> {
    flash: UnsafeCell<F>,
    config: NorRegionConfig,
}

// SAFETY: NorSectorFlash is Send if F is Send; the UnsafeCell is only
// used for interior mutability in single-threaded contexts.
unsafe impl<F: Send> Send for NorSectorFlash<F> {}

// SAFETY: NorSectorFlash is Sync if F is Sync; access must be externally
// synchronized in multi-threaded contexts.
unsafe impl<F: Sync> Sync for NorSectorFlash<F> {}

impl<F: NorFlash + ReadNorFlash> NorSectorFlash<F> {
    /// Create a new adapter for the given region.
    ///
    /// # Panics
    ///
    /// Panics if `start_offset` is not aligned to the device erase size.
    pub fn new(flash: F, config: NorRegionConfig) -> Self {
        assert!(
            config.start_offset as usize % F::ERASE_SIZE == 0,
            "start_offset must be erase-aligned"
        );
        Self {
            flash: UnsafeCell::new(flash),
            config,
        }
    }

    /// Get the region configuration.
    pub fn config(&self) -> &NorRegionConfig {
        &self.config
    }

    /// Consume the adapter and return the underlying flash.
    pub fn into_inner(self) -> F {
        self.flash.into_inner()
    }

    /// The layout resolving erase sectors for this device: uniform
    /// sectors counted from device offset 0.
    pub fn layout(&self) -> SectorLayout {
        SectorLayout::Uniform {
            base: 0,
            erase_size: F::ERASE_SIZE as u32,
        }
    }

    /// Get mutable access to the flash (internal use).
    #[inline]
    fn flash_mut(&self) -> &mut F {
        // SAFETY: safe in single-threaded embedded contexts
        unsafe { &mut *self.flash.get() }
    }

    /// First device sector index belonging to the region.
    #[inline]
    fn first_sector(&self) -> u32 {
        self.config.start_offset / F::ERASE_SIZE as u32
    }
}

impl<F: NorFlash + ReadNorFlash> SectorFlash for NorSectorFlash<F> {
    type Error = NorFlashIoError;

    fn capacity(&self) -> u32 {
        self.config.sector_count * F::ERASE_SIZE as u32
    }

    fn read(&self, offset: u32, dest: &mut [u8]) -> Result<(), Self::Error> {
        self.flash_mut()
            .read(self.config.start_offset + offset, dest)
            .map_err(|_| NorFlashIoError)
    }

    fn unlock(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn lock(&mut self) {}

    fn erase_sector(&mut self, sector: u32) -> Result<(), Self::Error> {
        let first = self.first_sector();
        if sector < first || sector >= first + self.config.sector_count {
            return Err(NorFlashIoError);
        }
        let from = sector * F::ERASE_SIZE as u32;
        self.flash_mut()
            .erase(from, from + F::ERASE_SIZE as u32)
            .map_err(|_| NorFlashIoError)
    }

    fn program_word(&mut self, offset: u32, word: u32) -> Result<(), Self::Error> {
        self.flash_mut()
            .write(self.config.start_offset + offset, &word.to_le_bytes())
            .map_err(|_| NorFlashIoError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FlushEngine;
    use crate::domain::{SectorBuffer, SectorStore, StorageGeometry};

    const SECTOR: usize = 4096;

    /// Mock NOR flash for testing
    struct MockNor {
        data: [[u8; SECTOR]; 16],
    }

    impl MockNor {
        fn new() -> Self {
            Self {
                data: [[0xFF; SECTOR]; 16],
            }
        }
    }

    #[derive(Debug)]
    struct MockNorError;

    impl embedded_storage::nor_flash::NorFlashError for MockNorError {
        fn kind(&self) -> embedded_storage::nor_flash::NorFlashErrorKind {
            embedded_storage::nor_flash::NorFlashErrorKind::Other
        }
    }

    impl embedded_storage::nor_flash::ErrorType for MockNor {
        type Error = MockNorError;
    }

    impl ReadNorFlash for MockNor {
        const READ_SIZE: usize = 1;

        fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
            let sector = (offset / SECTOR as u32) as usize;
            let sector_offset = (offset % SECTOR as u32) as usize;
            if sector < self.data.len() && sector_offset + bytes.len() <= SECTOR {
                bytes.copy_from_slice(&self.data[sector][sector_offset..sector_offset + bytes.len()]);
                Ok(())
            } else {
                Err(MockNorError)
            }
        }

        fn capacity(&self) -> usize {
            self.data.len() * SECTOR
        }
    }

    impl NorFlash for MockNor {
        const WRITE_SIZE: usize = 1;
        const ERASE_SIZE: usize = SECTOR;

        fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
            let start = (from / SECTOR as u32) as usize;
            let end = ((to + SECTOR as u32 - 1) / SECTOR as u32) as usize;
            for sector in start..end.min(self.data.len()) {
                self.data[sector] = [0xFF; SECTOR];
            }
            Ok(())
        }

        fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
            let sector = (offset / SECTOR as u32) as usize;
            let sector_offset = (offset % SECTOR as u32) as usize;
            if sector < self.data.len() && sector_offset + bytes.len() <= SECTOR {
                for (cell, &b) in self.data[sector][sector_offset..sector_offset + bytes.len()]
                    .iter_mut()
                    .zip(bytes)
                {
                    *cell &= b;
                }
                Ok(())
            } else {
                Err(MockNorError)
            }
        }
    }

    #[test]
    fn test_adapter_round_trip() {
        let config = NorRegionConfig::new(0x4000, 4);
        let mut adapter = NorSectorFlash::new(MockNor::new(), config);

        adapter.erase_sector(4).unwrap();
        adapter.program_word(0, 0x0403_0201).unwrap();

        let mut out = [0u8; 4];
        adapter.read(0, &mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn test_erase_outside_region_rejected() {
        let config = NorRegionConfig::new(0x4000, 4);
        let mut adapter = NorSectorFlash::new(MockNor::new(), config);

        assert!(adapter.erase_sector(0).is_err());
        assert!(adapter.erase_sector(8).is_err());
        assert!(adapter.erase_sector(7).is_ok());
    }

    #[test]
    #[should_panic(expected = "erase-aligned")]
    fn test_unaligned_region_rejected() {
        let _ = NorSectorFlash::new(MockNor::new(), NorRegionConfig::new(0x100, 4));
    }

    #[test]
    fn test_engine_commit_erases_before_program() {
        let config = NorRegionConfig::new(0x4000, 4);
        let adapter = NorSectorFlash::new(MockNor::new(), config);
        let layout = adapter.layout();
        let mut engine = FlushEngine::new(adapter, layout, config.start_offset);

        // first image
        let mut image = [0xFFu8; SECTOR];
        image[0] = 0xF0;
        engine.commit(0, &image).unwrap();

        // rewrite with bits the previous image had cleared; without the
        // erase the AND semantics would corrupt this
        image[0] = 0x0F;
        engine.commit(0, &image).unwrap();

        let mut out = [0u8; 1];
        engine.load(0, &mut out).unwrap();
        assert_eq!(out[0], 0x0F);
    }

    #[test]
    fn test_buffer_over_nor_region() {
        let config = NorRegionConfig::new(0x4000, 4);
        let adapter = NorSectorFlash::new(MockNor::new(), config);
        let layout = adapter.layout();
        let engine = FlushEngine::new(adapter, layout, config.start_offset);
        let geometry = StorageGeometry::new(4 * SECTOR as u32, SECTOR as u32, 512).unwrap();
        let mut buffer: SectorBuffer<_, [u8; SECTOR]> =
            SectorBuffer::new_stack(engine, geometry).unwrap();

        buffer.write(10, b"hello").unwrap();
        let mut out = [0u8; 5];
        buffer.read(10, &mut out).unwrap();
        assert_eq!(&out, b"hello");
    }
}
