//! File-backed flash image.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sectorbuf::{SectorId, SectorLayout};
use sectorbuf_flash_device::{SectorFlash, ERASED_BYTE, WORD_SIZE};

/// Flash image loaded from disk, with the same lock and NOR programming
/// semantics as the hardware it stands in for.
pub struct ImageFlash {
    path: PathBuf,
    mem: Vec<u8>,
    layout: SectorLayout,
    base_address: u32,
    locked: bool,
}

impl ImageFlash {
    /// Load `path`, padding or truncating to `capacity`. A missing file
    /// starts fully erased.
    pub fn open(
        path: &Path,
        capacity: usize,
        layout: SectorLayout,
        base_address: u32,
    ) -> Result<Self> {
        let mut mem = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading image {}", path.display()));
            }
        };
        mem.resize(capacity, ERASED_BYTE);
        Ok(Self {
            path: path.to_path_buf(),
            mem,
            layout,
            base_address,
            locked: true,
        })
    }

    /// Write the image back to disk.
    pub fn persist(&self) -> Result<()> {
        fs::write(&self.path, &self.mem)
            .with_context(|| format!("writing image {}", self.path.display()))
    }
}

/// Errors reported by the image device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFlashError {
    /// Program or erase attempted while the engine is locked.
    Locked,
    /// Access past the image capacity.
    OutOfBounds,
    /// Program offset not word-aligned.
    Unaligned,
    /// Erase of a sector the layout does not describe.
    UnknownSector,
}

impl std::fmt::Display for ImageFlashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locked => write!(f, "Program/erase engine is locked"),
            Self::OutOfBounds => write!(f, "Access past the image capacity"),
            Self::Unaligned => write!(f, "Program offset is not word-aligned"),
            Self::UnknownSector => write!(f, "Sector not described by the layout"),
        }
    }
}

impl std::error::Error for ImageFlashError {}

impl SectorFlash for ImageFlash {
    type Error = ImageFlashError;

    fn capacity(&self) -> u32 {
        self.mem.len() as u32
    }

    fn read(&self, offset: u32, dest: &mut [u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        let end = start
            .checked_add(dest.len())
            .ok_or(ImageFlashError::OutOfBounds)?;
        if end > self.mem.len() {
            return Err(ImageFlashError::OutOfBounds);
        }
        dest.copy_from_slice(&self.mem[start..end]);
        Ok(())
    }

    fn unlock(&mut self) -> Result<(), Self::Error> {
        self.locked = false;
        Ok(())
    }

    fn lock(&mut self) {
        self.locked = true;
    }

    fn erase_sector(&mut self, sector: u32) -> Result<(), Self::Error> {
        if self.locked {
            return Err(ImageFlashError::Locked);
        }
        let (start, len) = self
            .layout
            .sector_span(SectorId::new(sector))
            .ok_or(ImageFlashError::UnknownSector)?;

        let region_start = self.base_address as u64;
        let region_end = region_start + self.mem.len() as u64;
        let lo = (start as u64).max(region_start);
        let hi = (start as u64 + len as u64).min(region_end);
        if lo < hi {
            let a = (lo - region_start) as usize;
            let b = (hi - region_start) as usize;
            self.mem[a..b].fill(ERASED_BYTE);
        }
        Ok(())
    }

    fn program_word(&mut self, offset: u32, word: u32) -> Result<(), Self::Error> {
        if self.locked {
            return Err(ImageFlashError::Locked);
        }
        if offset as usize % WORD_SIZE != 0 {
            return Err(ImageFlashError::Unaligned);
        }
        let start = offset as usize;
        let end = start + WORD_SIZE;
        if end > self.mem.len() {
            return Err(ImageFlashError::OutOfBounds);
        }
        for (byte, new) in self.mem[start..end].iter_mut().zip(word.to_le_bytes()) {
            *byte &= new;
        }
        Ok(())
    }
}
