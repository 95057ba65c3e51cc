//! SectorBuffer domain service - the write-back orchestration.
//!
//! This module contains the `SectorBuffer` service which implements the
//! buffering protocol reconciling byte-granular client I/O with
//! sector-granular, erase-before-program storage.

use crate::domain::{
    entities::Window,
    error::BufferError,
    ports::SectorStore,
    value_objects::{BlockGeometry, GeometryError, StorageGeometry},
};

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// Write-back buffer over sector-granular storage.
///
/// The service owns the storage port and at most one [`Window`], and
/// enforces the protocol rules:
///
/// - a write allocates (or reuses) the window covering its sector and
///   mutates it in RAM; the commit is deferred,
/// - a write landing in a different sector first commits the pending
///   window, then loads a fresh one (eviction),
/// - a read commits any pending window unconditionally before sampling
///   the backing bytes, so reads always observe buffered writes without a
///   separate window read path,
/// - a failed commit leaves the window in place, so the caller decides
///   whether to retry or give up.
///
/// Calls must be serialized by the caller. A commit blocks until the
/// erase and reprogram of the whole window finish.
///
/// # Type Parameters
///
/// - `S`: the storage implementation (must implement [`SectorStore`])
/// - `T`: the window contents container (`Vec<u8>` for heap, `[u8; N]`
///   for stack)
///
/// # Examples
///
/// ```ignore
/// let mut buffer = SectorBuffer::new_stack(store, geometry)?;
///
/// buffer.write(20000, &[5, 6, 7, 8])?;   // buffered in RAM
/// let mut out = [0u8; 4];
/// buffer.read(20000, &mut out)?;         // commits, then samples storage
/// ```
pub struct SectorBuffer<S: SectorStore, T> {
    store: S,
    geometry: StorageGeometry,
    window: Option<Window<T>>,
}

impl<S: SectorStore, T> SectorBuffer<S, T> {
    /// Configured geometry.
    pub const fn geometry(&self) -> &StorageGeometry {
        &self.geometry
    }

    /// Block-indexed geometry, as reported to an enclosing block
    /// transport.
    pub const fn block_geometry(&self) -> BlockGeometry {
        self.geometry.block_geometry()
    }

    /// The pending window, if a write is buffered.
    pub fn pending(&self) -> Option<&Window<T>> {
        self.window.as_ref()
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutably borrow the underlying store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Drop the buffer and return the store.
    ///
    /// **Warning**: a pending window is discarded without being committed.
    pub fn into_store(self) -> S {
        self.store
    }

    fn check_bounds(&self, address: u32, len: usize) -> Result<(), BufferError<S::Error>> {
        if self.geometry.contains(address, len) {
            Ok(())
        } else {
            Err(BufferError::OutOfRange {
                address,
                len,
                capacity: self.geometry.capacity(),
            })
        }
    }

    fn check_window_edge(&self, address: u32, len: usize) -> Result<(), BufferError<S::Error>> {
        let window_end =
            self.geometry.window_base_of(address) as u64 + self.geometry.window_size() as u64;
        if address as u64 + len as u64 > window_end {
            return Err(BufferError::WindowOverflow {
                address,
                len,
                window_end: window_end as u32,
            });
        }
        Ok(())
    }
}

impl<S: SectorStore, T: AsRef<[u8]> + AsMut<[u8]>> SectorBuffer<S, T> {
    /// Read `dest.len()` bytes starting at `address`.
    ///
    /// Any pending window is committed first, regardless of whether the
    /// read targets it, so the backing bytes sampled afterwards reflect
    /// every buffered write.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] when the range exceeds the
    /// capacity, or [`BufferError::Store`] when the commit or the read
    /// fails; a pending window survives the failure.
    pub fn read(&mut self, address: u32, dest: &mut [u8]) -> Result<(), BufferError<S::Error>> {
        self.check_bounds(address, dest.len())?;
        self.flush()?;
        self.store.load(address, dest).map_err(BufferError::Store)
    }

    /// Commit the pending window, if any.
    ///
    /// A no-op when nothing is buffered. On success the window is
    /// discarded; on failure it stays in place so the call can be
    /// retried.
    pub fn flush(&mut self) -> Result<(), BufferError<S::Error>> {
        if let Some(window) = self.window.as_ref() {
            let base = window.base();
            self.store
                .commit(base, window.contents())
                .map_err(BufferError::Store)?;
            debug!("window at {} committed", base);
            self.window = None;
        }
        Ok(())
    }

    /// Commit the pending window when it covers a different sector than
    /// `base`.
    fn evict_other(&mut self, base: u32) -> Result<(), BufferError<S::Error>> {
        if let Some(window) = self.window.as_ref() {
            if window.base() != base {
                trace!("evicting window at {} for window at {}", window.base(), base);
                self.flush()?;
            }
        }
        Ok(())
    }

    /// Overlay `data` onto the pending window.
    fn overlay(&mut self, address: u32, data: &[u8]) {
        if let Some(window) = self.window.as_mut() {
            let offset = (address - window.base()) as usize;
            window.contents_mut()[offset..offset + data.len()].copy_from_slice(data);
        }
    }
}

// Implementation for heap-allocated windows
#[cfg(feature = "alloc")]
impl<S: SectorStore> SectorBuffer<S, Vec<u8>> {
    /// Create a heap-windowed buffer over `store`.
    ///
    /// The window is allocated lazily, sized by the geometry, when the
    /// first write needs it.
    pub fn new(store: S, geometry: StorageGeometry) -> Self {
        Self {
            store,
            geometry,
            window: None,
        }
    }

    /// Buffer `data` at `address`.
    ///
    /// The bytes land in the window covering `address`; nothing reaches
    /// the backing storage until the window is evicted or flushed.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] when the range exceeds the
    /// capacity, [`BufferError::WindowOverflow`] when it crosses the far
    /// edge of its window, or [`BufferError::Store`] when an eviction or
    /// the window load fails. Nothing is mutated on error.
    pub fn write(&mut self, address: u32, data: &[u8]) -> Result<(), BufferError<S::Error>> {
        self.check_bounds(address, data.len())?;
        self.check_window_edge(address, data.len())?;
        let base = self.geometry.window_base_of(address);
        self.evict_other(base)?;
        if self.window.is_none() {
            let mut contents = alloc::vec![0u8; self.geometry.window_size() as usize];
            self.store.load(base, &mut contents).map_err(BufferError::Store)?;
            trace!("window loaded at {}", base);
            self.window = Some(Window::new(base, contents));
        }
        self.overlay(address, data);
        Ok(())
    }
}

// Implementation for stack-allocated windows
impl<S: SectorStore, const W: usize> SectorBuffer<S, [u8; W]> {
    /// Create a stack-windowed buffer over `store`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::WindowSizeMismatch`] when `W` differs from
    /// the geometry's window size.
    pub fn new_stack(store: S, geometry: StorageGeometry) -> Result<Self, GeometryError> {
        if geometry.window_size() as usize != W {
            return Err(GeometryError::WindowSizeMismatch {
                configured: geometry.window_size(),
                container: W,
            });
        }
        Ok(Self {
            store,
            geometry,
            window: None,
        })
    }

    /// Buffer `data` at `address`.
    ///
    /// The bytes land in the window covering `address`; nothing reaches
    /// the backing storage until the window is evicted or flushed.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] when the range exceeds the
    /// capacity, [`BufferError::WindowOverflow`] when it crosses the far
    /// edge of its window, or [`BufferError::Store`] when an eviction or
    /// the window load fails. Nothing is mutated on error.
    pub fn write(&mut self, address: u32, data: &[u8]) -> Result<(), BufferError<S::Error>> {
        self.check_bounds(address, data.len())?;
        self.check_window_edge(address, data.len())?;
        let base = self.geometry.window_base_of(address);
        self.evict_other(base)?;
        if self.window.is_none() {
            let mut contents = [0u8; W];
            self.store.load(base, &mut contents).map_err(BufferError::Store)?;
            trace!("window loaded at {}", base);
            self.window = Some(Window::new(base, contents));
        }
        self.overlay(address, data);
        Ok(())
    }
}
