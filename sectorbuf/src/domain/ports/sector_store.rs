//! SectorStore port - secondary (driven) port for sector-granular commits.

use core::error::Error;

/// Port for the storage operations the buffer service needs.
///
/// This is a **secondary (driven) port**: the domain depends on this
/// abstraction and the adapter layer connects it to an actual flash
/// device. Two operations cover the whole protocol:
///
/// - [`load`](Self::load) is byte-granular and cheap; it backs both
///   client reads and window creation.
/// - [`commit`](Self::commit) durably replaces one window-sized span and
///   is the slow, blocking path (on flash it runs the erase-then-program
///   sequence).
pub trait SectorStore {
    /// The error type of the underlying device.
    type Error: Error + Send + Sync + 'static;

    /// Copy `dest.len()` bytes starting at `address` out of the region.
    fn load(&self, address: u32, dest: &mut [u8]) -> Result<(), Self::Error>;

    /// Durably replace the span `[base, base + contents.len())` with
    /// `contents`.
    ///
    /// All-or-nothing at the protocol level: on `Ok` the region reflects
    /// `contents` exactly. On `Err` the caller keeps its copy of the data
    /// and may retry; the physical span may have been erased but not yet
    /// reprogrammed.
    fn commit(&mut self, base: u32, contents: &[u8]) -> Result<(), Self::Error>;
}
