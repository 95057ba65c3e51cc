//! Sector-granularity write-back buffering with hexagonal architecture.
//!
//! This crate lets a byte-addressable client perform arbitrary-offset
//! reads and writes against flash-like storage whose physical constraint
//! is erase-before-program: bytes can only be rewritten after a bulk
//! erase of the whole sector containing them. A single in-RAM window
//! absorbs writes; the flush path commits it through the
//! erase-then-program sequence and discards it.
//!
//! # Architecture
//!
//! The crate is organized into three layers:
//!
//! ## Domain Layer (`domain`)
//! Pure protocol logic with no device dependencies:
//! - **Entities**: [`Window`], the mirror of one erase sector
//! - **Value Objects**: [`SectorId`], [`StorageGeometry`], [`SectorLayout`]
//! - **Services**: [`SectorBuffer`] with the buffering rules
//! - **Ports**: [`SectorStore`] interface
//!
//! ## Adapter Layer (`adapters`)
//! Concrete implementations connecting the domain to devices:
//! - **[`FlushEngine`]**: erase-then-program commits over any
//!   [`SectorFlash`]
//! - **[`MemFlash`]**: RAM-backed simulator with NOR semantics
//! - **[`NorSectorFlash`]**: `embedded-storage` NOR driver adapter
//!
//! ## Infrastructure Layer (`infrastructure`)
//! High-level utilities built on the domain:
//! - **[`ByteStream`]**: `embedded-io` Read/Write/Seek over the buffer
//!
//! # Quick Start
//!
//! ```
//! use sectorbuf::{FlashBuffer, MemFlash, SectorLayout, StorageGeometry};
//!
//! let layout = SectorLayout::Uniform { base: 0, erase_size: 4096 };
//! let flash = MemFlash::<{ 16 * 1024 }>::new(layout, 0);
//! let geometry = StorageGeometry::new(16 * 1024, 4096, 512)?;
//! let mut buffer = FlashBuffer::<_, 4096>::for_flash(flash, layout, 0, geometry)?;
//!
//! buffer.write(10, b"hello")?;       // buffered in RAM
//! let mut out = [0u8; 5];
//! buffer.read(10, &mut out)?;        // commits, then samples the flash
//! assert_eq!(&out, b"hello");
//! # Ok::<(), Box<dyn core::error::Error>>(())
//! ```
//!
//! # Protocol invariants
//!
//! - At most one window exists; it is created by the first write after
//!   none exists and destroyed exactly when a flush completes.
//! - A write landing in a different sector than the pending window first
//!   commits that window (eviction), so commits happen in eviction order.
//! - Every read commits the pending window before sampling storage, so
//!   reads observe writes in program order.
//! - A write may not cross the far edge of its window; callers (or
//!   [`ByteStream`]) split requests at window boundaries.
//! - A failed commit leaves the window intact for a retry.
//!
//! # Features
//!
//! - `alloc`: heap-allocated windows ([`HeapFlashBuffer`])
//! - `std`: standard library support
//! - `embedded-storage`: NOR flash adapter for `embedded-storage` traits
//! - `log`: logging support
//! - `defmt`: defmt logging for embedded

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[macro_use]
mod fmt;

// Core layers
pub mod adapters;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    BlockGeometry, BufferError, GeometryError, SectorBand, SectorBuffer, SectorId, SectorLayout,
    SectorStore, StorageGeometry, Window,
};

pub use adapters::{FlashBuffer, FlushEngine, MemFlash, MemFlashError};

#[cfg(feature = "alloc")]
pub use adapters::HeapFlashBuffer;

#[cfg(feature = "embedded-storage")]
pub use adapters::{NorFlashIoError, NorRegionConfig, NorSectorFlash};

pub use infrastructure::streaming::{ByteStream, StreamError};

// Re-export embedded_io for convenience
pub use embedded_io;

// Re-export the device trait crate so users can depend on sectorbuf alone
pub use sectorbuf_flash_device as flash_device;
pub use sectorbuf_flash_device::{SectorFlash, ERASED_BYTE, WORD_SIZE};
