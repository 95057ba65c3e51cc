//! Streaming wrappers around the sector buffer.
//!
//! This module provides cursor-based I/O on top of [`SectorBuffer`],
//! implementing the `embedded-io` Read/Write/Seek traits so the buffered
//! region plugs into anything that consumes byte streams.
//!
//! [`SectorBuffer`]: crate::domain::SectorBuffer

mod byte_stream;

pub use byte_stream::ByteStream;

use core::fmt;

/// Unified I/O error type for streaming operations.
#[derive(Debug)]
pub enum StreamError<E> {
    /// Error from the underlying storage.
    Storage(E),
    /// I/O operation would run past the end of the region.
    OutOfBounds,
    /// Seek to a position outside the region.
    InvalidSeek,
}

impl<E: fmt::Display> fmt::Display for StreamError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::OutOfBounds => write!(f, "Operation would run past the end of the region"),
            Self::InvalidSeek => write!(f, "Invalid seek position"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> core::error::Error for StreamError<E> {}

// Implement embedded_io::Error so the streams can be used with embedded-io
impl<E: fmt::Debug + fmt::Display> embedded_io::Error for StreamError<E> {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::Storage(_) => embedded_io::ErrorKind::Other,
            Self::OutOfBounds => embedded_io::ErrorKind::InvalidInput,
            Self::InvalidSeek => embedded_io::ErrorKind::InvalidInput,
        }
    }
}
