//! Domain-level errors.
//!
//! These represent protocol violations and propagated storage failures,
//! kept generic over the port error type so device errors survive the
//! trip to the caller.

use core::fmt;

/// Errors surfaced by the buffer service.
#[derive(Debug)]
#[non_exhaustive]
pub enum BufferError<E> {
    /// The request runs past the configured capacity. No state was
    /// mutated.
    OutOfRange {
        /// Requested start address.
        address: u32,
        /// Requested length in bytes.
        len: usize,
        /// Configured capacity in bytes.
        capacity: u32,
    },

    /// A write would run past the far edge of the window covering its
    /// start address. No state was mutated; callers split such requests
    /// at window boundaries.
    WindowOverflow {
        /// Requested start address.
        address: u32,
        /// Requested length in bytes.
        len: usize,
        /// First address past the window the request starts in.
        window_end: u32,
    },

    /// The storage layer failed. A pending window is left in place so the
    /// operation can be retried.
    Store(E),
}

impl<E: fmt::Display> fmt::Display for BufferError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                address,
                len,
                capacity,
            } => write!(
                f,
                "Range {}..{} exceeds capacity {}",
                address,
                *address as u64 + *len as u64,
                capacity
            ),
            Self::WindowOverflow {
                address,
                len,
                window_end,
            } => write!(
                f,
                "Write {}..{} crosses the window boundary at {}",
                address,
                *address as u64 + *len as u64,
                window_end
            ),
            Self::Store(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> core::error::Error for BufferError<E> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_display() {
        let error: BufferError<std::io::Error> = BufferError::OutOfRange {
            address: 65530,
            len: 16,
            capacity: 65536,
        };
        let msg = format!("{}", error);
        assert!(msg.contains("65530..65546"));
        assert!(msg.contains("65536"));
    }

    #[test]
    fn test_window_overflow_display() {
        let error: BufferError<std::io::Error> = BufferError::WindowOverflow {
            address: 16380,
            len: 8,
            window_end: 16384,
        };
        let msg = format!("{}", error);
        assert!(msg.contains("boundary at 16384"));
    }
}
