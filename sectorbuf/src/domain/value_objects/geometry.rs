//! Storage geometry value objects.

use core::fmt;

/// Word width of the program primitive; windows are programmed back as a
/// whole number of words.
const PROGRAM_WORD: u32 = 4;

/// Validated geometry of a managed byte region.
///
/// Ties together the three constants the buffering protocol depends on:
/// - `capacity`: total size of the region in bytes,
/// - `window_size`: size of the in-RAM window, equal to the erase unit of
///   every sector the region touches,
/// - `block_size`: the block size reported to an enclosing block
///   transport.
///
/// # Examples
///
/// ```
/// use sectorbuf::StorageGeometry;
///
/// let geometry = StorageGeometry::new(64 * 1024, 16 * 1024, 512).unwrap();
/// assert_eq!(geometry.block_count(), 128);
/// assert_eq!(geometry.window_base_of(20000), 16384);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageGeometry {
    capacity: u32,
    window_size: u32,
    block_size: u32,
}

impl StorageGeometry {
    /// Create a validated geometry.
    ///
    /// # Errors
    ///
    /// Returns an error when the window size is zero or not a whole number
    /// of program words, or when the capacity is not a whole number of
    /// windows or blocks.
    pub const fn new(
        capacity: u32,
        window_size: u32,
        block_size: u32,
    ) -> Result<Self, GeometryError> {
        if window_size == 0 {
            return Err(GeometryError::ZeroWindowSize);
        }
        if window_size % PROGRAM_WORD != 0 {
            return Err(GeometryError::UnalignedWindowSize { window_size });
        }
        if capacity == 0 || capacity % window_size != 0 {
            return Err(GeometryError::CapacityNotWindowMultiple {
                capacity,
                window_size,
            });
        }
        if block_size == 0 || capacity % block_size != 0 {
            return Err(GeometryError::CapacityNotBlockMultiple {
                capacity,
                block_size,
            });
        }
        Ok(Self {
            capacity,
            window_size,
            block_size,
        })
    }

    /// 192 KiB region buffered in 16 KiB windows with 512-byte blocks, the
    /// layout of an STM32F4 user-data bank.
    pub const fn stm32f4_192k() -> Self {
        Self {
            capacity: 192 * 1024,
            window_size: 16 * 1024,
            block_size: 512,
        }
    }

    /// Total size of the region in bytes.
    #[inline]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Size of the in-RAM window in bytes.
    #[inline]
    pub const fn window_size(&self) -> u32 {
        self.window_size
    }

    /// Block size reported to the block transport.
    #[inline]
    pub const fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Number of addressable transport blocks.
    #[inline]
    pub const fn block_count(&self) -> u32 {
        self.capacity / self.block_size
    }

    /// Block-indexed view of the region.
    #[inline]
    pub const fn block_geometry(&self) -> BlockGeometry {
        BlockGeometry {
            count: self.block_count(),
            size: self.block_size,
        }
    }

    /// Window-aligned offset of the window covering `address`.
    #[inline]
    pub const fn window_base_of(&self, address: u32) -> u32 {
        (address / self.window_size) * self.window_size
    }

    /// Whether the span `[address, address + len)` lies inside the region.
    #[inline]
    pub const fn contains(&self, address: u32, len: usize) -> bool {
        address as u64 + len as u64 <= self.capacity as u64
    }
}

/// Block-indexed geometry, as reported to an enclosing block transport.
///
/// Transports that address storage in fixed-size blocks multiply block
/// indices by `size` before issuing byte-level reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGeometry {
    /// Number of addressable blocks.
    pub count: u32,
    /// Size of one block in bytes.
    pub size: u32,
}

/// Errors from geometry validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    /// Window size is zero.
    ZeroWindowSize,
    /// Window size is not a whole number of program words.
    UnalignedWindowSize {
        /// The requested window size.
        window_size: u32,
    },
    /// Capacity is not a whole number of windows.
    CapacityNotWindowMultiple {
        /// The requested capacity.
        capacity: u32,
        /// The requested window size.
        window_size: u32,
    },
    /// Capacity is not a whole number of transport blocks.
    CapacityNotBlockMultiple {
        /// The requested capacity.
        capacity: u32,
        /// The requested block size.
        block_size: u32,
    },
    /// A compile-time window container does not match the configured size.
    WindowSizeMismatch {
        /// The window size the geometry was configured with.
        configured: u32,
        /// The size of the container the buffer was built with.
        container: usize,
    },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroWindowSize => write!(f, "Window size cannot be zero"),
            Self::UnalignedWindowSize { window_size } => write!(
                f,
                "Window size {} must be a multiple of the {}-byte program word",
                window_size, PROGRAM_WORD
            ),
            Self::CapacityNotWindowMultiple {
                capacity,
                window_size,
            } => write!(
                f,
                "Capacity {} must be a multiple of window size {}",
                capacity, window_size
            ),
            Self::CapacityNotBlockMultiple {
                capacity,
                block_size,
            } => write!(
                f,
                "Capacity {} must be a multiple of block size {}",
                capacity, block_size
            ),
            Self::WindowSizeMismatch {
                configured,
                container,
            } => write!(
                f,
                "Window container of {} bytes does not match configured window size {}",
                container, configured
            ),
        }
    }
}

impl core::error::Error for GeometryError {}
