//! Seekable byte stream over a sector buffer.

use crate::domain::{BufferError, SectorBuffer, SectorStore};
use crate::infrastructure::streaming::StreamError;
use embedded_io::{ErrorType, Read, Seek, SeekFrom, Write};

/// Cursor-based stream over a [`SectorBuffer`].
///
/// Writes are chunked at window boundaries, so stream users never trip
/// the single-window write limit; a `write` call that spans a boundary
/// simply returns the short count of the `embedded-io` partial-write
/// contract and continues from there. Reads clamp at the end of the
/// region and report EOF as zero bytes.
///
/// # Examples
///
/// ```ignore
/// use embedded_io::{Read, Seek, SeekFrom, Write};
///
/// let mut stream = ByteStream::new(buffer);
/// stream.write_all(&payload)?;
/// stream.seek(SeekFrom::Start(0))?;
/// stream.read_exact(&mut readback)?;
/// ```
pub struct ByteStream<S: SectorStore, T> {
    buffer: SectorBuffer<S, T>,
    position: u64,
}

impl<S: SectorStore, T: AsRef<[u8]> + AsMut<[u8]>> ByteStream<S, T> {
    /// Wrap a buffer, with the cursor at the start of the region.
    pub fn new(buffer: SectorBuffer<S, T>) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Current cursor position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Consume the stream and return the buffer.
    ///
    /// Pending writes stay buffered; flush before unwrapping to make them
    /// durable.
    pub fn into_inner(self) -> SectorBuffer<S, T> {
        self.buffer
    }

    fn remaining(&self) -> u64 {
        (self.buffer.geometry().capacity() as u64).saturating_sub(self.position)
    }
}

fn into_stream_error<E>(err: BufferError<E>) -> StreamError<E> {
    match err {
        BufferError::Store(e) => StreamError::Storage(e),
        _ => StreamError::OutOfBounds,
    }
}

impl<S: SectorStore, T: AsRef<[u8]> + AsMut<[u8]>> ErrorType for ByteStream<S, T> {
    type Error = StreamError<S::Error>;
}

impl<S: SectorStore, T: AsRef<[u8]> + AsMut<[u8]>> Read for ByteStream<S, T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = self.remaining().min(buf.len() as u64) as usize;
        if n == 0 {
            return Ok(0);
        }
        self.buffer
            .read(self.position as u32, &mut buf[..n])
            .map_err(into_stream_error)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl<S: SectorStore, T: AsRef<[u8]> + AsMut<[u8]>> Write for ByteStream<S, T> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.remaining() == 0 {
            return Err(StreamError::OutOfBounds);
        }
        let address = self.position as u32;
        let geometry = self.buffer.geometry();
        let window_end =
            geometry.window_base_of(address) as u64 + geometry.window_size() as u64;
        let n = (buf.len() as u64)
            .min(window_end - self.position)
            .min(self.remaining()) as usize;
        self.buffer
            .write(address, &buf[..n])
            .map_err(into_stream_error)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.buffer.flush().map_err(into_stream_error)
    }
}

impl<S: SectorStore, T: AsRef<[u8]> + AsMut<[u8]>> Seek for ByteStream<S, T> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
        let capacity = self.buffer.geometry().capacity() as i64;
        let target = match pos {
            SeekFrom::Start(n) => i64::try_from(n).map_err(|_| StreamError::InvalidSeek)?,
            SeekFrom::End(off) => capacity.checked_add(off).ok_or(StreamError::InvalidSeek)?,
            SeekFrom::Current(off) => (self.position as i64)
                .checked_add(off)
                .ok_or(StreamError::InvalidSeek)?,
        };
        if target < 0 || target > capacity {
            return Err(StreamError::InvalidSeek);
        }
        self.position = target as u64;
        Ok(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FlashBuffer, FlushEngine, MemFlash};
    use crate::domain::{SectorLayout, StorageGeometry};

    const LAYOUT: SectorLayout = SectorLayout::Uniform {
        base: 0,
        erase_size: 16,
    };

    fn stream() -> ByteStream<FlushEngine<MemFlash<64>>, [u8; 16]> {
        let flash = MemFlash::<64>::new(LAYOUT, 0);
        let geometry = StorageGeometry::new(64, 16, 8).unwrap();
        ByteStream::new(FlashBuffer::<_, 16>::for_flash(flash, LAYOUT, 0, geometry).unwrap())
    }

    #[test]
    fn test_write_splits_at_window_boundary() {
        let mut stream = stream();
        stream.seek(SeekFrom::Start(12)).unwrap();

        // 8 bytes crossing the boundary at 16: first call takes 4
        let n = stream.write(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(n, 4);
        let n = stream.write(&[5, 6, 7, 8]).unwrap();
        assert_eq!(n, 4);

        stream.flush().unwrap();
        stream.seek(SeekFrom::Start(12)).unwrap();
        let mut out = [0u8; 8];
        stream.read(&mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_write_all_crosses_boundaries() {
        let mut stream = stream();
        let payload: Vec<u8> = (0..40).collect();
        stream.write_all(&payload).unwrap();
        stream.flush().unwrap();

        stream.seek(SeekFrom::Start(0)).unwrap();
        let mut out = [0u8; 40];
        stream.read_exact(&mut out).unwrap();
        assert_eq!(&out[..], &payload[..]);
    }

    #[test]
    fn test_read_clamps_at_end() {
        let mut stream = stream();
        stream.seek(SeekFrom::Start(60)).unwrap();

        let mut out = [0u8; 16];
        let n = stream.read(&mut out).unwrap();
        assert_eq!(n, 4);
        let n = stream.read(&mut out).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_write_past_end_is_an_error() {
        let mut stream = stream();
        stream.seek(SeekFrom::End(0)).unwrap();
        assert!(matches!(
            stream.write(&[1]),
            Err(StreamError::OutOfBounds)
        ));
    }

    #[test]
    fn test_seek_positions() {
        let mut stream = stream();
        assert_eq!(stream.seek(SeekFrom::End(-4)).unwrap(), 60);
        assert_eq!(stream.seek(SeekFrom::Current(2)).unwrap(), 62);
        assert!(matches!(
            stream.seek(SeekFrom::Current(10)),
            Err(StreamError::InvalidSeek)
        ));
        assert!(matches!(
            stream.seek(SeekFrom::Start(100)),
            Err(StreamError::InvalidSeek)
        ));
    }
}
