use std::fmt;
use std::io;

use bucketfs_store::ChunkStream;
use bytes::{Bytes, BytesMut};

use crate::error::FsResult;

/// Pull-based reader over a lazy chunk stream.
///
/// Holds a carry-over buffer: each [`read`](Self::read) pulls chunks until
/// the buffer covers the request or the stream ends, hands out the front of
/// the buffer, and keeps the rest for the next call. A chunk is pulled from
/// the store at most once.
///
/// End of stream is a short read, down to an empty one. It is never an
/// error.
pub struct ChunkReader {
    chunks: ChunkStream,
    buf: BytesMut,
    exhausted: bool,
}

impl ChunkReader {
    /// Wrap a chunk stream. Nothing is pulled until the first read.
    pub fn new(chunks: ChunkStream) -> Self {
        Self {
            chunks,
            buf: BytesMut::new(),
            exhausted: false,
        }
    }

    /// Read up to `n` bytes, or everything that remains when `n` is `None`.
    ///
    /// A store error during a pull is returned as-is and leaves the buffered
    /// bytes in place.
    pub fn read(&mut self, n: Option<usize>) -> FsResult<Bytes> {
        let want = n.unwrap_or(usize::MAX);
        self.fill(want)?;
        let take = want.min(self.buf.len());
        Ok(self.buf.split_to(take).freeze())
    }

    /// Read everything that remains.
    pub fn read_to_end(&mut self) -> FsResult<Bytes> {
        self.read(None)
    }

    /// Returns `true` once the stream has ended and the buffer is drained.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted && self.buf.is_empty()
    }

    /// Bytes pulled from the store but not yet returned.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    fn fill(&mut self, want: usize) -> FsResult<()> {
        while self.buf.len() < want && !self.exhausted {
            match self.chunks.next() {
                Some(chunk) => self.buf.extend_from_slice(&chunk?),
                None => self.exhausted = true,
            }
        }
        Ok(())
    }
}

impl io::Read for ChunkReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        let bytes = ChunkReader::read(self, Some(out.len()))?;
        out[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }
}

impl fmt::Debug for ChunkReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkReader")
            .field("buffered", &self.buf.len())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
