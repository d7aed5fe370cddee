use std::fmt;
use std::io;
use std::str::FromStr;

use bucketfs_store::ObjectClient;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::{FsError, FsResult};
use crate::reader::ChunkReader;
use crate::storage::Storage;

/// Access mode of a [`StorageFile`].
///
/// Parsed from C-style mode strings: `r`, `w`, optionally followed by `+`
/// and a `b` or `t` flag in any order. Append modes are rejected because an
/// object can only be replaced whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenMode {
    readable: bool,
    writable: bool,
}

impl OpenMode {
    pub const READ: Self = Self {
        readable: true,
        writable: false,
    };
    pub const WRITE: Self = Self {
        readable: false,
        writable: true,
    };
    pub const READ_WRITE: Self = Self {
        readable: true,
        writable: true,
    };

    pub fn is_readable(&self) -> bool {
        self.readable
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    fn describe(&self) -> &'static str {
        match (self.readable, self.writable) {
            (true, true) => "read-write",
            (true, false) => "read-only",
            (false, _) => "write-only",
        }
    }
}

impl FromStr for OpenMode {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FsError::InvalidMode(s.to_string());
        let mut chars = s.chars();
        let base = chars.next().ok_or_else(invalid)?;

        let mut plus = false;
        let mut kind_flag = false;
        for c in chars {
            match c {
                '+' if !plus => plus = true,
                'b' | 't' if !kind_flag => kind_flag = true,
                _ => return Err(invalid()),
            }
        }

        match base {
            'r' => Ok(Self {
                readable: true,
                writable: plus,
            }),
            'w' => Ok(Self {
                readable: plus,
                writable: true,
            }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A buffered, write-on-close handle on one object.
///
/// Reads open the object lazily on the first call and stream it through a
/// [`ChunkReader`]. Writes replace an in-memory buffer; the store sees them
/// only when [`close`](Self::close) performs a single put. [`close`]
/// consumes the handle, so it cannot be used afterwards.
///
/// Dropping a handle with unflushed writes discards them and logs a warning.
///
/// [`close`]: Self::close
pub struct StorageFile<'a, C: ObjectClient> {
    storage: &'a Storage<C>,
    name: String,
    mode: OpenMode,
    reader: Option<ChunkReader>,
    pending: Bytes,
    dirty: bool,
    closed: bool,
}

impl<'a, C: ObjectClient> StorageFile<'a, C> {
    pub(crate) fn new(storage: &'a Storage<C>, name: String, mode: OpenMode) -> Self {
        Self {
            storage,
            name,
            mode,
            reader: None,
            pending: Bytes::new(),
            dirty: false,
            closed: false,
        }
    }

    /// Normalized key this handle refers to.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Whether a write is waiting for [`close`](Self::close).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read up to `n` bytes, or the rest of the object when `n` is `None`.
    ///
    /// The first call opens the object. An empty result means end of file.
    pub fn read(&mut self, n: Option<usize>) -> FsResult<Bytes> {
        if !self.mode.is_readable() {
            return Err(self.mode_error("read"));
        }
        if self.reader.is_none() {
            let chunks = self
                .storage
                .client()
                .get_chunks(&self.name, self.storage.config().chunk_size)?;
            debug!(key = %self.name, "opened object for streaming");
            self.reader = Some(ChunkReader::new(chunks));
        }
        match self.reader.as_mut() {
            Some(reader) => reader.read(n),
            None => Ok(Bytes::new()),
        }
    }

    /// Replace the pending content with `content`.
    ///
    /// Repeated writes before close overwrite each other; they never append.
    pub fn write(&mut self, content: &[u8]) -> FsResult<()> {
        if !self.mode.is_writable() {
            return Err(self.mode_error("write"));
        }
        self.pending = Bytes::copy_from_slice(content);
        self.dirty = true;
        Ok(())
    }

    /// Size in bytes of the content this handle refers to.
    ///
    /// The pending buffer's length after a write; otherwise the stored
    /// object's current size. A clean handle stats on every call.
    pub fn size(&self) -> FsResult<u64> {
        if self.dirty {
            return Ok(self.pending.len() as u64);
        }
        Ok(self.storage.stat_required(&self.name)?.size)
    }

    /// Flush pending content with one put, then release the handle.
    ///
    /// A handle that was never written performs no store call.
    pub fn close(mut self) -> FsResult<()> {
        self.closed = true;
        self.reader = None;
        if self.dirty {
            let data = std::mem::take(&mut self.pending);
            self.storage.put(&self.name, data)?;
            self.dirty = false;
        }
        Ok(())
    }

    fn mode_error(&self, op: &'static str) -> FsError {
        FsError::HandleMode {
            name: self.name.clone(),
            mode: self.mode.describe(),
            op,
        }
    }
}

impl<C: ObjectClient> io::Read for StorageFile<'_, C> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        let bytes = StorageFile::read(self, Some(out.len()))?;
        out[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }
}

impl<C: ObjectClient> Drop for StorageFile<'_, C> {
    fn drop(&mut self) {
        if !self.closed && self.dirty {
            warn!(
                key = %self.name,
                pending = self.pending.len(),
                "file handle dropped without close; pending write discarded"
            );
        }
    }
}

impl<C: ObjectClient> fmt::Debug for StorageFile<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageFile")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("dirty", &self.dirty)
            .field("reader", &self.reader)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bucketfs_store::InMemoryObjectClient;
    use std::io::Read;

    use crate::config::FsConfig;
    use crate::testing::{FlakyClient, Op};

    fn flaky() -> Storage<FlakyClient> {
        Storage::new(FlakyClient::new())
    }

    // -----------------------------------------------------------------------
    // Modes
    // -----------------------------------------------------------------------

    #[test]
    fn parse_modes() {
        assert_eq!("r".parse::<OpenMode>().unwrap(), OpenMode::READ);
        assert_eq!("rb".parse::<OpenMode>().unwrap(), OpenMode::READ);
        assert_eq!("w".parse::<OpenMode>().unwrap(), OpenMode::WRITE);
        assert_eq!("wb".parse::<OpenMode>().unwrap(), OpenMode::WRITE);
        assert_eq!("r+".parse::<OpenMode>().unwrap(), OpenMode::READ_WRITE);
        assert_eq!("rb+".parse::<OpenMode>().unwrap(), OpenMode::READ_WRITE);
        assert_eq!("w+b".parse::<OpenMode>().unwrap(), OpenMode::READ_WRITE);
    }

    #[test]
    fn reject_bad_modes() {
        for mode in ["", "a", "x", "rr", "r++", "rbt", "wz"] {
            assert!(
                matches!(mode.parse::<OpenMode>(), Err(FsError::InvalidMode(_))),
                "{mode:?} should be rejected"
            );
        }
    }

    #[test]
    fn mode_display() {
        assert_eq!(OpenMode::READ.to_string(), "read-only");
        assert_eq!(OpenMode::WRITE.to_string(), "write-only");
        assert_eq!(OpenMode::READ_WRITE.to_string(), "read-write");
    }

    // -----------------------------------------------------------------------
    // Reading
    // -----------------------------------------------------------------------

    #[test]
    fn open_for_read_is_lazy() {
        let storage = flaky();
        storage.save("lazy.txt", b"data").unwrap();

        let mut handle = storage.open("lazy.txt", OpenMode::READ);
        assert_eq!(storage.client().calls(Op::Get), 0);
        assert_eq!(handle.read(Some(2)).unwrap(), Bytes::from_static(b"da"));
        assert_eq!(handle.read(Some(2)).unwrap(), Bytes::from_static(b"ta"));
        assert!(handle.read(Some(2)).unwrap().is_empty());
        assert_eq!(storage.client().calls(Op::Get), 1);
    }

    #[test]
    fn open_missing_fails_on_first_read() {
        let storage = Storage::new(InMemoryObjectClient::new());
        let mut handle = storage.open("missing.txt", OpenMode::READ);
        assert!(matches!(handle.read(None), Err(FsError::NotFound { .. })));
    }

    #[test]
    fn ten_byte_reads_of_hundred_bytes() {
        let config = FsConfig {
            chunk_size: 16,
            ..FsConfig::default()
        };
        let storage = Storage::with_config(InMemoryObjectClient::new(), config);
        let data: Vec<u8> = (0..100u8).collect();
        storage.save("hundred.bin", &data).unwrap();

        let whole = storage.open("hundred.bin", OpenMode::READ).read(None).unwrap();

        let mut handle = storage.open("hundred.bin", OpenMode::READ);
        let mut pieces = Vec::new();
        for _ in 0..10 {
            let part = handle.read(Some(10)).unwrap();
            assert_eq!(part.len(), 10);
            pieces.extend_from_slice(&part);
        }
        assert!(handle.read(Some(10)).unwrap().is_empty());
        assert_eq!(pieces, whole.to_vec());
        assert_eq!(pieces, data);
    }

    #[test]
    fn io_read_on_handle() {
        let storage = Storage::new(InMemoryObjectClient::new());
        storage.save("f.txt", b"via std::io").unwrap();
        let mut handle = storage.open("f.txt", OpenMode::READ);
        let mut out = String::new();
        handle.read_to_string(&mut out).unwrap();
        assert_eq!(out, "via std::io");
    }

    #[test]
    fn read_on_write_only_handle_fails() {
        let storage = flaky();
        let mut handle = storage.open("w.txt", OpenMode::WRITE);
        assert!(matches!(
            handle.read(None),
            Err(FsError::HandleMode { op: "read", .. })
        ));
        assert_eq!(storage.client().calls(Op::Get), 0);
    }

    #[test]
    fn get_failure_surfaces_as_store_error() {
        let storage = flaky();
        storage.save("x.txt", b"x").unwrap();
        storage.client().fail(Op::Get);
        let mut handle = storage.open("x.txt", OpenMode::READ);
        assert!(matches!(handle.read(None), Err(FsError::Store(_))));
    }

    // -----------------------------------------------------------------------
    // Writing
    // -----------------------------------------------------------------------

    #[test]
    fn write_then_close_puts_once() {
        let storage = flaky();
        let mut handle = storage.open("/out.txt", OpenMode::WRITE);
        handle.write(b"first").unwrap();
        handle.write(b"second").unwrap();
        assert!(handle.is_dirty());
        assert_eq!(storage.client().calls(Op::Put), 0);

        handle.close().unwrap();
        assert_eq!(storage.client().calls(Op::Put), 1);
        let stored = storage.client().inner().get_object("out.txt").unwrap();
        assert_eq!(stored, Bytes::from_static(b"second"));
    }

    #[test]
    fn close_without_write_does_nothing() {
        let storage = flaky();
        storage.save("r.txt", b"r").unwrap();
        let puts = storage.client().calls(Op::Put);

        let mut handle = storage.open("r.txt", OpenMode::READ_WRITE);
        handle.read(None).unwrap();
        handle.close().unwrap();
        assert_eq!(storage.client().calls(Op::Put), puts);

        storage.open("never.txt", OpenMode::WRITE).close().unwrap();
        assert!(storage.client().inner().stat_object("never.txt").unwrap().is_none());
    }

    #[test]
    fn write_on_read_only_handle_fails() {
        let storage = flaky();
        let mut handle = storage.open("r.txt", OpenMode::READ);
        let err = handle.write(b"nope").unwrap_err();
        assert!(matches!(err, FsError::HandleMode { op: "write", .. }));
        assert!(err.to_string().contains("read-only"));
        assert!(!handle.is_dirty());
    }

    #[test]
    fn dropped_dirty_handle_writes_nothing() {
        let storage = flaky();
        {
            let mut handle = storage.open("dropped.txt", OpenMode::WRITE);
            handle.write(b"lost").unwrap();
        }
        assert_eq!(storage.client().calls(Op::Put), 0);
        assert!(storage.client().inner().is_empty());
    }

    #[test]
    fn close_surfaces_put_failure() {
        let storage = flaky();
        storage.client().fail(Op::Put);
        let mut handle = storage.open("f.txt", OpenMode::WRITE);
        handle.write(b"data").unwrap();
        assert!(matches!(handle.close(), Err(FsError::Store(_))));
    }

    #[test]
    fn closed_write_is_readable_with_guessed_type() {
        let storage = Storage::new(InMemoryObjectClient::new());
        let mut handle = storage.open("page.html", OpenMode::WRITE);
        handle.write(b"<p>hi</p>").unwrap();
        handle.close().unwrap();

        let meta = storage.client().stat_object("page.html").unwrap().unwrap();
        assert_eq!(meta.content_type.as_deref(), Some("text/html"));
        let body = storage.open("page.html", OpenMode::READ).read(None).unwrap();
        assert_eq!(body, Bytes::from_static(b"<p>hi</p>"));
    }

    // -----------------------------------------------------------------------
    // Size
    // -----------------------------------------------------------------------

    #[test]
    fn size_follows_store_while_clean() {
        let storage = flaky();
        storage.save("s.bin", &[0u8; 42]).unwrap();
        let handle = storage.open("s.bin", OpenMode::READ);
        assert_eq!(handle.size().unwrap(), 42);

        storage.save("s.bin", &[0u8; 10]).unwrap();
        assert_eq!(handle.size().unwrap(), 10);
        assert_eq!(storage.client().calls(Op::Stat), 2);
    }

    #[test]
    fn size_reflects_pending_write() {
        let storage = flaky();
        let mut handle = storage.open("new.bin", OpenMode::WRITE);
        handle.write(&[1u8; 7]).unwrap();
        assert_eq!(handle.size().unwrap(), 7);
        assert_eq!(storage.client().calls(Op::Stat), 0);
        handle.close().unwrap();
    }

    #[test]
    fn size_of_missing_object_is_not_found() {
        let storage = flaky();
        let handle = storage.open("missing", OpenMode::READ);
        assert!(matches!(handle.size(), Err(FsError::NotFound { .. })));
    }
}
