/// Named-stream access for the document parser.
///
/// The parser never sees the container format. It asks a [`StreamStore`] for
/// `WordDocument`, `0Table` or `1Table` and reads byte ranges from what it
/// gets back through [`ReadAt`].
use super::package::{DocError, Phase, Result};
use crate::ole::{CfbError, CompoundFile};
use bytes::Bytes;
use std::collections::HashMap;
use std::io::{self, Read, Seek};

/// Largest buffer allocated up front for a single ranged read.
///
/// Lengths come from untrusted header fields, so buffers grow as data
/// actually arrives instead of trusting the declared size.
const READ_CHUNK: usize = 64 * 1024;

/// Random-access reads at absolute offsets.
///
/// A read may return fewer bytes than requested; zero means end of stream.
pub trait ReadAt {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;
}

impl ReadAt for [u8] {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= self.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }
}

impl ReadAt for Vec<u8> {
    #[inline]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.as_slice().read_at(offset, buf)
    }
}

impl ReadAt for Bytes {
    #[inline]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.as_ref().read_at(offset, buf)
    }
}

impl<T: ReadAt + ?Sized> ReadAt for &T {
    #[inline]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }
}

/// Read exactly `len` bytes at `offset`.
///
/// A source that runs dry first yields [`DocError::Truncated`]; an I/O
/// failure is wrapped with the `phase` that issued the read.
pub fn read_exact_at<S: ReadAt + ?Sized>(
    source: &S,
    offset: u64,
    len: usize,
    phase: Phase,
) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(READ_CHUNK));
    while buf.len() < len {
        let filled = buf.len();
        let want = (len - filled).min(READ_CHUNK);
        buf.resize(filled + want, 0);
        match source.read_at(offset.saturating_add(filled as u64), &mut buf[filled..]) {
            Ok(0) => {
                buf.truncate(filled);
                break;
            },
            Ok(n) => buf.truncate(filled + n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => buf.truncate(filled),
            Err(source) => return Err(DocError::Io { phase, source }),
        }
    }

    if buf.len() < len {
        return Err(DocError::Truncated {
            phase,
            offset,
            expected: len,
            actual: buf.len(),
        });
    }
    Ok(buf)
}

/// A container that exposes streams by name.
pub trait StreamStore {
    /// Handle to one stream's bytes.
    type Stream: ReadAt + Sync;

    /// Look up a stream. `Ok(None)` means the container has no such stream.
    fn stream(&mut self, name: &str) -> Result<Option<Self::Stream>>;
}

impl<R: Read + Seek> StreamStore for CompoundFile<R> {
    type Stream = Bytes;

    fn stream(&mut self, name: &str) -> Result<Option<Bytes>> {
        match self.open_stream(name) {
            Ok(data) => Ok(Some(data)),
            Err(CfbError::StreamNotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl<T: StreamStore + ?Sized> StreamStore for &mut T {
    type Stream = T::Stream;

    #[inline]
    fn stream(&mut self, name: &str) -> Result<Option<Self::Stream>> {
        (**self).stream(name)
    }
}

/// Streams held in memory, keyed by name.
///
/// Useful when the container has already been taken apart elsewhere.
///
/// # Examples
///
/// ```
/// use doctext::doc::{MemoryStore, StreamStore};
///
/// let mut store = MemoryStore::new().with_stream("WordDocument", vec![0u8; 16]);
/// assert!(store.stream("WordDocument").unwrap().is_some());
/// assert!(store.stream("1Table").unwrap().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    streams: HashMap<String, Bytes>,
}

impl MemoryStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a stream, builder style.
    pub fn with_stream(mut self, name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.insert(name, data);
        self
    }

    /// Add or replace a stream.
    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Bytes>) {
        self.streams.insert(name.into(), data.into());
    }

    /// Remove a stream, returning its bytes.
    pub fn remove(&mut self, name: &str) -> Option<Bytes> {
        self.streams.remove(name)
    }
}

impl StreamStore for MemoryStore {
    type Stream = Bytes;

    fn stream(&mut self, name: &str) -> Result<Option<Bytes>> {
        Ok(self.streams.get(name).cloned())
    }
}
