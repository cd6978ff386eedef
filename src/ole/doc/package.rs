/// Package implementation for legacy Word documents (.doc).
use super::document::Document;
use super::options::ExtractOptions;
use super::store::StreamStore;
use crate::common::binary::BinaryError;
use crate::ole::plcf::PlcfError;
use crate::ole::{CfbError, CompoundFile};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek};
use std::path::Path;
use thiserror::Error;

/// The pipeline stage that issued a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Reading the File Information Block prefix
    Header,
    /// Reading the CLX blob from the table stream
    PieceTable,
    /// Reading the bytes of one piece
    TextRange { piece: usize },
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Header => f.write_str("file information block"),
            Phase::PieceTable => f.write_str("piece table"),
            Phase::TextRange { piece } => write!(f, "text of piece {piece}"),
        }
    }
}

/// Broad classes of [`DocError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required stream is absent
    Structural,
    /// A fixed-size or declared-size read came back short
    Truncation,
    /// A tag, length or offset does not fit the format
    Format,
    /// The piece table disagrees with the FIB
    Consistency,
    /// The container or the underlying reader failed
    Io,
}

/// Error types for DOC file parsing.
#[derive(Debug, Error)]
pub enum DocError {
    /// The container has no `WordDocument` stream
    #[error("WordDocument stream not found")]
    DocumentMissing,

    /// The table stream selected by the FIB is absent
    #[error("table stream {name} not found")]
    TableStreamMissing { name: &'static str },

    /// A read returned fewer bytes than required
    #[error("{phase} too short: needed {expected} bytes at offset {offset}, got {actual}")]
    Truncated {
        phase: Phase,
        offset: u64,
        expected: usize,
        actual: usize,
    },

    /// A FIB field lies outside the buffered prefix
    #[error("file information block validation failed: {0}")]
    FibInvalid(BinaryError),

    /// A Prc record's length is non-positive or runs past the CLX
    #[error("invalid property record at CLX offset {offset} (cbGrpprl {length:?})")]
    InvalidPrc { offset: usize, length: Option<i16> },

    /// The byte after the Prc records is not the Pcdt tag
    #[error("expected piece table tag 0x02 at CLX offset {offset}, found {found:02X?}")]
    InvalidPieceTableTag { offset: usize, found: Option<u8> },

    /// The PlcPcd arrays do not fit in the CLX
    #[error("piece table out of bounds: {0}")]
    PieceTableOutOfBounds(PlcfError),

    /// Character positions go backwards
    #[error("piece table boundary {index} is {current}, below the previous boundary {previous}")]
    NonMonotonicBoundaries {
        index: usize,
        previous: u32,
        current: u32,
    },

    /// `lcb - 4` is not a multiple of 12 (strict mode only)
    #[error("piece table length {lcb} leaves {remainder} trailing bytes")]
    UnalignedPieceTable { lcb: u32, remainder: usize },

    /// The last character position disagrees with the FIB's text length
    #[error("last piece table boundary {actual} does not equal document length {expected}")]
    CpLengthMismatch { expected: u32, actual: u32 },

    /// A read from a stream failed
    #[error("IO error while reading {phase}: {source}")]
    Io {
        phase: Phase,
        #[source]
        source: io::Error,
    },

    /// The compound file container could not be parsed
    #[error("container error: {0}")]
    Container(#[from] CfbError),
}

impl DocError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocError::DocumentMissing | DocError::TableStreamMissing { .. } => {
                ErrorKind::Structural
            },
            DocError::Truncated { .. } => ErrorKind::Truncation,
            DocError::FibInvalid(_)
            | DocError::InvalidPrc { .. }
            | DocError::InvalidPieceTableTag { .. }
            | DocError::PieceTableOutOfBounds(_)
            | DocError::NonMonotonicBoundaries { .. }
            | DocError::UnalignedPieceTable { .. } => ErrorKind::Format,
            DocError::CpLengthMismatch { .. } => ErrorKind::Consistency,
            DocError::Io { .. } | DocError::Container(_) => ErrorKind::Io,
        }
    }
}

impl From<io::Error> for DocError {
    fn from(err: io::Error) -> Self {
        DocError::Container(CfbError::Io(err))
    }
}

/// Result type for DOC operations.
pub type Result<T> = std::result::Result<T, DocError>;

/// A Word (.doc) package.
///
/// This is the main entry point. It wraps a stream store (usually a
/// [`CompoundFile`]) together with the options used to extract text.
///
/// # Examples
///
/// ```rust,no_run
/// use doctext::doc::Package;
///
/// let mut pkg = Package::open("document.doc")?;
/// let text = pkg.text()?;
/// println!("{}", text);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Package<S: StreamStore = CompoundFile<BufReader<File>>> {
    store: S,
    options: ExtractOptions,
}

impl Package<CompoundFile<BufReader<File>>> {
    /// Open a .doc package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Package::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> Package<CompoundFile<R>> {
    /// Create a Package from any reader that implements Read + Seek.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use std::io::Cursor;
    /// use doctext::doc::Package;
    ///
    /// let bytes = std::fs::read("document.doc")?;
    /// let mut pkg = Package::from_reader(Cursor::new(bytes))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_reader(reader: R) -> Result<Self> {
        let cfb = CompoundFile::open(reader)?;
        Ok(Self::from_store(cfb))
    }
}

impl<S: StreamStore> Package<S> {
    /// Wrap an already opened stream store.
    pub fn from_store(store: S) -> Self {
        Self {
            store,
            options: ExtractOptions::default(),
        }
    }

    /// Replace the extraction options.
    #[inline]
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    #[inline]
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Parse the document: FIB, piece table and text.
    ///
    /// Every call re-reads the streams, so repeated calls give identical
    /// results.
    pub fn document(&mut self) -> Result<Document> {
        Document::from_store(&mut self.store, &self.options)
    }

    /// Parse the document and return only its text.
    pub fn text(&mut self) -> Result<String> {
        self.document().map(Document::into_text)
    }

    /// Get the underlying stream store.
    #[inline]
    pub fn store(&mut self) -> &mut S {
        &mut self.store
    }

    #[inline]
    pub fn into_store(self) -> S {
        self.store
    }
}

/// Extract the text of a .doc file from a sequential reader.
///
/// The whole input is buffered in memory first, since the container needs
/// random access.
///
/// # Examples
///
/// ```rust,no_run
/// let file = std::fs::File::open("document.doc")?;
/// let text = doctext::extract_text(file)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn extract_text<R: Read>(reader: R) -> Result<String> {
    extract_text_with_options(reader, ExtractOptions::default())
}

/// [`extract_text`] with explicit options.
pub fn extract_text_with_options<R: Read>(mut reader: R, options: ExtractOptions) -> Result<String> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    Package::from_reader(Cursor::new(data))?
        .with_options(options)
        .text()
}

/// Extract the text from streams that are already available by name.
pub fn extract_from_store<S: StreamStore>(store: &mut S, options: &ExtractOptions) -> Result<String> {
    Document::from_store(store, options).map(Document::into_text)
}
