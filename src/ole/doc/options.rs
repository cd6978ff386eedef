/// Configuration for text extraction.
pub use crate::common::encoding::CompressedEncoding;

/// Options controlling how the piece table is decoded into text.
///
/// # Examples
///
/// ```rust
/// use doctext::doc::{CompressedEncoding, ExtractOptions};
///
/// // Defaults: Latin-1 pass-through, lenient piece table, sequential decode
/// let options = ExtractOptions::default();
/// assert!(!options.strict_piece_table);
///
/// // Or customize
/// let options = ExtractOptions::new()
///     .with_compressed_encoding(CompressedEncoding::Windows1252)
///     .with_strict_piece_table(true);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Mapping from bytes to characters for compressed pieces
    pub compressed_encoding: CompressedEncoding,
    /// Reject a PlcPcd whose `lcb - 4` is not a multiple of 12 instead of
    /// ignoring the partial trailing descriptor
    pub strict_piece_table: bool,
    /// Decode pieces on the rayon thread pool (requires the `parallel`
    /// feature; ignored otherwise). Output order is unaffected.
    pub parallel: bool,
}

impl ExtractOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_compressed_encoding(mut self, encoding: CompressedEncoding) -> Self {
        self.compressed_encoding = encoding;
        self
    }

    #[inline]
    pub fn with_strict_piece_table(mut self, strict: bool) -> Self {
        self.strict_piece_table = strict;
        self
    }

    #[inline]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
