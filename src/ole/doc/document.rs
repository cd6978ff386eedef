/// Document - the parsed content of a Word document.
use super::options::ExtractOptions;
use super::package::{DocError, Result};
use super::parts::fib::FileInformationBlock;
use super::parts::piece_table::PieceTable;
use super::parts::text::TextExtractor;
use super::store::StreamStore;
use crate::ole::consts::WORD_DOCUMENT_STREAM;
use log::debug;
use std::io::Cursor;

/// A Word document (.doc).
///
/// Holds the File Information Block, the decoded piece table and the text
/// they describe.
///
/// # Examples
///
/// ```rust,no_run
/// use doctext::doc::Package;
///
/// let mut pkg = Package::open("document.doc")?;
/// let doc = pkg.document()?;
///
/// println!("{} pieces", doc.piece_table().len());
/// println!("{}", doc.text());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    fib: FileInformationBlock,
    piece_table: PieceTable,
    text: String,
}

impl Document {
    /// Parse a document from its named streams.
    ///
    /// This is typically called through `Package::document()`.
    pub fn from_store<S: StreamStore + ?Sized>(
        store: &mut S,
        options: &ExtractOptions,
    ) -> Result<Self> {
        let word_document = store
            .stream(WORD_DOCUMENT_STREAM)?
            .ok_or(DocError::DocumentMissing)?;
        let fib = FileInformationBlock::read(Some(&word_document))?;

        let name = fib.table_stream_name();
        debug!("using table stream {name}");
        let table_stream = store
            .stream(name)?
            .ok_or(DocError::TableStreamMissing { name })?;

        let piece_table = PieceTable::read(&table_stream, &fib, options.strict_piece_table)?;
        let text = TextExtractor::new(options).extract(&word_document, &piece_table)?;

        Ok(Self {
            fib,
            piece_table,
            text,
        })
    }

    /// Get the File Information Block.
    #[inline]
    pub fn fib(&self) -> &FileInformationBlock {
        &self.fib
    }

    #[inline]
    pub fn piece_table(&self) -> &PieceTable {
        &self.piece_table
    }

    /// Get all text, pieces concatenated in order.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn into_text(self) -> String {
        self.text
    }

    /// Consume the document into a reader over its UTF-8 text.
    pub fn into_reader(self) -> Cursor<String> {
        Cursor::new(self.text)
    }
}
