/// Word (.doc) text extraction.
///
/// This module recovers the plain text of Microsoft Word documents in the
/// Word 97 and later binary format (.doc files), which use OLE2 structured
/// storage.
///
/// # Architecture
///
/// - `Package`: the .doc container together with extraction options
/// - `Document`: the parsed FIB, piece table and text
/// - `StreamStore`: named-stream access, implemented for `CompoundFile`
///   and `MemoryStore`
///
/// # DOC File Structure
///
/// A .doc file is an OLE2 structured storage containing several streams.
/// Two of them matter for text:
/// - **WordDocument**: starts with the FIB and holds the character data
/// - **1Table** or **0Table**: holds the CLX, whose piece table maps
///   character positions to byte spans of WordDocument
///
/// # Example
///
/// ```rust,no_run
/// use doctext::doc::{ExtractOptions, Package};
///
/// let mut package = Package::open("document.doc")?
///     .with_options(ExtractOptions::new().with_strict_piece_table(true));
/// let doc = package.document()?;
///
/// println!("Word version 0x{:04X}", doc.fib().version());
/// println!("{}", doc.text());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub mod document;
pub mod options;
pub mod package;
pub mod parts;
pub mod store;

pub use document::Document;
pub use options::{CompressedEncoding, ExtractOptions};
pub use package::{
    DocError, ErrorKind, Package, Phase, Result, extract_from_store, extract_text,
    extract_text_with_options,
};
pub use parts::fib::{CharacterCounts, FileInformationBlock};
pub use parts::piece_table::{PieceDescriptor, PieceTable, TextRange};
pub use store::{MemoryStore, ReadAt, StreamStore};
