//! doctext - plain-text extraction from legacy Word documents
//!
//! This library recovers the text of Word 97-2003 binary documents (.doc)
//! by following the same path Word itself uses: the File Information Block
//! at the start of the `WordDocument` stream points at the piece table in
//! the table stream, and the piece table says where every run of characters
//! lives and how it is encoded.
//!
//! # Features
//!
//! - **OLE2 Reader**: Minimal compound file reader for the streams a .doc needs
//! - **Piece table decoding**: Fast-saved documents with Prc records included
//! - **Pluggable storage**: Any [`doc::StreamStore`] can feed the parser
//! - **Parallel decoding**: Optional rayon-based piece decoding (`parallel` feature)
//!
//! # Example - Reading a DOC file
//!
//! ```no_run
//! use doctext::ole::doc::Package;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pkg = Package::open("document.doc")?;
//! let text = pkg.text()?;
//! println!("Document text: {}", text);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - From any reader
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = std::fs::File::open("document.doc")?;
//! let text = doctext::extract_text(file)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Low-level OLE access
//!
//! ```no_run
//! use std::fs::File;
//! use doctext::ole::CompoundFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut cfb = CompoundFile::open(File::open("document.doc")?)?;
//!
//! for name in cfb.stream_names() {
//!     println!("Stream: {}", name);
//! }
//!
//! let data = cfb.open_stream("WordDocument")?;
//! println!("Stream size: {} bytes", data.len());
//! # Ok(())
//! # }
//! ```

/// Byte-level helpers shared by the parsers
pub mod common;

/// OLE2 (Object Linking and Embedding) file format parser
///
/// The `ole` module also contains the `doc` submodule for legacy Word
/// documents, since .doc files are OLE2-based.
pub mod ole;

// Re-export commonly used types for convenience
pub use ole::doc;
pub use ole::doc::{
    DocError, Document, ExtractOptions, Package, extract_from_store, extract_text,
    extract_text_with_options,
};
