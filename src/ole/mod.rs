/// Constants for OLE file format
pub mod consts;

/// Compound file container reader
mod file;

/// PLCF (character position to record) tables
pub mod plcf;

/// Legacy Word document (.doc) reader
///
/// This module provides functionality to extract the text of Microsoft Word
/// documents in the legacy binary format (.doc files), which are OLE2-based
/// files.
pub mod doc;

// Re-export public types for convenient access
pub use file::{CfbError, CompoundFile, DirEntry, is_compound_file};
