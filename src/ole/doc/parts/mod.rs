/// Internal parts for parsing DOC file structures.
///
/// This module contains parsers for the binary structures used to recover
/// the text of a legacy Word document:
/// - FIB (File Information Block)
/// - Piece table (CLX)
/// - Text reconstruction and UTF-16 reassembly
pub mod fib;
pub mod piece_table;
pub mod text;
pub mod utf16;
