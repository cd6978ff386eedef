//! Utilities shared by the container reader and the document parser.

pub mod binary;
pub mod encoding;

pub use encoding::CompressedEncoding;
