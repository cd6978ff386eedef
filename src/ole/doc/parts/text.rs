/// Text reconstruction from the piece table.
///
/// Each piece names a byte span of the WordDocument stream and an encoding.
/// The document text is the concatenation of every decoded piece in table
/// order, with nothing inserted between pieces.
use super::super::options::ExtractOptions;
use super::super::package::{Phase, Result};
use super::super::store::{ReadAt, read_exact_at};
use super::piece_table::{PieceTable, TextRange};
use super::utf16::Utf16Accumulator;
use crate::common::encoding::{decode_compressed, decode_utf16_units};
use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Minimum number of pieces to justify parallel decoding overhead.
#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 4;

/// Text extractor for DOC files.
#[derive(Debug, Clone, Copy)]
pub struct TextExtractor<'a> {
    options: &'a ExtractOptions,
}

impl<'a> TextExtractor<'a> {
    #[inline]
    pub fn new(options: &'a ExtractOptions) -> Self {
        Self { options }
    }

    /// Decode every piece of `table` from `word_document`.
    ///
    /// Fails on the first piece (in table order) whose bytes cannot be read
    /// in full; no partial text is returned.
    pub fn extract<S: ReadAt + Sync + ?Sized>(
        &self,
        word_document: &S,
        table: &PieceTable,
    ) -> Result<String> {
        let pieces: Vec<Result<String>> = if self.use_parallel(table) {
            self.decode_parallel(word_document, table)
        } else {
            table
                .ranges()
                .map(|range| self.decode_piece(word_document, &range))
                .collect()
        };

        // Collect in table order so the reported error does not depend on scheduling
        let pieces = pieces.into_iter().collect::<Result<Vec<_>>>()?;
        let total: usize = pieces.iter().map(String::len).sum();
        let mut text = String::with_capacity(total);
        for piece in &pieces {
            text.push_str(piece);
        }
        Ok(text)
    }

    #[cfg(feature = "parallel")]
    fn use_parallel(&self, table: &PieceTable) -> bool {
        self.options.parallel && table.len() >= PARALLEL_THRESHOLD
    }

    #[cfg(not(feature = "parallel"))]
    fn use_parallel(&self, _table: &PieceTable) -> bool {
        false
    }

    #[cfg(feature = "parallel")]
    fn decode_parallel<S: ReadAt + Sync + ?Sized>(
        &self,
        word_document: &S,
        table: &PieceTable,
    ) -> Vec<Result<String>> {
        let ranges: Vec<TextRange> = table.ranges().collect();
        ranges
            .par_iter()
            .map(|range| self.decode_piece(word_document, range))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn decode_parallel<S: ReadAt + Sync + ?Sized>(
        &self,
        word_document: &S,
        table: &PieceTable,
    ) -> Vec<Result<String>> {
        table
            .ranges()
            .map(|range| self.decode_piece(word_document, &range))
            .collect()
    }

    /// Read and decode a single piece.
    pub fn decode_piece<S: ReadAt + ?Sized>(
        &self,
        word_document: &S,
        range: &TextRange,
    ) -> Result<String> {
        let (offset, len) = range.physical_span();
        debug!(
            "piece {}: CP {}..{}, {} bytes at {offset}, compressed {}",
            range.index, range.cp_start, range.cp_end, len, range.descriptor.compressed
        );

        let bytes = read_exact_at(
            word_document,
            offset,
            len,
            Phase::TextRange { piece: range.index },
        )?;

        if range.descriptor.compressed {
            return Ok(decode_compressed(&bytes, self.options.compressed_encoding));
        }

        let mut units = Utf16Accumulator::with_capacity(bytes.len());
        units.extend(&bytes);
        Ok(decode_utf16_units(&units.finish()))
    }
}
