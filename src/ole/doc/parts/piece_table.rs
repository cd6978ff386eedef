/// Piece Table parser for DOC files.
///
/// The piece table maps Character Positions (CP) to byte offsets in the
/// WordDocument stream. It lives in the CLX blob of the table stream, after
/// zero or more Prc records.
///
/// References:
/// - [MS-DOC] 2.9.38 Clx
/// - [MS-DOC] 2.9.209 Prc
/// - [MS-DOC] 2.9.178 Pcdt
/// - [MS-DOC] 2.9.177 Pcd
/// - [MS-DOC] 2.9.73 FcCompressed
use super::super::package::{DocError, Phase, Result};
use super::super::store::{ReadAt, read_exact_at};
use super::fib::FileInformationBlock;
use crate::common::binary;
use crate::ole::plcf::Plcf;
use log::{debug, warn};

/// Tag byte of a Prc (property modifier) record
pub const PRC_TAG: u8 = 0x01;

/// Tag byte of the Pcdt (piece table) record
pub const PCDT_TAG: u8 = 0x02;

/// Size of one Pcd record in the PlcPcd
pub const PCD_SIZE: usize = 8;

/// Where one piece's bytes live and how they are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceDescriptor {
    /// Raw file position; halve it for compressed pieces
    pub fc: u32,
    /// One byte per character instead of UTF-16LE
    pub compressed: bool,
}

impl PieceDescriptor {
    /// Unpack the FcCompressed word.
    ///
    /// Bit 1 is the compression flag and the file position is everything
    /// above bit 1. Every word is valid.
    ///
    /// # Examples
    ///
    /// ```
    /// use doctext::doc::parts::piece_table::PieceDescriptor;
    ///
    /// let pcd = PieceDescriptor::unpack(0x0000_8002);
    /// assert!(pcd.compressed);
    /// assert_eq!(pcd.fc, 0x2000);
    /// ```
    #[inline]
    pub const fn unpack(word: u32) -> Self {
        Self {
            fc: word >> 2,
            compressed: (word >> 1) & 1 == 1,
        }
    }

    /// Decode bytes 2..6 of an 8-byte Pcd record.
    pub fn from_pcd(pcd: &[u8]) -> binary::BinaryResult<Self> {
        binary::read_u32_be(pcd, 2).map(Self::unpack)
    }

    /// Inverse of [`unpack`](Self::unpack), used to build tables.
    #[inline]
    pub const fn pack(&self) -> u32 {
        (self.fc << 2) | ((self.compressed as u32) << 1)
    }
}

/// One piece together with the CP range it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    /// Position of the piece in the table
    pub index: usize,
    pub cp_start: u32,
    pub cp_end: u32,
    pub descriptor: PieceDescriptor,
}

impl TextRange {
    /// Number of characters in the piece.
    #[inline]
    pub fn char_count(&self) -> u32 {
        self.cp_end - self.cp_start
    }

    /// Byte offset and byte length of the piece in the WordDocument stream.
    ///
    /// Compressed pieces start at `fc / 2` with one byte per character;
    /// otherwise at `fc` with two.
    pub fn physical_span(&self) -> (u64, usize) {
        let count = self.char_count() as usize;
        if self.descriptor.compressed {
            (u64::from(self.descriptor.fc / 2), count)
        } else {
            (u64::from(self.descriptor.fc), count.saturating_mul(2))
        }
    }
}

/// Decoded PlcPcd: n+1 character positions and n piece descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceTable {
    cps: Vec<u32>,
    pieces: Vec<PieceDescriptor>,
    lcb: u32,
}

impl PieceTable {
    /// Read the CLX from the table stream and decode it.
    ///
    /// The table is only accepted when its last boundary equals the
    /// document length derived from the FIB.
    pub fn read<S: ReadAt + ?Sized>(
        table_stream: &S,
        fib: &FileInformationBlock,
        strict: bool,
    ) -> Result<Self> {
        let clx = read_exact_at(
            table_stream,
            u64::from(fib.fc_clx()),
            fib.lcb_clx() as usize,
            Phase::PieceTable,
        )?;
        let table = Self::parse(&clx, strict)?;
        table.check_length(fib.cp_length())?;
        Ok(table)
    }

    /// Parse a CLX blob.
    ///
    /// # Arguments
    ///
    /// * `clx` - Exactly `lcbClx` bytes read at `fcClx`
    /// * `strict` - Reject a PlcPcd with a partial trailing descriptor
    pub fn parse(clx: &[u8], strict: bool) -> Result<Self> {
        let mut offset = skip_prc_records(clx)?;

        match clx.get(offset) {
            Some(&PCDT_TAG) => offset += 1,
            found => {
                return Err(DocError::InvalidPieceTableTag {
                    offset,
                    found: found.copied(),
                });
            },
        }

        let lcb = binary::read_u32_le(clx, offset)
            .map_err(|e| DocError::PieceTableOutOfBounds(e.into()))?;
        offset += 4;

        let plc = Plcf::parse(clx, offset, lcb, PCD_SIZE).map_err(DocError::PieceTableOutOfBounds)?;
        if plc.remainder() != 0 {
            if strict {
                return Err(DocError::UnalignedPieceTable {
                    lcb,
                    remainder: plc.remainder(),
                });
            }
            warn!(
                "PlcPcd length {lcb} leaves {} trailing bytes, ignoring partial descriptor",
                plc.remainder()
            );
        }

        let cps = plc.positions().to_vec();
        if let Some(index) = cps.windows(2).position(|w| w[1] < w[0]) {
            return Err(DocError::NonMonotonicBoundaries {
                index: index + 1,
                previous: cps[index],
                current: cps[index + 1],
            });
        }

        let pieces = (0..plc.count())
            .filter_map(|i| plc.element(i))
            .map(PieceDescriptor::from_pcd)
            .collect::<binary::BinaryResult<Vec<_>>>()
            .map_err(|e| DocError::PieceTableOutOfBounds(e.into()))?;

        debug!("piece table: {} pieces, lcb {lcb}, CP range {:?}", pieces.len(), cps.last());
        Ok(Self { cps, pieces, lcb })
    }

    /// Reject the table unless it ends at `cp_length`.
    pub fn check_length(&self, cp_length: u32) -> Result<()> {
        let actual = self.last_cp();
        if actual != cp_length {
            return Err(DocError::CpLengthMismatch {
                expected: cp_length,
                actual,
            });
        }
        Ok(())
    }

    /// Character positions, one more than there are pieces.
    #[inline]
    pub fn cps(&self) -> &[u32] {
        &self.cps
    }

    #[inline]
    pub fn pieces(&self) -> &[PieceDescriptor] {
        &self.pieces
    }

    /// Declared byte length of the PlcPcd.
    #[inline]
    pub fn lcb(&self) -> u32 {
        self.lcb
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Last character position, i.e. the document length the table covers.
    #[inline]
    pub fn last_cp(&self) -> u32 {
        self.cps.last().copied().unwrap_or(0)
    }

    /// Iterate pieces in CP order.
    pub fn ranges(&self) -> impl ExactSizeIterator<Item = TextRange> + '_ {
        self.pieces
            .iter()
            .enumerate()
            .map(|(index, &descriptor)| TextRange {
                index,
                cp_start: self.cps[index],
                cp_end: self.cps[index + 1],
                descriptor,
            })
    }

    /// Find the piece containing a character position.
    pub fn range_for_cp(&self, cp: u32) -> Option<TextRange> {
        // First boundary strictly above cp closes the containing piece
        let end = self.cps.partition_point(|&b| b <= cp);
        if end == 0 || end > self.pieces.len() {
            return None;
        }
        let index = end - 1;
        Some(TextRange {
            index,
            cp_start: self.cps[index],
            cp_end: self.cps[end],
            descriptor: self.pieces[index],
        })
    }
}

/// Skip the Prc records at the start of a CLX.
///
/// Returns the offset of the first byte that is not a Prc tag, which is
/// `clx.len()` when the records run to the end.
pub fn skip_prc_records(clx: &[u8]) -> Result<usize> {
    let mut offset = 0;
    while clx.get(offset) == Some(&PRC_TAG) {
        let length = binary::read_i16_le(clx, offset + 1).map_err(|_| DocError::InvalidPrc {
            offset,
            length: None,
        })?;
        let next = usize::try_from(length)
            .ok()
            .filter(|&len| len > 0)
            .map(|len| offset + 3 + len)
            .filter(|&next| next <= clx.len())
            .ok_or(DocError::InvalidPrc {
                offset,
                length: Some(length),
            })?;
        debug!("skipping Prc at {offset}, cbGrpprl {length}");
        offset = next;
    }
    Ok(offset)
}

/// Serialize a piece table the way it appears in a CLX, after the Prc
/// records.
#[cfg(test)]
pub(crate) fn pcdt_bytes(cps: &[u32], pieces: &[PieceDescriptor]) -> Vec<u8> {
    let lcb = (cps.len() * 4 + pieces.len() * PCD_SIZE) as u32;
    let mut out = vec![PCDT_TAG];
    out.extend_from_slice(&lcb.to_le_bytes());
    for cp in cps {
        out.extend_from_slice(&cp.to_le_bytes());
    }
    for pcd in pieces {
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&pcd.pack().to_be_bytes());
        out.extend_from_slice(&[0, 0]);
    }
    out
}
