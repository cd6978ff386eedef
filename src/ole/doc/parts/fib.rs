/// File Information Block (FIB) parser for DOC files.
///
/// The FIB is located at the beginning of the WordDocument stream. Only the
/// Word 97 prefix is read: FibBase, the FibRgW97/FibRgLw97 blocks and the
/// FibRgFcLcb97 table far enough to reach the CLX pointer.
///
/// References:
/// - [MS-DOC] 2.5.1 Fib
/// - [MS-DOC] 2.5.2 FibBase
/// - [MS-DOC] 2.5.4 FibRgLw97
/// - [MS-DOC] 2.5.5 FibRgFcLcb97
use super::super::package::{DocError, Phase, Result};
use super::super::store::{ReadAt, read_exact_at};
use crate::common::binary;
use crate::ole::consts::TABLE_STREAMS;
use log::{debug, warn};

/// Bytes of the WordDocument stream buffered for parsing, enough to cover
/// FibRgFcLcb97.
pub const FIB_PREFIX_SIZE: usize = 894;

/// Size of FibBase; FibRgW's `csw` count follows it
const FIB_BASE_SIZE: usize = 32;

/// FibBase byte holding `fWhichTblStm` in bit 1
const WHICH_TABLE_BYTE: usize = 11;

/// FibRgLw97 slots of the character counts, in 4-byte units
const CCP_TEXT_SLOT: usize = 3;

/// FibRgFcLcb97 slots of `fcClx` and `lcbClx`, in 4-byte units
const FC_CLX_SLOT: usize = 66;
const LCB_CLX_SLOT: usize = 67;

/// Magic number of Word 97 and later
const WORD97_MAGIC: u16 = 0xA5EC;

/// Character counts from FibRgLw97.
///
/// Each counter is the length in characters of one of the document parts
/// laid out back to back in CP space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CharacterCounts {
    /// Main document text
    pub ccp_text: u32,
    /// Footnotes
    pub ccp_ftn: u32,
    /// Headers and footers
    pub ccp_hdd: u32,
    /// Macros (unused, kept for layout)
    pub ccp_mcr: u32,
    /// Comments
    pub ccp_atn: u32,
    /// Endnotes
    pub ccp_edn: u32,
    /// Textboxes
    pub ccp_txbx: u32,
    /// Header textboxes
    pub ccp_hdr_txbx: u32,
}

impl CharacterCounts {
    /// Total CP length the piece table must end at.
    ///
    /// When any part besides the main text is present the parts are summed
    /// plus one for the final paragraph mark. The endnote count is added
    /// twice; documents produced against that rule must keep matching it.
    ///
    /// # Examples
    ///
    /// ```
    /// use doctext::doc::parts::fib::CharacterCounts;
    ///
    /// let main_only = CharacterCounts { ccp_text: 6, ..Default::default() };
    /// assert_eq!(main_only.cp_length(), 6);
    ///
    /// let with_notes = CharacterCounts { ccp_text: 6, ccp_ftn: 2, ccp_edn: 3, ..Default::default() };
    /// assert_eq!(with_notes.cp_length(), 6 + 2 + 3 + 3 + 1);
    /// ```
    pub fn cp_length(&self) -> u32 {
        let others = [
            self.ccp_ftn,
            self.ccp_hdd,
            self.ccp_mcr,
            self.ccp_atn,
            self.ccp_edn,
            self.ccp_txbx,
            self.ccp_hdr_txbx,
        ];
        if others.iter().all(|&c| c == 0) {
            return self.ccp_text;
        }
        others
            .iter()
            .fold(self.ccp_text, |sum, &c| sum.wrapping_add(c))
            .wrapping_add(self.ccp_edn)
            .wrapping_add(1)
    }
}

/// File Information Block.
///
/// Immutable once parsed. Holds what text extraction needs: which table
/// stream to use, the character counts and where the CLX lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInformationBlock {
    /// wIdent
    magic: u16,
    /// File format version
    nfib: u16,
    /// Language ID
    lid: u16,
    /// Flags word at offset 10 (fEncrypted, fWhichTblStm, ...)
    flags: u16,
    /// 0 for "0Table", 1 for "1Table"
    which_table_stream: u8,
    /// Size of FibRgW in bytes
    csw: usize,
    /// Size of FibRgLw in bytes
    cslw: usize,
    /// Number of FibRgFcLcb entries
    cb_rg_fc_lcb: u16,
    counts: CharacterCounts,
    cp_length: u32,
    fc_clx: u32,
    lcb_clx: u32,
}

impl FileInformationBlock {
    /// Read and parse the FIB prefix of a WordDocument stream.
    ///
    /// `None` means the container has no WordDocument stream at all, which
    /// is reported separately from a stream that is merely too short.
    pub fn read<S: ReadAt + ?Sized>(word_document: Option<&S>) -> Result<Self> {
        let word_document = word_document.ok_or(DocError::DocumentMissing)?;
        let prefix = read_exact_at(word_document, 0, FIB_PREFIX_SIZE, Phase::Header)?;
        Self::parse(&prefix)
    }

    /// Parse a FIB from the first bytes of the WordDocument stream.
    ///
    /// # Arguments
    ///
    /// * `prefix` - At least [`FIB_PREFIX_SIZE`] bytes from offset 0
    pub fn parse(prefix: &[u8]) -> Result<Self> {
        if prefix.len() < FIB_PREFIX_SIZE {
            return Err(DocError::Truncated {
                phase: Phase::Header,
                offset: 0,
                expected: FIB_PREFIX_SIZE,
                actual: prefix.len(),
            });
        }
        let prefix = &prefix[..FIB_PREFIX_SIZE];

        // FibBase
        let magic = fib_u16(prefix, 0)?;
        let nfib = fib_u16(prefix, 2)?;
        let lid = fib_u16(prefix, 6)?;
        let flags = fib_u16(prefix, 10)?;
        let which_table_stream = (fib_u8(prefix, WHICH_TABLE_BYTE)? >> 1) & 1;
        if magic != WORD97_MAGIC {
            warn!("unexpected FIB magic 0x{magic:04X}, continuing");
        }

        // FibRgW: csw counts 16-bit words
        let csw = usize::from(fib_u16(prefix, FIB_BASE_SIZE)?) * 2;
        let cslw_offset = FIB_BASE_SIZE + 2 + csw;

        // FibRgLw: cslw counts 32-bit words
        let cslw = usize::from(fib_u16(prefix, cslw_offset)?) * 4;
        let rg_lw = cslw_offset + 2;
        let counter = |slot: usize| fib_u32(prefix, rg_lw + slot * 4);
        let counts = CharacterCounts {
            ccp_text: counter(CCP_TEXT_SLOT)?,
            ccp_ftn: counter(CCP_TEXT_SLOT + 1)?,
            ccp_hdd: counter(CCP_TEXT_SLOT + 2)?,
            ccp_mcr: counter(CCP_TEXT_SLOT + 3)?,
            ccp_atn: counter(CCP_TEXT_SLOT + 4)?,
            ccp_edn: counter(CCP_TEXT_SLOT + 5)?,
            ccp_txbx: counter(CCP_TEXT_SLOT + 6)?,
            ccp_hdr_txbx: counter(CCP_TEXT_SLOT + 7)?,
        };

        // FibRgFcLcb: cbRgFcLcb counts (fc, lcb) pairs
        let cb_rg_fc_lcb_offset = rg_lw + cslw;
        let cb_rg_fc_lcb = fib_u16(prefix, cb_rg_fc_lcb_offset)?;
        let rg_fc_lcb = cb_rg_fc_lcb_offset + 2;
        let fc_clx = fib_u32(prefix, rg_fc_lcb + FC_CLX_SLOT * 4)?;
        let lcb_clx = fib_u32(prefix, rg_fc_lcb + LCB_CLX_SLOT * 4)?;

        let cp_length = counts.cp_length();
        debug!(
            "FIB: nFib 0x{nfib:04X}, table {which_table_stream}, csw {csw}, cslw {cslw}, \
             ccpText {}, cpLength {cp_length}, fcClx {fc_clx}, lcbClx {lcb_clx}",
            counts.ccp_text
        );

        Ok(Self {
            magic,
            nfib,
            lid,
            flags,
            which_table_stream,
            csw,
            cslw,
            cb_rg_fc_lcb,
            counts,
            cp_length,
            fc_clx,
            lcb_clx,
        })
    }

    /// Get the magic number (0xA5EC for Word 97 and later).
    #[inline]
    pub fn magic(&self) -> u16 {
        self.magic
    }

    /// Get the file format version.
    ///
    /// Common values:
    /// - 0x00C1 (193): Word 97 through Word 2003
    /// - 0x0101 (257): Word 2007
    /// - 0x0112 (274): Word 2010+
    #[inline]
    pub fn version(&self) -> u16 {
        self.nfib
    }

    /// Get the language ID.
    #[inline]
    pub fn language_id(&self) -> u16 {
        self.lid
    }

    /// Check if the document is encrypted.
    ///
    /// Encrypted documents are not decrypted; their piece table will
    /// usually fail validation.
    #[inline]
    pub fn is_encrypted(&self) -> bool {
        // fEncrypted is bit 8 of the flags word
        (self.flags & 0x0100) != 0
    }

    /// Which table stream is authoritative: 0 or 1.
    #[inline]
    pub fn which_table_stream(&self) -> u8 {
        self.which_table_stream
    }

    /// Name of the authoritative table stream.
    #[inline]
    pub fn table_stream_name(&self) -> &'static str {
        TABLE_STREAMS[usize::from(self.which_table_stream)]
    }

    /// Size of FibRgW in bytes.
    #[inline]
    pub fn csw(&self) -> usize {
        self.csw
    }

    /// Size of FibRgLw in bytes.
    #[inline]
    pub fn cslw(&self) -> usize {
        self.cslw
    }

    /// Number of (fc, lcb) pairs declared in FibRgFcLcb.
    #[inline]
    pub fn cb_rg_fc_lcb(&self) -> u16 {
        self.cb_rg_fc_lcb
    }

    #[inline]
    pub fn counts(&self) -> &CharacterCounts {
        &self.counts
    }

    /// Total CP length the piece table must end at.
    #[inline]
    pub fn cp_length(&self) -> u32 {
        self.cp_length
    }

    /// Offset of the CLX in the table stream.
    #[inline]
    pub fn fc_clx(&self) -> u32 {
        self.fc_clx
    }

    /// Length of the CLX in bytes.
    #[inline]
    pub fn lcb_clx(&self) -> u32 {
        self.lcb_clx
    }
}

#[inline]
fn fib_u8(prefix: &[u8], offset: usize) -> Result<u8> {
    binary::read_u8(prefix, offset).map_err(DocError::FibInvalid)
}

#[inline]
fn fib_u16(prefix: &[u8], offset: usize) -> Result<u16> {
    binary::read_u16_le(prefix, offset).map_err(DocError::FibInvalid)
}

#[inline]
fn fib_u32(prefix: &[u8], offset: usize) -> Result<u32> {
    binary::read_u32_le(prefix, offset).map_err(DocError::FibInvalid)
}

/// Build a Word 97 FIB prefix with the usual block sizes.
#[cfg(test)]
pub(crate) fn synthetic_prefix(
    which_table: u8,
    counts: &CharacterCounts,
    fc_clx: u32,
    lcb_clx: u32,
) -> Vec<u8> {
    let mut data = vec![0u8; FIB_PREFIX_SIZE];
    data[0..2].copy_from_slice(&WORD97_MAGIC.to_le_bytes());
    data[2..4].copy_from_slice(&0x00C1u16.to_le_bytes());
    data[WHICH_TABLE_BYTE] = which_table << 1;
    // csw = 14 words, cslw = 22 longs, cbRgFcLcb = 93 pairs
    data[32..34].copy_from_slice(&14u16.to_le_bytes());
    data[62..64].copy_from_slice(&22u16.to_le_bytes());
    let values = [
        counts.ccp_text,
        counts.ccp_ftn,
        counts.ccp_hdd,
        counts.ccp_mcr,
        counts.ccp_atn,
        counts.ccp_edn,
        counts.ccp_txbx,
        counts.ccp_hdr_txbx,
    ];
    for (i, value) in values.iter().enumerate() {
        let at = 64 + (CCP_TEXT_SLOT + i) * 4;
        data[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }
    data[152..154].copy_from_slice(&93u16.to_le_bytes());
    data[418..422].copy_from_slice(&fc_clx.to_le_bytes());
    data[422..426].copy_from_slice(&lcb_clx.to_le_bytes());
    data
}
