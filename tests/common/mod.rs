//! Builders for synthetic .doc files used by the integration tests.
#![allow(dead_code)]

use doctext::doc::PieceDescriptor;
use doctext::ole::consts::{ENDOFCHAIN, FATSECT, FREESECT, NOSTREAM};

const SECTOR: usize = 512;
const MINI_SECTOR: usize = 64;
const MINI_CUTOFF: usize = 4096;

pub const FIB_PREFIX_SIZE: usize = 894;

/// Character counts in FibRgLw97 order: text, ftn, hdd, mcr, atn, edn,
/// txbx, hdr_txbx.
pub type Counts = [u32; 8];

pub fn text_only(ccp_text: u32) -> Counts {
    [ccp_text, 0, 0, 0, 0, 0, 0, 0]
}

/// A Word 97 FIB prefix with csw = 14, cslw = 22 and cbRgFcLcb = 93.
pub fn fib_prefix(which_table: u8, counts: Counts, fc_clx: u32, lcb_clx: u32) -> Vec<u8> {
    let mut data = vec![0u8; FIB_PREFIX_SIZE];
    data[0..2].copy_from_slice(&0xA5ECu16.to_le_bytes());
    data[2..4].copy_from_slice(&0x00C1u16.to_le_bytes());
    data[6..8].copy_from_slice(&0x0409u16.to_le_bytes());
    data[11] = which_table << 1;
    data[32..34].copy_from_slice(&14u16.to_le_bytes());
    data[62..64].copy_from_slice(&22u16.to_le_bytes());
    for (i, count) in counts.iter().enumerate() {
        let at = 64 + (3 + i) * 4;
        data[at..at + 4].copy_from_slice(&count.to_le_bytes());
    }
    data[152..154].copy_from_slice(&93u16.to_le_bytes());
    data[418..422].copy_from_slice(&fc_clx.to_le_bytes());
    data[422..426].copy_from_slice(&lcb_clx.to_le_bytes());
    data
}

/// A CLX: the given Prc records (each `[0x01, len_lo, len_hi, ...]`)
/// followed by a Pcdt.
pub fn clx(prcs: &[Vec<u8>], cps: &[u32], pieces: &[PieceDescriptor]) -> Vec<u8> {
    let mut out: Vec<u8> = prcs.concat();
    let lcb = (cps.len() * 4 + pieces.len() * 8) as u32;
    out.push(0x02);
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

/// A Prc record carrying `grpprl`.
pub fn prc(grpprl: &[u8]) -> Vec<u8> {
    let mut out = vec![0x01];
    out.extend_from_slice(&(grpprl.len() as i16).to_le_bytes());
    out.extend_from_slice(grpprl);
    out
}

pub fn compressed(physical_offset: u32) -> PieceDescriptor {
    PieceDescriptor {
        fc: physical_offset * 2,
        compressed: true,
    }
}

pub fn unicode(physical_offset: u32) -> PieceDescriptor {
    PieceDescriptor {
        fc: physical_offset,
        compressed: false,
    }
}

pub fn utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Streams of a simple document: the text segments are laid out in the
/// WordDocument stream starting at 4096, one piece per segment.
pub struct DocBuilder {
    which_table: u8,
    counts: Option<Counts>,
    prcs: Vec<Vec<u8>>,
    segments: Vec<(String, bool)>,
    cp_length_delta: i64,
}

impl DocBuilder {
    pub fn new() -> Self {
        Self {
            which_table: 1,
            counts: None,
            prcs: Vec::new(),
            segments: Vec::new(),
            cp_length_delta: 0,
        }
    }

    pub fn table(mut self, which: u8) -> Self {
        self.which_table = which;
        self
    }

    pub fn compressed(mut self, text: &str) -> Self {
        self.segments.push((text.to_string(), true));
        self
    }

    pub fn unicode(mut self, text: &str) -> Self {
        self.segments.push((text.to_string(), false));
        self
    }

    pub fn prc(mut self, grpprl: &[u8]) -> Self {
        self.prcs.push(prc(grpprl));
        self
    }

    /// Override the FIB counters instead of deriving ccpText from the text.
    pub fn counts(mut self, counts: Counts) -> Self {
        self.counts = Some(counts);
        self
    }

    /// Shift the piece table's final boundary away from the FIB length.
    pub fn skew_last_cp(mut self, delta: i64) -> Self {
        self.cp_length_delta = delta;
        self
    }

    pub fn table_name(&self) -> &'static str {
        if self.which_table == 1 { "1Table" } else { "0Table" }
    }

    /// Returns the WordDocument and table stream contents.
    pub fn build(&self) -> (Vec<u8>, Vec<u8>) {
        let mut body = Vec::new();
        let mut cps = vec![0u32];
        let mut pieces = Vec::new();
        for (text, is_compressed) in &self.segments {
            let offset = (4096 + body.len()) as u32;
            let chars = if *is_compressed {
                pieces.push(compressed(offset));
                body.extend(text.chars().map(|c| c as u8));
                text.chars().count()
            } else {
                pieces.push(unicode(offset));
                let bytes = utf16le(text);
                let units = bytes.len() / 2;
                body.extend(bytes);
                units
            };
            cps.push(cps[cps.len() - 1] + chars as u32);
        }

        let derived_length = cps[cps.len() - 1];
        if let Some(last) = cps.last_mut() {
            *last = (i64::from(*last) + self.cp_length_delta) as u32;
        }
        let clx = clx(&self.prcs, &cps, &pieces);
        let counts = self.counts.unwrap_or_else(|| text_only(derived_length));

        let mut word = fib_prefix(self.which_table, counts, 0, clx.len() as u32);
        word.resize(4096, 0);
        word.extend(body);
        (word, clx)
    }

    /// A complete compound file holding the document.
    pub fn compound_file(&self) -> Vec<u8> {
        let (word, table) = self.build();
        write_compound_file(&[("WordDocument", word), (self.table_name(), table)])
    }
}

impl Default for DocBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a version 3 compound file with the given root-level streams.
///
/// Streams below 4096 bytes go to the mini stream, the rest get their own
/// FAT chains.
pub fn write_compound_file(streams: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let sectors_for = |len: usize| len.div_ceil(SECTOR) as u32;

    // Mini stream and MiniFAT
    let mut ministream = Vec::new();
    let mut minifat: Vec<u32> = Vec::new();
    let mut mini_start = Vec::new();
    for (_, data) in streams {
        if data.len() >= MINI_CUTOFF || data.is_empty() {
            mini_start.push(None);
            continue;
        }
        let first = minifat.len() as u32;
        let count = data.len().div_ceil(MINI_SECTOR) as u32;
        for i in 0..count {
            minifat.push(if i + 1 == count { ENDOFCHAIN } else { first + i + 1 });
        }
        ministream.extend_from_slice(data);
        ministream.resize(minifat.len() * MINI_SECTOR, 0);
        mini_start.push(Some(first));
    }

    let dir_sectors = sectors_for((streams.len() + 1) * 128);
    let minifat_sectors = sectors_for(minifat.len() * 4);
    let ministream_sectors = sectors_for(ministream.len());
    let big_sectors: u32 = streams
        .iter()
        .filter(|(_, d)| d.len() >= MINI_CUTOFF)
        .map(|(_, d)| sectors_for(d.len()))
        .sum();
    let payload = dir_sectors + minifat_sectors + ministream_sectors + big_sectors;
    let mut fat_sectors = 1u32;
    while fat_sectors * (SECTOR as u32 / 4) < fat_sectors + payload {
        fat_sectors += 1;
    }
    let total = fat_sectors + payload;

    let mut fat = vec![FREESECT; (fat_sectors as usize) * SECTOR / 4];
    let mut image = vec![0u8; total as usize * SECTOR];
    let mut next_free = fat_sectors;
    for s in 0..fat_sectors {
        fat[s as usize] = FATSECT;
    }

    let mut place = |fat: &mut Vec<u32>, image: &mut Vec<u8>, data: &[u8]| -> u32 {
        let count = sectors_for(data.len()).max(1);
        let first = next_free;
        for i in 0..count {
            let sector = first + i;
            fat[sector as usize] = if i + 1 == count { ENDOFCHAIN } else { sector + 1 };
        }
        let at = first as usize * SECTOR;
        image[at..at + data.len()].copy_from_slice(data);
        next_free += count;
        first
    };

    // Directory: root, then one entry per stream chained through right siblings
    let mut dir = vec![0u8; dir_sectors as usize * SECTOR];
    for slot in dir.chunks_mut(128) {
        slot[68..80].copy_from_slice(&[0xFF; 12]);
    }
    let dir_start_placeholder = dir.clone();
    let dir_first = place(&mut fat, &mut image, &dir_start_placeholder);

    let minifat_bytes: Vec<u8> = minifat.iter().flat_map(|v| v.to_le_bytes()).collect();
    let minifat_first = if minifat.is_empty() {
        ENDOFCHAIN
    } else {
        place(&mut fat, &mut image, &minifat_bytes)
    };
    let ministream_first = if ministream.is_empty() {
        ENDOFCHAIN
    } else {
        place(&mut fat, &mut image, &ministream)
    };

    write_dir_entry(
        &mut dir[0..128],
        "Root Entry",
        5,
        NOSTREAM,
        if streams.is_empty() { NOSTREAM } else { 1 },
        ministream_first,
        ministream.len() as u64,
    );
    for (i, (name, data)) in streams.iter().enumerate() {
        let start = match mini_start[i] {
            Some(first) => first,
            None if data.is_empty() => ENDOFCHAIN,
            None => place(&mut fat, &mut image, data),
        };
        let right = if i + 1 < streams.len() { i as u32 + 2 } else { NOSTREAM };
        let at = (i + 1) * 128;
        write_dir_entry(&mut dir[at..at + 128], name, 2, right, NOSTREAM, start, data.len() as u64);
    }
    let at = dir_first as usize * SECTOR;
    image[at..at + dir.len()].copy_from_slice(&dir);

    for s in 0..fat_sectors as usize {
        let bytes: Vec<u8> = fat[s * SECTOR / 4..(s + 1) * SECTOR / 4]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        image[s * SECTOR..(s + 1) * SECTOR].copy_from_slice(&bytes);
    }

    let mut header = vec![0u8; SECTOR];
    header[0..8].copy_from_slice(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]);
    header[24..26].copy_from_slice(&0x003Eu16.to_le_bytes());
    header[26..28].copy_from_slice(&3u16.to_le_bytes());
    header[28..30].copy_from_slice(&0xFFFEu16.to_le_bytes());
    header[30..32].copy_from_slice(&9u16.to_le_bytes());
    header[32..34].copy_from_slice(&6u16.to_le_bytes());
    header[44..48].copy_from_slice(&fat_sectors.to_le_bytes());
    header[48..52].copy_from_slice(&dir_first.to_le_bytes());
    header[56..60].copy_from_slice(&(MINI_CUTOFF as u32).to_le_bytes());
    header[60..64].copy_from_slice(&minifat_first.to_le_bytes());
    header[64..68].copy_from_slice(&minifat_sectors.to_le_bytes());
    header[68..72].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
    for slot in 0..109u32 {
        let value = if slot < fat_sectors { slot } else { FREESECT };
        let at = 76 + slot as usize * 4;
        header[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    header.extend(image);
    header
}

fn write_dir_entry(
    slot: &mut [u8],
    name: &str,
    entry_type: u8,
    right: u32,
    child: u32,
    start: u32,
    size: u64,
) {
    let units: Vec<u8> = utf16le(name);
    slot[..units.len()].copy_from_slice(&units);
    slot[64..66].copy_from_slice(&((units.len() + 2) as u16).to_le_bytes());
    slot[66] = entry_type;
    slot[67] = 1;
    slot[68..72].copy_from_slice(&NOSTREAM.to_le_bytes());
    slot[72..76].copy_from_slice(&right.to_le_bytes());
    slot[76..80].copy_from_slice(&child.to_le_bytes());
    slot[116..120].copy_from_slice(&start.to_le_bytes());
    slot[120..128].copy_from_slice(&size.to_le_bytes());
}
