use super::consts::*;
use crate::common::encoding::decode_utf16le_name;
use bytes::Bytes;
use log::debug;
use std::collections::HashSet;
use std::io::{self, Read, Seek, SeekFrom};
use thiserror::Error;
use zerocopy::{FromBytes, LE, U16, U32, U64};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw compound file header (512 bytes).
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
#[allow(dead_code)]
struct RawHeader {
    signature: [u8; 8],
    clsid: [u8; 16],
    minor_version: U16<LE>,
    major_version: U16<LE>,
    byte_order: U16<LE>,
    sector_shift: U16<LE>,
    mini_sector_shift: U16<LE>,
    reserved: [u8; 6],
    num_dir_sectors: U32<LE>,
    num_fat_sectors: U32<LE>,
    first_dir_sector: U32<LE>,
    transaction_signature: U32<LE>,
    mini_stream_cutoff: U32<LE>,
    first_minifat_sector: U32<LE>,
    num_minifat_sectors: U32<LE>,
    first_difat_sector: U32<LE>,
    num_difat_sectors: U32<LE>,
    /// First 109 FAT sector locations
    difat: [U32<LE>; HEADER_DIFAT_SLOTS],
}

/// Raw directory entry structure (128 bytes)
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
#[allow(dead_code)]
struct RawDirectoryEntry {
    /// Entry name in UTF-16LE (64 bytes, null-padded)
    name: [u8; 64],
    /// Length of name in bytes (including null terminator)
    name_len: U16<LE>,
    /// Entry type (1 = storage, 2 = stream, 5 = root)
    entry_type: u8,
    node_color: u8,
    sid_left: U32<LE>,
    sid_right: U32<LE>,
    sid_child: U32<LE>,
    clsid: [u8; 16],
    state_bits: U32<LE>,
    creation_time: U64<LE>,
    modified_time: U64<LE>,
    start_sector: U32<LE>,
    stream_size: U64<LE>,
}

/// Error types for compound file parsing
#[derive(Debug, Error)]
pub enum CfbError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Not a compound file")]
    NotCompoundFile,
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Corrupted file: {0}")]
    Corrupted(String),
    #[error("Stream not found: {0}")]
    StreamNotFound(String),
}

/// A stream or storage directly below the root storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Storage ID (index in directory)
    pub sid: u32,
    /// Entry name
    pub name: String,
    /// Entry type (stream, storage, root)
    pub entry_type: u8,
    /// First sector of the stream
    pub start_sector: u32,
    /// Size of the stream in bytes
    pub size: u64,
}

impl DirEntry {
    #[inline]
    pub fn is_stream(&self) -> bool {
        self.entry_type == STGTY_STREAM
    }
}

/// Read-only view of a compound file (OLE2 structured storage).
///
/// Only the root storage's direct children are indexed; that is where Word
/// keeps `WordDocument`, `0Table` and `1Table`.
///
/// # Examples
///
/// ```rust,no_run
/// use doctext::ole::CompoundFile;
/// use std::fs::File;
///
/// let mut cfb = CompoundFile::open(File::open("document.doc")?)?;
/// for name in cfb.stream_names() {
///     println!("{name}");
/// }
/// let word_document = cfb.open_stream("WordDocument")?;
/// println!("{} bytes", word_document.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct CompoundFile<R: Read + Seek> {
    reader: R,
    sector_size: usize,
    mini_sector_size: usize,
    mini_stream_cutoff: u32,
    fat: Vec<u32>,
    minifat: Vec<u32>,
    root: Option<DirEntry>,
    entries: Vec<DirEntry>,
    /// Mini stream data (loaded on demand)
    ministream: Option<Bytes>,
}

impl<R: Read + Seek> CompoundFile<R> {
    /// Parse the header, FAT, directory and MiniFAT of a compound file.
    pub fn open(mut reader: R) -> Result<Self, CfbError> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        if file_size < MINIMAL_OLEFILE_SIZE as u64 {
            return Err(CfbError::NotCompoundFile);
        }

        let mut header_bytes = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header_bytes)?;
        let header = RawHeader::read_from_bytes(&header_bytes[..])
            .map_err(|_| CfbError::InvalidFormat("Failed to parse header".to_string()))?;

        if &header.signature != MAGIC {
            return Err(CfbError::NotCompoundFile);
        }
        if header.byte_order.get() != BYTE_ORDER_LE {
            return Err(CfbError::InvalidFormat("Invalid byte order".to_string()));
        }

        let sector_size = match (header.major_version.get(), header.sector_shift.get()) {
            (3, 9) => SECTOR_SIZE_V3,
            (4, 12) => SECTOR_SIZE_V4,
            (version, shift) => {
                return Err(CfbError::InvalidFormat(format!(
                    "Sector shift {shift} does not match major version {version}"
                )));
            },
        };
        let mini_sector_shift = header.mini_sector_shift.get();
        if mini_sector_shift == 0 || usize::from(mini_sector_shift) >= sector_size.trailing_zeros() as usize {
            return Err(CfbError::InvalidFormat(format!(
                "Invalid mini sector shift {mini_sector_shift}"
            )));
        }

        let mut cfb = CompoundFile {
            reader,
            sector_size,
            mini_sector_size: 1usize << mini_sector_shift,
            mini_stream_cutoff: header.mini_stream_cutoff.get(),
            fat: Vec::new(),
            minifat: Vec::new(),
            root: None,
            entries: Vec::new(),
            ministream: None,
        };

        cfb.load_fat(&header, file_size)?;
        cfb.load_directory(header.first_dir_sector.get())?;
        if header.num_minifat_sectors.get() > 0 {
            cfb.load_minifat(header.first_minifat_sector.get())?;
        }

        debug!(
            "compound file: sector size {}, {} FAT entries, {} root entries",
            cfb.sector_size,
            cfb.fat.len(),
            cfb.entries.len()
        );
        Ok(cfb)
    }

    /// Sector size in bytes (512 or 4096).
    #[inline]
    pub fn sector_size(&self) -> usize {
        self.sector_size
    }

    /// Load the File Allocation Table.
    ///
    /// The first 109 FAT sector locations live in the header, the rest in a
    /// chain of DIFAT sectors whose last slot points at the next one.
    fn load_fat(&mut self, header: &RawHeader, file_size: u64) -> Result<(), CfbError> {
        let mut fat_sectors: Vec<u32> = header
            .difat
            .iter()
            .map(|s| s.get())
            .take_while(|&s| s != FREESECT && s != ENDOFCHAIN)
            .collect();

        let slots_per_sector = self.sector_size / 4 - 1;
        // The file cannot hold more DIFAT sectors than it has sectors
        let max_sectors = usize::try_from(file_size / self.sector_size as u64).unwrap_or(usize::MAX);
        let declared = usize::try_from(header.num_difat_sectors.get()).unwrap_or(usize::MAX);
        let mut visited = HashSet::new();
        let mut difat_sector = header.first_difat_sector.get();
        for _ in 0..declared.min(max_sectors) {
            if difat_sector == ENDOFCHAIN || difat_sector == FREESECT {
                break;
            }
            if difat_sector > MAXREGSECT || !visited.insert(difat_sector) {
                return Err(CfbError::Corrupted(format!(
                    "Invalid or repeated DIFAT sector 0x{difat_sector:08X}"
                )));
            }
            let ids: Vec<u32> = sector_u32s(&self.read_sector(difat_sector)?).collect();
            fat_sectors.extend(
                ids[..slots_per_sector]
                    .iter()
                    .copied()
                    .take_while(|&s| s != FREESECT && s != ENDOFCHAIN),
            );
            difat_sector = ids[slots_per_sector];
        }

        self.fat.reserve(fat_sectors.len() * (self.sector_size / 4));
        for sector in fat_sectors {
            if sector > MAXREGSECT {
                return Err(CfbError::Corrupted(format!(
                    "FAT sector id 0x{sector:08X} is not a regular sector"
                )));
            }
            let data = self.read_sector(sector)?;
            self.fat.extend(sector_u32s(&data));
        }
        Ok(())
    }

    /// Load the MiniFAT (allocation table for streams below the cutoff).
    fn load_minifat(&mut self, first_sector: u32) -> Result<(), CfbError> {
        let data = self.read_chain(first_sector)?;
        self.minifat = sector_u32s(&data).collect();
        Ok(())
    }

    /// Load the directory and index the root storage's children.
    fn load_directory(&mut self, first_sector: u32) -> Result<(), CfbError> {
        let dir_data = self.read_chain(first_sector)?;
        let entry_count = dir_data.len() / DIRENTRY_SIZE;
        if entry_count == 0 {
            return Err(CfbError::Corrupted("Empty directory".to_string()));
        }

        let (root, _, _, root_child) = self.parse_directory_entry(&dir_data, 0)?;
        if root.entry_type != STGTY_ROOT {
            return Err(CfbError::InvalidFormat(
                "First directory entry is not the root storage".to_string(),
            ));
        }

        // In-order walk of the red-black tree hanging off the root.
        let mut visited = vec![false; entry_count];
        visited[0] = true;
        let mut stack: Vec<(DirEntry, u32)> = Vec::new();
        let mut current = root_child;
        loop {
            while current != NOSTREAM {
                let index = current as usize;
                if index >= entry_count {
                    return Err(CfbError::Corrupted(format!(
                        "Invalid directory entry index {current}"
                    )));
                }
                if visited[index] {
                    return Err(CfbError::Corrupted(format!(
                        "Directory tree visits entry {current} twice"
                    )));
                }
                visited[index] = true;
                let (entry, left, right, _) = self.parse_directory_entry(&dir_data, current)?;
                stack.push((entry, right));
                current = left;
            }
            let Some((entry, right)) = stack.pop() else {
                break;
            };
            if entry.entry_type != STGTY_EMPTY {
                self.entries.push(entry);
            }
            current = right;
        }

        self.root = Some(root);
        Ok(())
    }

    /// Parse directory entry `sid`, returning it with its left, right and
    /// child links.
    fn parse_directory_entry(
        &self,
        dir_data: &[u8],
        sid: u32,
    ) -> Result<(DirEntry, u32, u32, u32), CfbError> {
        let offset = sid as usize * DIRENTRY_SIZE;
        let bytes = dir_data
            .get(offset..offset + DIRENTRY_SIZE)
            .ok_or_else(|| CfbError::Corrupted(format!("Directory entry {sid} out of range")))?;
        let raw = RawDirectoryEntry::read_from_bytes(bytes)
            .map_err(|_| CfbError::InvalidFormat("Failed to parse directory entry".to_string()))?;

        let name_len = usize::from(raw.name_len.get()).saturating_sub(2).min(64);
        let name = decode_utf16le_name(&raw.name[..name_len]);

        // 512-byte sector files only use the low 32 bits of the size
        let size = if self.sector_size == SECTOR_SIZE_V3 {
            raw.stream_size.get() & 0xFFFF_FFFF
        } else {
            raw.stream_size.get()
        };

        let entry = DirEntry {
            sid,
            name,
            entry_type: raw.entry_type,
            start_sector: raw.start_sector.get(),
            size,
        };
        Ok((
            entry,
            raw.sid_left.get(),
            raw.sid_right.get(),
            raw.sid_child.get(),
        ))
    }

    /// Read a single sector from the file
    fn read_sector(&mut self, sector_id: u32) -> Result<Vec<u8>, CfbError> {
        // Sector position in file: (sector_id + 1) * sector_size
        let position = (u64::from(sector_id) + 1) * self.sector_size as u64;
        self.reader.seek(SeekFrom::Start(position))?;

        let mut buffer = vec![0u8; self.sector_size];
        self.reader.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Read every sector of a FAT chain, in chain order.
    fn read_chain(&mut self, start_sector: u32) -> Result<Vec<u8>, CfbError> {
        let chain = follow_chain(&self.fat, start_sector)?;
        let mut data = Vec::with_capacity(chain.len() * self.sector_size);
        for sector in chain {
            data.extend_from_slice(&self.read_sector(sector)?);
        }
        Ok(data)
    }

    /// Read a stream stored in the mini stream.
    fn read_mini_chain(&mut self, start_sector: u32) -> Result<Vec<u8>, CfbError> {
        let ministream = match &self.ministream {
            Some(data) => data.clone(),
            None => {
                let root = self
                    .root
                    .clone()
                    .ok_or_else(|| CfbError::Corrupted("No root entry".to_string()))?;
                let mut data = self.read_chain(root.start_sector)?;
                data.truncate(usize::try_from(root.size).unwrap_or(usize::MAX));
                let data = Bytes::from(data);
                self.ministream = Some(data.clone());
                data
            },
        };

        let chain = follow_chain(&self.minifat, start_sector)?;
        let mut data = Vec::with_capacity(chain.len() * self.mini_sector_size);
        for sector in chain {
            let position = sector as usize * self.mini_sector_size;
            let mini_sector = ministream
                .get(position..position + self.mini_sector_size)
                .ok_or_else(|| {
                    CfbError::Corrupted(format!("Mini sector {sector} out of bounds"))
                })?;
            data.extend_from_slice(mini_sector);
        }
        Ok(data)
    }

    /// Open a root-level stream by name and return its contents.
    ///
    /// Name matching is case-insensitive, as in the compound file format.
    pub fn open_stream(&mut self, name: &str) -> Result<Bytes, CfbError> {
        let entry = self
            .find_entry(name)
            .cloned()
            .ok_or_else(|| CfbError::StreamNotFound(name.to_string()))?;

        if !entry.is_stream() {
            return Err(CfbError::InvalidFormat(format!("{name} is not a stream")));
        }

        let size = usize::try_from(entry.size)
            .map_err(|_| CfbError::Corrupted(format!("Stream {name} is too large")))?;
        if size == 0 {
            return Ok(Bytes::new());
        }

        let mut data = if entry.size < u64::from(self.mini_stream_cutoff) {
            self.read_mini_chain(entry.start_sector)?
        } else {
            self.read_chain(entry.start_sector)?
        };

        if data.len() < size {
            return Err(CfbError::Corrupted(format!(
                "Stream {name} holds {} bytes, directory declares {size}",
                data.len()
            )));
        }
        data.truncate(size);
        debug!("opened stream {name} ({size} bytes)");
        Ok(Bytes::from(data))
    }

    /// Find a root-level entry by name.
    pub fn find_entry(&self, name: &str) -> Option<&DirEntry> {
        let wanted = name.to_lowercase();
        self.entries.iter().find(|e| e.name.to_lowercase() == wanted)
    }

    /// Check if a root-level stream exists
    pub fn exists(&self, name: &str) -> bool {
        self.find_entry(name).is_some_and(DirEntry::is_stream)
    }

    /// Names of the root-level streams, in directory order.
    pub fn stream_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.is_stream())
            .map(|e| e.name.as_str())
    }

    /// All root-level entries, streams and storages.
    #[inline]
    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }
}

/// Follow an allocation chain from `start` to `ENDOFCHAIN`.
///
/// A chain can never be longer than its table; anything longer loops.
fn follow_chain(table: &[u32], start: u32) -> Result<Vec<u32>, CfbError> {
    let mut chain = Vec::new();
    let mut sector = start;
    while sector != ENDOFCHAIN {
        let next = table.get(sector as usize).copied().ok_or_else(|| {
            CfbError::Corrupted(format!("Sector 0x{sector:08X} is outside the allocation table"))
        })?;
        if chain.len() >= table.len() {
            return Err(CfbError::Corrupted(format!(
                "Sector chain starting at {start} loops"
            )));
        }
        chain.push(sector);
        sector = next;
    }
    Ok(chain)
}

fn sector_u32s(data: &[u8]) -> impl Iterator<Item = u32> + '_ {
    data.chunks_exact(4)
        .filter_map(|chunk| U32::<LE>::read_from_bytes(chunk).ok())
        .map(|v| v.get())
}

/// Check if data starts with the compound file signature.
pub fn is_compound_file(data: &[u8]) -> bool {
    data.len() >= MINIMAL_OLEFILE_SIZE && &data[0..8] == MAGIC
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(major: u16, shift: u16, byte_order: u16) -> Vec<u8> {
        let mut data = vec![0u8; MINIMAL_OLEFILE_SIZE];
        data[0..8].copy_from_slice(MAGIC);
        data[0x1A..0x1C].copy_from_slice(&major.to_le_bytes());
        data[0x1C..0x1E].copy_from_slice(&byte_order.to_le_bytes());
        data[0x1E..0x20].copy_from_slice(&shift.to_le_bytes());
        data[0x20..0x22].copy_from_slice(&6u16.to_le_bytes());
        data
    }

    #[test]
    fn test_rejects_short_input() {
        let err = CompoundFile::open(Cursor::new(vec![0u8; 100])).unwrap_err();
        assert!(matches!(err, CfbError::NotCompoundFile));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut data = header(3, 9, BYTE_ORDER_LE);
        data[0] = 0;
        let err = CompoundFile::open(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, CfbError::NotCompoundFile));
    }

    #[test]
    fn test_rejects_byte_order_and_sector_mismatch() {
        let err = CompoundFile::open(Cursor::new(header(3, 9, 0xFEFF))).unwrap_err();
        assert!(matches!(err, CfbError::InvalidFormat(_)));

        let err = CompoundFile::open(Cursor::new(header(3, 12, BYTE_ORDER_LE))).unwrap_err();
        assert!(matches!(err, CfbError::InvalidFormat(_)));
    }

    #[test]
    fn test_self_referencing_difat_sector() {
        let mut data = header(3, 9, BYTE_ORDER_LE);
        data[0x4C..HEADER_SIZE].fill(0xFF);
        data[0x44..0x48].copy_from_slice(&1u32.to_le_bytes());
        data[0x48..0x4C].copy_from_slice(&u32::MAX.to_le_bytes());
        // Sector 1: 127 FAT locations of 0, then a next pointer back to itself
        let next = 2 * SECTOR_SIZE_V3 - 4;
        data[next..next + 4].copy_from_slice(&1u32.to_le_bytes());

        let err = CompoundFile::open(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, CfbError::Corrupted(_)));
    }

    #[test]
    fn test_follow_chain() {
        let fat = [1, 2, ENDOFCHAIN, FREESECT];
        assert_eq!(follow_chain(&fat, 0).unwrap(), vec![0, 1, 2]);
        assert!(follow_chain(&fat, ENDOFCHAIN).unwrap().is_empty());
        assert!(matches!(follow_chain(&fat, 7), Err(CfbError::Corrupted(_))));
    }

    #[test]
    fn test_follow_chain_detects_loop() {
        let fat = [1, 0];
        assert!(matches!(follow_chain(&fat, 0), Err(CfbError::Corrupted(_))));
    }

    #[test]
    fn test_is_compound_file() {
        assert!(is_compound_file(&header(3, 9, BYTE_ORDER_LE)));
        assert!(!is_compound_file(MAGIC));
    }
}
