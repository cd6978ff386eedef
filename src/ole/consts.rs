//! Constants for the compound file container and the Word streams inside it.

/// Magic bytes that should be at the beginning of every compound file
pub const MAGIC: &[u8; 8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// Minimal size of an empty compound file with 512-byte sectors (1536 bytes)
pub const MINIMAL_OLEFILE_SIZE: usize = 1536;

/// Size of the fixed header in bytes
pub const HEADER_SIZE: usize = 512;

/// Number of FAT sector slots stored directly in the header
pub const HEADER_DIFAT_SLOTS: usize = 109;

/// Size of a directory entry in bytes
pub const DIRENTRY_SIZE: usize = 128;

/// Sector size for major version 3 (512 bytes)
pub const SECTOR_SIZE_V3: usize = 512;

/// Sector size for major version 4 (4096 bytes)
pub const SECTOR_SIZE_V4: usize = 4096;

/// Byte order mark stored in the header (little-endian)
pub const BYTE_ORDER_LE: u16 = 0xFFFE;

// Sector IDs
/// Maximum regular sector ID
pub const MAXREGSECT: u32 = 0xFFFFFFFA; // -6
/// Denotes a DIFAT sector in a FAT
pub const DIFSECT: u32 = 0xFFFFFFFC; // -4
/// Denotes a FAT sector in a FAT
pub const FATSECT: u32 = 0xFFFFFFFD; // -3
/// End of a virtual stream chain
pub const ENDOFCHAIN: u32 = 0xFFFFFFFE; // -2
/// Unallocated sector
pub const FREESECT: u32 = 0xFFFFFFFF; // -1

/// Unallocated directory entry
pub const NOSTREAM: u32 = 0xFFFFFFFF; // -1

// Object types in storage
/// Empty directory entry
pub const STGTY_EMPTY: u8 = 0;
/// Element is a storage object
pub const STGTY_STORAGE: u8 = 1;
/// Element is a stream object
pub const STGTY_STREAM: u8 = 2;
/// Element is a root storage
pub const STGTY_ROOT: u8 = 5;

/// Main document stream: FIB followed by the text runs
pub const WORD_DOCUMENT_STREAM: &str = "WordDocument";

/// Table streams, indexed by the FIB's `fWhichTblStm` bit
pub const TABLE_STREAMS: [&str; 2] = ["0Table", "1Table"];
