//! Binary data parsing utilities.
//!
//! Every multi-byte field in the Word binary format is read through one of
//! these accessors. Each one checks that the whole field lies inside the
//! slice before touching it, so callers never index raw offsets themselves.

use thiserror::Error;
use zerocopy::{BE, FromBytes, I16, LE, U16, U32};

/// A field did not fit inside the buffer it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("insufficient data: {needed} bytes at offset {offset}, buffer holds {available}")]
pub struct BinaryError {
    /// Offset of the field that was requested
    pub offset: usize,
    /// Width of the field in bytes
    pub needed: usize,
    /// Length of the buffer that was indexed
    pub available: usize,
}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

/// Borrow `width` bytes at `offset`, or report where the read fell short.
///
/// # Examples
///
/// ```
/// use doctext::common::binary::field;
/// let data = [1, 2, 3, 4];
/// assert_eq!(field(&data, 1, 2).unwrap(), &[2, 3]);
/// assert!(field(&data, 3, 2).is_err());
/// ```
#[inline]
pub fn field(data: &[u8], offset: usize, width: usize) -> BinaryResult<&[u8]> {
    offset
        .checked_add(width)
        .filter(|&end| end <= data.len())
        .map(|end| &data[offset..end])
        .ok_or(BinaryError {
            offset,
            needed: width,
            available: data.len(),
        })
}

/// Read a single byte at the given offset.
#[inline]
pub fn read_u8(data: &[u8], offset: usize) -> BinaryResult<u8> {
    field(data, offset, 1).map(|b| b[0])
}

/// Read a little-endian u16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use doctext::common::binary::read_u16_le;
/// let data = [0x34, 0x12, 0x78, 0x56];
/// assert_eq!(read_u16_le(&data, 0).unwrap(), 0x1234);
/// assert_eq!(read_u16_le(&data, 2).unwrap(), 0x5678);
/// ```
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> BinaryResult<u16> {
    let bytes = field(data, offset, 2)?;
    U16::<LE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .map_err(|_| short(data, offset, 2))
}

/// Read a little-endian i16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use doctext::common::binary::read_i16_le;
/// let data = [0xFF, 0xFF];
/// assert_eq!(read_i16_le(&data, 0).unwrap(), -1i16);
/// ```
#[inline]
pub fn read_i16_le(data: &[u8], offset: usize) -> BinaryResult<i16> {
    let bytes = field(data, offset, 2)?;
    I16::<LE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .map_err(|_| short(data, offset, 2))
}

/// Read a little-endian u32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use doctext::common::binary::read_u32_le;
/// let data = [0x78, 0x56, 0x34, 0x12];
/// assert_eq!(read_u32_le(&data, 0).unwrap(), 0x12345678);
/// ```
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    let bytes = field(data, offset, 4)?;
    U32::<LE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .map_err(|_| short(data, offset, 4))
}

/// Read a big-endian u32 from a byte slice at the given offset.
///
/// Piece descriptors are unpacked bit-wise from this view of their
/// file-offset field.
///
/// # Examples
///
/// ```
/// use doctext::common::binary::read_u32_be;
/// let data = [0x12, 0x34, 0x56, 0x78];
/// assert_eq!(read_u32_be(&data, 0).unwrap(), 0x12345678);
/// ```
#[inline]
pub fn read_u32_be(data: &[u8], offset: usize) -> BinaryResult<u32> {
    let bytes = field(data, offset, 4)?;
    U32::<BE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .map_err(|_| short(data, offset, 4))
}

#[inline]
fn short(data: &[u8], offset: usize, needed: usize) -> BinaryError {
    BinaryError {
        offset,
        needed,
        available: data.len(),
    }
}
