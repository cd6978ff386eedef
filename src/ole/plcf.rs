//! Property List with Character Positions (PLCF) parser.
//!
//! A PLCF maps ranges of character positions to fixed-size records. The
//! piece table is one: its records are 8-byte piece descriptors.

use crate::common::binary::{self, BinaryError};
use thiserror::Error;

/// Size of one character position entry.
const CP_SIZE: usize = 4;

/// Reasons a PLCF cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlcfError {
    /// The declared arrays run past the end of the buffer
    #[error(transparent)]
    OutOfBounds(#[from] BinaryError),

    /// Too small to hold even the terminating character position
    #[error("PLCF length {lcb} cannot hold a character position")]
    TooShort { lcb: u32 },
}

/// A parsed PLCF.
///
/// # Format
///
/// - n+1 character positions (4 bytes each)
/// - n elements (`element_size` bytes each)
///
/// where `n = (lcb - 4) / (4 + element_size)`. Bytes past the last whole
/// element are reported by [`Plcf::remainder`] and otherwise ignored.
///
/// # Examples
///
/// ```
/// use doctext::ole::plcf::Plcf;
///
/// // CPs 0, 10, 20 and elements [1, 2], [3, 4]
/// let data = [
///     0x00, 0x00, 0x00, 0x00,
///     0x0A, 0x00, 0x00, 0x00,
///     0x14, 0x00, 0x00, 0x00,
///     0x01, 0x02,
///     0x03, 0x04,
/// ];
///
/// let plcf = Plcf::parse(&data, 0, data.len() as u32, 2).unwrap();
/// assert_eq!(plcf.count(), 2);
/// assert_eq!(plcf.positions(), &[0, 10, 20]);
/// assert_eq!(plcf.range(1), Some((10, 20)));
/// assert_eq!(plcf.element(0), Some(&[1u8, 2][..]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plcf<'a> {
    positions: Vec<u32>,
    elements: &'a [u8],
    element_size: usize,
    remainder: usize,
}

impl<'a> Plcf<'a> {
    /// Parse a PLCF of `lcb` bytes starting at `offset` in `data`.
    ///
    /// Only the bytes the arrays actually occupy have to be present; the
    /// whole region is bounds checked before anything is allocated.
    pub fn parse(
        data: &'a [u8],
        offset: usize,
        lcb: u32,
        element_size: usize,
    ) -> Result<Self, PlcfError> {
        let body = usize::try_from(lcb)
            .ok()
            .and_then(|lcb| lcb.checked_sub(CP_SIZE))
            .ok_or(PlcfError::TooShort { lcb })?;
        let stride = CP_SIZE + element_size;
        let n = body / stride;
        let remainder = body % stride;

        // n is bounded by lcb, so these cannot overflow
        let cps_len = (n + 1) * CP_SIZE;
        let elements_len = n * element_size;
        let region = binary::field(data, offset, cps_len + elements_len)?;

        let positions = (0..=n)
            .map(|i| binary::read_u32_le(region, i * CP_SIZE))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            positions,
            elements: &region[cps_len..],
            element_size,
            remainder,
        })
    }

    /// Number of elements.
    #[inline]
    pub fn count(&self) -> usize {
        self.positions.len() - 1
    }

    /// All n+1 character positions.
    #[inline]
    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    /// Bytes of `lcb` left over after the last whole element.
    #[inline]
    pub fn remainder(&self) -> usize {
        self.remainder
    }

    /// Get the element at `index`.
    pub fn element(&self, index: usize) -> Option<&'a [u8]> {
        if index >= self.count() {
            return None;
        }
        let start = index * self.element_size;
        self.elements.get(start..start + self.element_size)
    }

    /// Character range `[start, end)` covered by the element at `index`.
    pub fn range(&self, index: usize) -> Option<(u32, u32)> {
        if index >= self.count() {
            return None;
        }
        Some((self.positions[index], self.positions[index + 1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plc(cps: &[u32], elements: &[&[u8]]) -> Vec<u8> {
        let mut data: Vec<u8> = cps.iter().flat_map(|cp| cp.to_le_bytes()).collect();
        for element in elements {
            data.extend_from_slice(element);
        }
        data
    }

    #[test]
    fn test_plcf_at_offset() {
        let mut data = vec![0xEE; 3];
        data.extend(plc(&[0, 5, 9], &[&[1, 1, 1], &[2, 2, 2]]));
        let lcb = (data.len() - 3) as u32;

        let plcf = Plcf::parse(&data, 3, lcb, 3).unwrap();
        assert_eq!(plcf.count(), 2);
        assert_eq!(plcf.remainder(), 0);
        assert_eq!(plcf.range(0), Some((0, 5)));
        assert_eq!(plcf.element(1), Some(&[2u8, 2, 2][..]));
        assert_eq!(plcf.element(2), None);
        assert_eq!(plcf.range(2), None);
    }

    #[test]
    fn test_plcf_single_position() {
        let data = 7u32.to_le_bytes();
        let plcf = Plcf::parse(&data, 0, 4, 8).unwrap();
        assert_eq!(plcf.count(), 0);
        assert_eq!(plcf.positions(), &[7]);
    }

    #[test]
    fn test_plcf_partial_trailing_element() {
        let mut data = plc(&[0, 4], &[&[9; 8]]);
        data.extend_from_slice(&[0; 5]);
        let plcf = Plcf::parse(&data, 0, data.len() as u32, 8).unwrap();
        assert_eq!(plcf.count(), 1);
        assert_eq!(plcf.remainder(), 5);
    }

    #[test]
    fn test_plcf_too_short() {
        assert_eq!(
            Plcf::parse(&[0; 8], 0, 3, 8).unwrap_err(),
            PlcfError::TooShort { lcb: 3 }
        );
    }

    #[test]
    fn test_plcf_declared_past_buffer() {
        // lcb claims 100 descriptors but only one is present
        let data = plc(&[0, 4], &[&[0; 8]]);
        let err = Plcf::parse(&data, 0, 4 + 100 * 12, 8).unwrap_err();
        assert!(matches!(err, PlcfError::OutOfBounds(e) if e.available == data.len()));
    }

    #[test]
    fn test_plcf_huge_lcb_fails_without_allocating() {
        let err = Plcf::parse(&[0; 16], 0, u32::MAX, 8).unwrap_err();
        assert!(matches!(err, PlcfError::OutOfBounds(_)));
    }
}
