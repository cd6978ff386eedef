/// Reassembly of little-endian UTF-16 code units from a byte stream.
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    AwaitingLow,
    AwaitingHigh(u8),
}

/// Pairs bytes into UTF-16LE code units.
///
/// Bytes may arrive in any chunking. A trailing unpaired byte is kept until
/// [`finish`](Self::finish), which emits it with a zero high byte.
///
/// # Examples
///
/// ```
/// use doctext::doc::parts::utf16::Utf16Accumulator;
///
/// let mut acc = Utf16Accumulator::new();
/// acc.extend([0x48, 0x00, 0x69]);
/// assert!(acc.is_pending());
/// assert_eq!(acc.finish(), vec![0x0048, 0x0069]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Utf16Accumulator {
    state: State,
    units: Vec<u16>,
}

impl Utf16Accumulator {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulator sized for `bytes` input bytes.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            state: State::AwaitingLow,
            units: Vec::with_capacity(bytes.div_ceil(2)),
        }
    }

    /// Feed one byte.
    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.state = match self.state {
            State::AwaitingLow => State::AwaitingHigh(byte),
            State::AwaitingHigh(low) => {
                self.units.push(u16::from_le_bytes([low, byte]));
                State::AwaitingLow
            },
        };
    }

    /// Whether a low byte is waiting for its pair.
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self.state, State::AwaitingHigh(_))
    }

    /// Code units completed so far.
    #[inline]
    pub fn units(&self) -> &[u16] {
        &self.units
    }

    /// Consume the accumulator, flushing a pending low byte.
    pub fn finish(mut self) -> Vec<u16> {
        if let State::AwaitingHigh(low) = self.state {
            self.units.push(u16::from(low));
        }
        self.units
    }
}

impl Extend<u8> for Utf16Accumulator {
    fn extend<I: IntoIterator<Item = u8>>(&mut self, iter: I) {
        for byte in iter {
            self.push(byte);
        }
    }
}

impl<'a> Extend<&'a u8> for Utf16Accumulator {
    fn extend<I: IntoIterator<Item = &'a u8>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl io::Write for Utf16Accumulator {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.extend(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    #[test]
    fn test_even_input_pairs_little_endian() {
        let mut acc = Utf16Accumulator::new();
        acc.extend([0x01, 0x02, 0x03, 0x04]);
        assert!(!acc.is_pending());
        assert_eq!(acc.finish(), vec![0x0201, 0x0403]);
    }

    #[test]
    fn test_odd_input_flushes_with_zero_high_byte() {
        let mut acc = Utf16Accumulator::new();
        acc.extend(&[0x41, 0x00, 0xE9]);
        assert_eq!(acc.units(), &[0x0041]);
        assert_eq!(acc.finish(), vec![0x0041, 0x00E9]);
    }

    #[test]
    fn test_empty() {
        assert!(Utf16Accumulator::new().finish().is_empty());
    }

    #[test]
    fn test_pair_spans_writes() {
        let mut acc = Utf16Accumulator::with_capacity(4);
        acc.write_all(&[0x3D]).unwrap();
        acc.write_all(&[0xD8, 0x00]).unwrap();
        acc.write_all(&[0xDE]).unwrap();
        assert_eq!(acc.finish(), vec![0xD83D, 0xDE00]);
    }

    proptest! {
        #[test]
        fn prop_matches_chunked_le_decode(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            let mut acc = Utf16Accumulator::new();
            acc.extend(&bytes);
            let units = acc.finish();

            let mut expected: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            if bytes.len() % 2 == 1 {
                expected.push(u16::from(bytes[bytes.len() - 1]));
            }
            prop_assert_eq!(units.len(), bytes.len().div_ceil(2));
            prop_assert_eq!(units, expected);
        }

        #[test]
        fn prop_split_point_does_not_matter(
            bytes in prop::collection::vec(any::<u8>(), 0..64),
            split in any::<prop::sample::Index>(),
        ) {
            let at = split.index(bytes.len() + 1);
            let mut whole = Utf16Accumulator::new();
            whole.extend(&bytes);
            let mut parts = Utf16Accumulator::new();
            parts.extend(&bytes[..at]);
            parts.extend(&bytes[at..]);
            prop_assert_eq!(whole.finish(), parts.finish());
        }
    }
}
