//! Character decoding for the two encodings a piece can carry.
//!
//! Compressed pieces hold one byte per character, uncompressed pieces hold
//! UTF-16 code units. Both are turned into Rust strings here.

use encoding_rs::WINDOWS_1252;

/// How bytes of a compressed (single-byte) piece map to characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CompressedEncoding {
    /// Each byte becomes the code point with the same value (ISO-8859-1).
    #[default]
    Latin1,
    /// Bytes are decoded as Windows-1252, mapping 0x80-0x9F to the
    /// typographic characters Word stores there.
    Windows1252,
}

/// Decode the bytes of a compressed piece.
///
/// # Examples
///
/// ```
/// use doctext::common::encoding::{decode_compressed, CompressedEncoding};
///
/// assert_eq!(decode_compressed(b"Hi\r", CompressedEncoding::Latin1), "Hi\r");
/// assert_eq!(decode_compressed(&[0x93], CompressedEncoding::Latin1), "\u{93}");
/// assert_eq!(decode_compressed(&[0x93], CompressedEncoding::Windows1252), "\u{201C}");
/// ```
pub fn decode_compressed(bytes: &[u8], encoding: CompressedEncoding) -> String {
    match encoding {
        CompressedEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        CompressedEncoding::Windows1252 => {
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            text.into_owned()
        },
    }
}

/// Decode UTF-16 code units, replacing unpaired surrogates with U+FFFD.
///
/// # Examples
///
/// ```
/// use doctext::common::encoding::decode_utf16_units;
///
/// assert_eq!(decode_utf16_units(&[0x0048, 0x0069]), "Hi");
/// assert_eq!(decode_utf16_units(&[0xD83D, 0xDE00]), "\u{1F600}");
/// assert_eq!(decode_utf16_units(&[0xD800]), "\u{FFFD}");
/// ```
pub fn decode_utf16_units(units: &[u16]) -> String {
    char::decode_utf16(units.iter().copied())
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Decode a UTF-16LE byte string, dropping trailing NULs.
///
/// Used for compound-file directory entry names.
pub fn decode_utf16le_name(bytes: &[u8]) -> String {
    let (text, _) = encoding_rs::UTF_16LE.decode_without_bom_handling(bytes);
    text.trim_end_matches('\0').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_is_pass_through() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let text = decode_compressed(&bytes, CompressedEncoding::Latin1);
        assert_eq!(text.chars().count(), 256);
        for (b, c) in bytes.iter().zip(text.chars()) {
            assert_eq!(u32::from(*b), u32::from(c));
        }
    }

    #[test]
    fn test_windows_1252_specials() {
        let text = decode_compressed(&[0x80, 0x41, 0x96], CompressedEncoding::Windows1252);
        assert_eq!(text, "\u{20AC}A\u{2013}");
    }

    #[test]
    fn test_name_decoding() {
        let name: Vec<u8> = "1Table\0"
            .encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .collect();
        assert_eq!(decode_utf16le_name(&name), "1Table");
    }
}
