//! Low-level field codecs shared by the cache formats
//!
//! The cache packs several values in ways no standard integer type covers:
//! 24-bit big-endian integers ("tri-bytes") for sector numbers and sizes,
//! NUL-terminated strings in a legacy single-byte charset, and variable
//! width "smart" integers.
//!
//! Two flavours are provided. The `parse_*`/`write_*` functions plug into
//! binrw's `parse_with`/`write_with` attributes for fixed-layout records. The
//! `get_*`/`put_*` functions read from an immutable slice at an explicit
//! offset and return the offset just past the value, so decoders never need
//! a shared mutable position.

use binrw::{BinResult, Endian};
use std::io::{Read, Seek, Write};
use thiserror::Error;

/// Largest value representable in a tri-byte
pub const TRI_BYTE_MAX: u32 = 0x00FF_FFFF;

/// Code points for bytes 128..=159 in the legacy charset. Zero marks bytes
/// with no mapping; they are dropped on decode.
const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\0', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\0', '\u{017D}', '\0', '\0',
    '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\0', '\u{017E}', '\u{0178}',
];

/// Errors from slice-based field decoding
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    /// Not enough bytes remain for the value
    #[error("unexpected end of buffer at offset {offset}: needed {needed} bytes, {available} available")]
    UnexpectedEof {
        /// Offset the read started at
        offset: usize,
        /// Bytes the value needs
        needed: usize,
        /// Bytes remaining from `offset`
        available: usize,
    },

    /// A string ran to the end of the buffer without a NUL terminator
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    /// A value does not fit the field it is written to
    #[error("value {value} does not fit in {bits} bits")]
    ValueOutOfRange {
        /// The rejected value
        value: u64,
        /// Width of the field
        bits: u32,
    },
}

/// Result type for buffer operations
pub type BufferResult<T> = Result<T, BufferError>;

/// Decode a big-endian tri-byte
pub const fn tri_byte_from_bytes(bytes: [u8; 3]) -> u32 {
    ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | bytes[2] as u32
}

/// Encode the low 24 bits of `value` as a big-endian tri-byte
pub const fn tri_byte_to_bytes(value: u32) -> [u8; 3] {
    [(value >> 16) as u8, (value >> 8) as u8, value as u8]
}

/// Custom binrw parser for 24-bit big-endian fields
pub fn parse_tri_byte<R: Read + Seek>(reader: &mut R, _endian: Endian, _args: ()) -> BinResult<u32> {
    let mut bytes = [0u8; 3];
    reader.read_exact(&mut bytes)?;
    Ok(tri_byte_from_bytes(bytes))
}

/// Custom binrw writer for 24-bit big-endian fields
pub fn write_tri_byte<W: Write + Seek>(
    value: &u32,
    writer: &mut W,
    _endian: Endian,
    _args: (),
) -> BinResult<()> {
    if *value > TRI_BYTE_MAX {
        return Err(binrw::Error::AssertFail {
            pos: writer.stream_position().unwrap_or(0),
            message: format!("value {value} does not fit in 24 bits"),
        });
    }
    writer.write_all(&tri_byte_to_bytes(*value))?;
    Ok(())
}

fn take(data: &[u8], offset: usize, needed: usize) -> BufferResult<&[u8]> {
    let available = data.len().saturating_sub(offset);
    if offset > data.len() || available < needed {
        return Err(BufferError::UnexpectedEof {
            offset,
            needed,
            available,
        });
    }
    Ok(&data[offset..offset + needed])
}

/// Read a `u8` at `offset`
pub fn get_u8(data: &[u8], offset: usize) -> BufferResult<(u8, usize)> {
    let bytes = take(data, offset, 1)?;
    Ok((bytes[0], offset + 1))
}

/// Read a big-endian `u16` at `offset`
pub fn get_u16(data: &[u8], offset: usize) -> BufferResult<(u16, usize)> {
    let bytes = take(data, offset, 2)?;
    Ok((u16::from_be_bytes([bytes[0], bytes[1]]), offset + 2))
}

/// Read a big-endian tri-byte at `offset`
pub fn get_tri_byte(data: &[u8], offset: usize) -> BufferResult<(u32, usize)> {
    let bytes = take(data, offset, 3)?;
    Ok((tri_byte_from_bytes([bytes[0], bytes[1], bytes[2]]), offset + 3))
}

/// Read a big-endian `u32` at `offset`
pub fn get_u32(data: &[u8], offset: usize) -> BufferResult<(u32, usize)> {
    let bytes = take(data, offset, 4)?;
    Ok((
        u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        offset + 4,
    ))
}

/// Borrow `len` bytes at `offset`
pub fn get_bytes(data: &[u8], offset: usize, len: usize) -> BufferResult<(&[u8], usize)> {
    let bytes = take(data, offset, len)?;
    Ok((bytes, offset + len))
}

/// Append a tri-byte, rejecting values wider than 24 bits
pub fn put_tri_byte(out: &mut Vec<u8>, value: u32) -> BufferResult<()> {
    if value > TRI_BYTE_MAX {
        return Err(BufferError::ValueOutOfRange {
            value: u64::from(value),
            bits: 24,
        });
    }
    out.extend_from_slice(&tri_byte_to_bytes(value));
    Ok(())
}

/// Read a "smart" integer: one byte below 128, otherwise a `u16` minus 32768
pub fn get_smart(data: &[u8], offset: usize) -> BufferResult<(u16, usize)> {
    let (peek, _) = get_u8(data, offset)?;
    if peek < 128 {
        Ok((u16::from(peek), offset + 1))
    } else {
        let (value, next) = get_u16(data, offset)?;
        Ok((value - 0x8000, next))
    }
}

/// Append a "smart" integer (values up to `0x7FFF`)
pub fn put_smart(out: &mut Vec<u8>, value: u16) -> BufferResult<()> {
    match value {
        0..=0x7F => out.push(value as u8),
        0x80..=0x7FFF => out.extend_from_slice(&(value | 0x8000).to_be_bytes()),
        _ => {
            return Err(BufferError::ValueOutOfRange {
                value: u64::from(value),
                bits: 15,
            });
        }
    }
    Ok(())
}

fn terminated(data: &[u8], offset: usize) -> BufferResult<(&[u8], usize)> {
    let rest = data.get(offset..).unwrap_or_default();
    let end = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or(BufferError::UnterminatedString(offset))?;
    Ok((&rest[..end], offset + end + 1))
}

/// Read a NUL-terminated string, one char per byte (Latin-1)
pub fn get_cstring(data: &[u8], offset: usize) -> BufferResult<(String, usize)> {
    let (bytes, next) = terminated(data, offset)?;
    Ok((bytes.iter().map(|&b| char::from(b)).collect(), next))
}

/// Read a NUL-terminated string in the legacy charset
pub fn get_legacy_string(data: &[u8], offset: usize) -> BufferResult<(String, usize)> {
    let (bytes, next) = terminated(data, offset)?;
    Ok((bytes.iter().filter_map(|&b| decode_legacy_char(b)).collect(), next))
}

/// Append `value` in the legacy charset followed by a NUL terminator.
///
/// Characters with no single-byte form (and NUL itself) are written as `?`.
pub fn put_legacy_string(out: &mut Vec<u8>, value: &str) {
    out.extend(value.chars().map(encode_legacy_char));
    out.push(0);
}

/// Map one legacy charset byte to its character
pub fn decode_legacy_char(byte: u8) -> Option<char> {
    match byte {
        128..=159 => {
            let c = CP1252_HIGH[usize::from(byte - 128)];
            (c != '\0').then_some(c)
        }
        _ => Some(char::from(byte)),
    }
}

/// Map a character to its legacy charset byte
pub fn encode_legacy_char(c: char) -> u8 {
    if let Some(index) = CP1252_HIGH.iter().position(|&m| m == c && m != '\0') {
        return 128 + index as u8;
    }
    match u32::from(c) {
        1..=127 | 160..=255 => c as u8,
        _ => b'?',
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use binrw::io::Cursor;
    use proptest::prelude::*;

    #[test]
    fn test_tri_byte_slice() {
        let data = [0xAA, 0x01, 0x02, 0x03];
        let (value, next) = get_tri_byte(&data, 1).unwrap();
        assert_eq!(value, 0x010203);
        assert_eq!(next, 4);
        assert!(get_tri_byte(&data, 2).is_err());
    }

    #[test]
    fn test_tri_byte_binrw_helpers() {
        let mut cursor = Cursor::new(Vec::new());
        write_tri_byte(&0x00AB_CDEF, &mut cursor, Endian::Big, ()).unwrap();
        assert_eq!(cursor.get_ref(), &[0xAB, 0xCD, 0xEF]);

        cursor.set_position(0);
        let value = parse_tri_byte(&mut cursor, Endian::Big, ()).unwrap();
        assert_eq!(value, 0x00AB_CDEF);

        let mut cursor = Cursor::new(Vec::new());
        assert!(write_tri_byte(&0x0100_0000, &mut cursor, Endian::Big, ()).is_err());
    }

    #[test]
    fn test_put_tri_byte_rejects_overflow() {
        let mut out = Vec::new();
        put_tri_byte(&mut out, TRI_BYTE_MAX).unwrap();
        assert_eq!(out, [0xFF, 0xFF, 0xFF]);
        assert_eq!(
            put_tri_byte(&mut out, TRI_BYTE_MAX + 1),
            Err(BufferError::ValueOutOfRange {
                value: 0x0100_0000,
                bits: 24
            })
        );
    }

    #[test]
    fn test_eof_reports_offsets() {
        let err = get_u32(&[1, 2], 0).unwrap_err();
        assert_eq!(
            err,
            BufferError::UnexpectedEof {
                offset: 0,
                needed: 4,
                available: 2
            }
        );
        // Offsets past the end must not panic
        assert!(get_u8(&[1], 5).is_err());
    }

    #[test]
    fn test_smart() {
        assert_eq!(get_smart(&[0x05], 0).unwrap(), (5, 1));
        assert_eq!(get_smart(&[0x80, 0x80], 0).unwrap(), (0x80, 2));
        assert_eq!(get_smart(&[0xFF, 0xFF], 0).unwrap(), (0x7FFF, 2));

        let mut out = Vec::new();
        put_smart(&mut out, 0x7F).unwrap();
        put_smart(&mut out, 0x1234).unwrap();
        assert_eq!(out, [0x7F, 0x92, 0x34]);
        assert!(put_smart(&mut out, 0x8000).is_err());
    }

    #[test]
    fn test_cstring() {
        let data = b"abc\0def\0";
        let (first, next) = get_cstring(data, 0).unwrap();
        let (second, end) = get_cstring(data, next).unwrap();
        assert_eq!(first, "abc");
        assert_eq!(second, "def");
        assert_eq!(end, data.len());
        assert_eq!(
            get_cstring(b"abc", 0),
            Err(BufferError::UnterminatedString(0))
        );
    }

    #[test]
    fn test_legacy_charset_decode() {
        // 0x80 is the euro sign, 0x81 has no mapping and is dropped
        let data = [b'a', 0x80, 0x81, 0x9F, 0xE9, 0];
        let (value, _) = get_legacy_string(&data, 0).unwrap();
        assert_eq!(value, "a\u{20AC}\u{0178}\u{E9}");
    }

    #[test]
    fn test_legacy_char_127_passes_through() {
        assert_eq!(decode_legacy_char(127), Some('\u{7F}'));
    }

    #[test]
    fn test_legacy_charset_encode() {
        let mut out = Vec::new();
        put_legacy_string(&mut out, "\u{20AC}5 \u{E9}\u{4E2D}");
        assert_eq!(out, [0x80, b'5', b' ', 0xE9, b'?', 0]);
    }

    proptest! {
        #[test]
        fn legacy_string_round_trips(s in "[ -~\u{A0}-\u{FF}\u{20AC}\u{2122}\u{0152}]{0,32}") {
            let mut out = Vec::new();
            put_legacy_string(&mut out, &s);
            let (decoded, next) = get_legacy_string(&out, 0).unwrap();
            prop_assert_eq!(decoded, s);
            prop_assert_eq!(next, out.len());
        }
    }
}
