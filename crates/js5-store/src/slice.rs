//! Data file sectors
//!
//! The data file is an array of 520-byte sectors. Each carries an 8-byte
//! header naming the file it belongs to, its position in that file's chain
//! and the next sector, followed by 512 bytes of payload.

use crate::{Result, StoreError};
use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};
use js5_formats::buffer::{parse_tri_byte, write_tri_byte};

/// Encoded sector size
pub const SLICE_SIZE: usize = 520;

/// Sector header size
pub const HEADER_SIZE: usize = 8;

/// Payload bytes per sector
pub const DATA_SIZE: usize = SLICE_SIZE - HEADER_SIZE;

/// One sector of the data file
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(big)]
pub struct Slice {
    /// File id within its type
    pub id: u16,

    /// Position of this sector in the file's chain, from 0
    pub chunk: u16,

    /// Next sector of the chain, 0 for the last
    #[br(parse_with = parse_tri_byte)]
    #[bw(write_with = write_tri_byte)]
    pub next_sector: u32,

    /// Type of the owning file
    pub type_id: u8,

    /// Payload, zero padded past the end of the file
    pub data: [u8; DATA_SIZE],
}

impl Slice {
    /// Create a sector holding `payload` (at most 512 bytes, zero padded)
    pub fn new(type_id: u8, id: u16, chunk: u16, next_sector: u32, payload: &[u8]) -> Self {
        let mut data = [0u8; DATA_SIZE];
        let len = payload.len().min(DATA_SIZE);
        data[..len].copy_from_slice(&payload[..len]);
        Self {
            id,
            chunk,
            next_sector,
            type_id,
            data,
        }
    }

    /// Whether this sector is link `chunk` of file `(type_id, id)`
    pub const fn belongs_to(&self, type_id: u8, id: u16, chunk: u16) -> bool {
        self.type_id == type_id && self.id == id && self.chunk == chunk
    }

    /// Decode a sector from exactly 520 bytes
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != SLICE_SIZE {
            return Err(StoreError::InvalidFormat(format!(
                "sector must be {SLICE_SIZE} bytes, got {}",
                buf.len()
            )));
        }
        Ok(Self::read(&mut Cursor::new(buf))?)
    }

    /// Encode to 520 bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(SLICE_SIZE));
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let slice = Slice::new(7, 0x0102, 0x0304, 0x0005_0607, b"abc");
        let bytes = slice.encode().unwrap();

        assert_eq!(bytes.len(), SLICE_SIZE);
        assert_eq!(&bytes[..8], &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 7]);
        assert_eq!(&bytes[8..11], b"abc");
        assert!(bytes[11..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_round_trip() {
        let payload: Vec<u8> = (0..DATA_SIZE).map(|i| i as u8).collect();
        let slice = Slice::new(255, u16::MAX, 9, 0x00FF_FFFF, &payload);
        let decoded = Slice::decode(&slice.encode().unwrap()).unwrap();
        assert_eq!(decoded, slice);
        assert!(decoded.belongs_to(255, u16::MAX, 9));
        assert!(!decoded.belongs_to(255, u16::MAX, 10));
    }

    #[test]
    fn test_rejects_wrong_size() {
        assert!(Slice::decode(&[0u8; 519]).unwrap_err().is_format_error());
        assert!(Slice::decode(&[0u8; 521]).is_err());
    }

    #[test]
    fn test_next_sector_must_fit() {
        let slice = Slice::new(0, 0, 0, 0x0100_0000, &[]);
        assert!(slice.encode().is_err());
    }
}
