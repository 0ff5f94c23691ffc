//! Index records
//!
//! Index file `n` holds one 6-byte record per file id of type `n`, at
//! offset `id * 6`: the file size and its first sector, both 24-bit.

use crate::{Result, StoreError};
use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};
use js5_formats::buffer::{parse_tri_byte, write_tri_byte};

/// Encoded record size
pub const INDEX_SIZE: usize = 6;

/// Location of one file in the data file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BinRead, BinWrite)]
#[brw(big)]
pub struct FileIndex {
    /// File size in bytes
    #[br(parse_with = parse_tri_byte)]
    #[bw(write_with = write_tri_byte)]
    pub size: u32,

    /// First sector of the chain
    #[br(parse_with = parse_tri_byte)]
    #[bw(write_with = write_tri_byte)]
    pub sector: u32,
}

impl FileIndex {
    /// Create a record
    pub const fn new(size: u32, sector: u32) -> Self {
        Self { size, sector }
    }

    /// Byte offset of file `id`'s record in its index file
    pub const fn offset(id: u16) -> u64 {
        id as u64 * INDEX_SIZE as u64
    }

    /// Decode a record from exactly 6 bytes
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != INDEX_SIZE {
            return Err(StoreError::InvalidFormat(format!(
                "index record must be {INDEX_SIZE} bytes, got {}",
                buf.len()
            )));
        }
        Ok(Self::read(&mut Cursor::new(buf))?)
    }

    /// Encode to 6 bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(INDEX_SIZE));
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let index = FileIndex::new(1500, 0x0001_0203);
        let bytes = index.encode().unwrap();
        assert_eq!(bytes, vec![0x00, 0x05, 0xDC, 0x01, 0x02, 0x03]);
        assert_eq!(FileIndex::decode(&bytes).unwrap(), index);
    }

    #[test]
    fn test_offset() {
        assert_eq!(FileIndex::offset(0), 0);
        assert_eq!(FileIndex::offset(3), 18);
    }

    #[test]
    fn test_rejects_wrong_size() {
        assert!(FileIndex::decode(&[0; 5]).is_err());
        assert!(FileIndex::decode(&[0; 7]).is_err());
    }

    #[test]
    fn test_rejects_oversized_fields() {
        assert!(FileIndex::new(0x0100_0000, 1).encode().is_err());
    }
}
