//! Checksum table
//!
//! Clients fetch this table to decide which reference tables are stale. It
//! lists, per type, the CRC-32, version and Whirlpool digest of the encoded
//! reference table stored in the meta index.
//!
//! Two encodings exist:
//!
//! - plain: `crc u32 | version u32` per type
//! - whirlpool: `count u8`, then `crc u32 | version u32 | digest [64]` per
//!   type, then a trailer of `0x00` and the Whirlpool digest of everything
//!   before it

use crate::{Result, StoreError};
use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};
use js5_crypto::{DIGEST_SIZE, Digest};

/// Encoded size of a plain entry
pub const PLAIN_ENTRY_SIZE: usize = 8;

/// Encoded size of a whirlpool entry
pub const WHIRLPOOL_ENTRY_SIZE: usize = 8 + DIGEST_SIZE;

/// Size of the whirlpool trailer
pub const TRAILER_SIZE: usize = 1 + DIGEST_SIZE;

/// Checksum of one type's reference table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BinRead, BinWrite)]
#[brw(big)]
pub struct ChecksumEntry {
    /// CRC-32 of the encoded reference table
    pub crc: u32,
    /// Reference table version
    pub version: u32,
    /// Whirlpool digest of the encoded reference table
    pub digest: Digest,
}

impl ChecksumEntry {
    /// Create an entry
    pub const fn new(crc: u32, version: u32, digest: Digest) -> Self {
        Self {
            crc,
            version,
            digest,
        }
    }
}

/// Checksums of every type's reference table, indexed by type
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChecksumTable {
    /// One entry per type
    pub entries: Vec<ChecksumEntry>,
}

impl ChecksumTable {
    /// Create a table of `len` zero entries
    pub fn new(len: usize) -> Self {
        Self {
            entries: vec![ChecksumEntry::default(); len],
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for `type_id`
    pub fn entry(&self, type_id: usize) -> Option<&ChecksumEntry> {
        self.entries.get(type_id)
    }

    /// Encode the table, with digests and trailer when `whirlpool` is set
    pub fn encode(&self, whirlpool: bool) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());

        if whirlpool {
            let count = u8::try_from(self.entries.len()).map_err(|_| {
                StoreError::InvalidFormat(format!(
                    "{} entries do not fit the count byte",
                    self.entries.len()
                ))
            })?;
            count.write_be(&mut cursor)?;
            for entry in &self.entries {
                entry.write(&mut cursor)?;
            }

            let mut out = cursor.into_inner();
            let digest = Digest::from_data(&out);
            out.push(0);
            out.extend_from_slice(digest.as_bytes());
            return Ok(out);
        }

        for entry in &self.entries {
            (entry.crc, entry.version).write_be(&mut cursor)?;
        }
        Ok(cursor.into_inner())
    }

    /// Decode a table produced by [`encode`](Self::encode).
    ///
    /// Plain tables carry no digests; their entries decode with a zero
    /// digest. Whirlpool tables must carry a matching trailer.
    pub fn decode(data: &[u8], whirlpool: bool) -> Result<Self> {
        if !whirlpool {
            if data.len() % PLAIN_ENTRY_SIZE != 0 {
                return Err(StoreError::InvalidFormat(format!(
                    "plain checksum table length {} is not a multiple of {PLAIN_ENTRY_SIZE}",
                    data.len()
                )));
            }
            let mut cursor = Cursor::new(data);
            let entries = (0..data.len() / PLAIN_ENTRY_SIZE)
                .map(|_| {
                    let (crc, version) = <(u32, u32)>::read_be(&mut cursor)?;
                    Ok(ChecksumEntry::new(crc, version, Digest::ZERO))
                })
                .collect::<Result<_>>()?;
            return Ok(Self { entries });
        }

        let Some((&count, _)) = data.split_first() else {
            return Err(StoreError::InvalidFormat(
                "empty checksum table".to_string(),
            ));
        };
        let body_len = 1 + usize::from(count) * WHIRLPOOL_ENTRY_SIZE;
        if data.len() != body_len + TRAILER_SIZE {
            return Err(StoreError::InvalidFormat(format!(
                "checksum table of {count} entries must be {} bytes, got {}",
                body_len + TRAILER_SIZE,
                data.len()
            )));
        }

        let (body, trailer) = data.split_at(body_len);
        let expected = Digest::from_data(body);
        if trailer[0] != 0 || trailer[1..] != expected.as_bytes()[..] {
            return Err(StoreError::Corruption(
                "checksum table trailer does not match its contents".to_string(),
            ));
        }

        let mut cursor = Cursor::new(&body[1..]);
        let entries = (0..count)
            .map(|_| Ok(ChecksumEntry::read(&mut cursor)?))
            .collect::<Result<_>>()?;
        Ok(Self { entries })
    }
}
