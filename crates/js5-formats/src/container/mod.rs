//! Byte layout:
//!
//! ```text
//! +------+-----------+---------------------+-------------------+-------------+
//! | type | length    | uncompressed length | payload           | version     |
//! | u8   | u32 BE    | u32 BE, type != 0   | `length` bytes    | u16 BE, opt |
//! +------+-----------+---------------------+-------------------+-------------+
//! ```
//!
//! The version trailer is present whenever at least two bytes follow the
//! payload. Reference tables are stored unversioned; files written through
//! the cache always carry one.
//!
//! Some containers are additionally enciphered with XTEA. The cipher covers
//! everything after the 5-byte `type | length` prefix, trailer included.
//!
//! # Usage
//!
//! ```rust
//! use js5_formats::{CompressionType, Container};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let container = Container::versioned(CompressionType::Gzip, b"hello".to_vec(), 3);
//! let bytes = container.build()?;
//!
//! let parsed = Container::parse(&bytes)?;
//! assert_eq!(parsed.data, b"hello");
//! assert_eq!(parsed.version, Some(3));
//! # Ok(())
//! # }
//! ```

pub mod compression;
pub mod error;
pub mod header;

pub use compression::{CompressionType, MAX_DECOMPRESSION_SIZE, compress, decompress};
pub use error::{ContainerError, ContainerResult};
pub use header::ContainerHeader;

use crate::buffer::{BufferError, get_bytes, get_u16};
use binrw::BinRead;
use binrw::io::Cursor;
use header::{COMPRESSED_HEADER_SIZE, PLAIN_HEADER_SIZE};
use js5_crypto::XteaKey;

/// A decoded container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    /// Compression applied when the container is built
    pub compression: CompressionType,
    /// Uncompressed payload
    pub data: Vec<u8>,
    /// Version trailer, if any
    pub version: Option<u16>,
}

impl Container {
    /// Create an unversioned container
    pub fn new(compression: CompressionType, data: Vec<u8>) -> Self {
        Self {
            compression,
            data,
            version: None,
        }
    }

    /// Create a versioned container
    pub fn versioned(compression: CompressionType, data: Vec<u8>, version: u16) -> Self {
        Self {
            compression,
            data,
            version: Some(version),
        }
    }

    /// Whether a version trailer is present
    pub const fn is_versioned(&self) -> bool {
        self.version.is_some()
    }

    /// Drop the version trailer
    pub fn remove_version(&mut self) {
        self.version = None;
    }

    /// Advance the version by one and return it.
    ///
    /// An unversioned container counts as version -1 and becomes 0. The
    /// version wraps at `u16::MAX`.
    pub fn bump_version(&mut self) -> u16 {
        let next = self.version.map_or(0, |v| v.wrapping_add(1));
        self.version = Some(next);
        next
    }

    /// Consume the container, returning its payload
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Parse a container
    pub fn parse(data: &[u8]) -> ContainerResult<Self> {
        let header = ContainerHeader::read(&mut Cursor::new(data)).map_err(|e| match e {
            binrw::Error::Io(_) => ContainerError::Truncated(BufferError::UnexpectedEof {
                offset: 0,
                needed: if data.first() == Some(&0) {
                    PLAIN_HEADER_SIZE
                } else {
                    COMPRESSED_HEADER_SIZE
                },
                available: data.len(),
            }),
            other => ContainerError::BinRw(other),
        })?;
        let compression = CompressionType::try_from(header.compression)?;

        let (payload, offset) = get_bytes(data, header.size(), header.length as usize)?;
        let data_out = match header.uncompressed_length {
            Some(expected) => decompress(payload, compression, expected as usize)?,
            None => payload.to_vec(),
        };

        let version = get_u16(data, offset).ok().map(|(version, _)| version);

        Ok(Self {
            compression,
            data: data_out,
            version,
        })
    }

    /// Decipher with `key` then parse. The zero key parses as-is.
    pub fn parse_with_key(data: &[u8], key: &XteaKey) -> ContainerResult<Self> {
        if key.is_zero() {
            return Self::parse(data);
        }
        let mut deciphered = data.to_vec();
        let end = deciphered.len();
        if end > PLAIN_HEADER_SIZE {
            key.decipher(&mut deciphered, PLAIN_HEADER_SIZE, end)?;
        }
        Self::parse(&deciphered)
    }

    /// Build the encoded container
    pub fn build(&self) -> ContainerResult<Vec<u8>> {
        let (payload, uncompressed_length) = match self.compression {
            CompressionType::None => (self.data.clone(), None),
            compression => (
                compress(&self.data, compression)?,
                Some(length_field(self.data.len())?),
            ),
        };

        let header = ContainerHeader {
            compression: self.compression.as_byte(),
            length: length_field(payload.len())?,
            uncompressed_length,
        };

        let mut out = Vec::with_capacity(header.size() + payload.len() + 2);
        let mut cursor = Cursor::new(&mut out);
        binrw::BinWrite::write(&header, &mut cursor)?;
        out.extend_from_slice(&payload);
        if let Some(version) = self.version {
            out.extend_from_slice(&version.to_be_bytes());
        }
        Ok(out)
    }

    /// Build then encipher with `key`. The zero key leaves the output as-is.
    pub fn build_with_key(&self, key: &XteaKey) -> ContainerResult<Vec<u8>> {
        let mut out = self.build()?;
        if !key.is_zero() {
            let end = out.len();
            key.encipher(&mut out, PLAIN_HEADER_SIZE, end)?;
        }
        Ok(out)
    }
}

fn length_field(len: usize) -> ContainerResult<u32> {
    u32::try_from(len).map_err(|_| ContainerError::PayloadTooLarge(len))
}

impl crate::Js5Format for Container {
    fn parse(data: &[u8]) -> Result<Self, Box<dyn std::error::Error>> {
        Self::parse(data).map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
    }

    fn build(&self) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        self.build()
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
    }
}
