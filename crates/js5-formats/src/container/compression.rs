//! Container compression and decompression

use super::error::{ContainerError, ContainerResult};
use bzip2::read::{BzDecoder, BzEncoder};
use flate2::Compression;
use flate2::read::{GzDecoder, GzEncoder};
use std::io::Read;

/// Maximum allowed decompression size (256 MB)
///
/// The header declares the uncompressed size up front; anything beyond this
/// is rejected before a single byte is inflated.
pub const MAX_DECOMPRESSION_SIZE: usize = 256 * 1024 * 1024;

/// Stream header the bzip2 encoder emits at block size 1. Stored payloads
/// omit it.
pub const BZIP2_HEADER: &[u8; 4] = b"BZh1";

/// Container compression types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CompressionType {
    /// Stored as-is
    #[default]
    None = 0,
    /// Headerless bzip2 stream
    Bzip2 = 1,
    /// Standard gzip stream
    Gzip = 2,
}

impl CompressionType {
    /// Parse compression type from byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::None),
            1 => Some(Self::Bzip2),
            2 => Some(Self::Gzip),
            _ => None,
        }
    }

    /// Get the byte representation
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for CompressionType {
    type Error = ContainerError;

    fn try_from(byte: u8) -> ContainerResult<Self> {
        Self::from_byte(byte).ok_or(ContainerError::UnknownCompression(byte))
    }
}

/// Compress data using the specified type
pub fn compress(data: &[u8], compression: CompressionType) -> ContainerResult<Vec<u8>> {
    match compression {
        CompressionType::None => Ok(data.to_vec()),
        CompressionType::Gzip => {
            let mut encoder = GzEncoder::new(data, Compression::default());
            let mut compressed = Vec::new();
            encoder.read_to_end(&mut compressed).map_err(|e| {
                ContainerError::CompressionError(format!("gzip compression failed: {e}"))
            })?;
            Ok(compressed)
        }
        CompressionType::Bzip2 => {
            let mut encoder = BzEncoder::new(data, bzip2::Compression::new(1));
            let mut compressed = Vec::new();
            encoder.read_to_end(&mut compressed).map_err(|e| {
                ContainerError::CompressionError(format!("bzip2 compression failed: {e}"))
            })?;
            match compressed.strip_prefix(BZIP2_HEADER.as_slice()) {
                Some(stripped) => Ok(stripped.to_vec()),
                None => Err(ContainerError::CompressionError(
                    "bzip2 encoder did not emit a BZh1 header".to_string(),
                )),
            }
        }
    }
}

/// Decompress data, requiring exactly `expected_len` bytes of output
pub fn decompress(
    data: &[u8],
    compression: CompressionType,
    expected_len: usize,
) -> ContainerResult<Vec<u8>> {
    if expected_len > MAX_DECOMPRESSION_SIZE {
        return Err(ContainerError::SizeLimitExceeded {
            size: expected_len,
            limit: MAX_DECOMPRESSION_SIZE,
        });
    }

    let decompressed = match compression {
        CompressionType::None => data.to_vec(),
        CompressionType::Gzip => {
            read_limited(GzDecoder::new(data), data.len(), expected_len, "gzip")?
        }
        CompressionType::Bzip2 => {
            let stream = BZIP2_HEADER.as_slice().chain(data);
            read_limited(BzDecoder::new(stream), data.len(), expected_len, "bzip2")?
        }
    };

    if decompressed.len() != expected_len {
        return Err(ContainerError::LengthMismatch {
            expected: expected_len,
            actual: decompressed.len(),
        });
    }

    Ok(decompressed)
}

/// Read a decoder to the end, stopping one byte past `expected_len` so an
/// oversized stream is reported as a mismatch without inflating all of it
fn read_limited<R: Read>(
    decoder: R,
    compressed_len: usize,
    expected_len: usize,
    name: &str,
) -> ContainerResult<Vec<u8>> {
    let mut decompressed = Vec::with_capacity(initial_capacity(compressed_len, expected_len));
    decoder
        .take(expected_len as u64 + 1)
        .read_to_end(&mut decompressed)
        .map_err(|e| ContainerError::DecompressionFailed(format!("{name}: {e}")))?;
    Ok(decompressed)
}

/// Output buffer to reserve up front. The declared length comes from the
/// container header, so it is bounded by a multiple of the input size.
fn initial_capacity(compressed_len: usize, expected_len: usize) -> usize {
    expected_len.min(compressed_len.saturating_mul(4))
}
