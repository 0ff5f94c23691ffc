//! CRC-32 checksums
//!
//! Reference tables record the CRC-32 of every stored container. For
//! versioned containers the trailing 2-byte version is excluded from the
//! checksum, so that bumping the version alone does not invalidate it.

/// Size of the version trailer excluded by [`crc32_excluding_trailer`]
pub const VERSION_TRAILER_SIZE: usize = 2;

/// Compute the CRC-32 (IEEE) of `data`
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Compute the CRC-32 of `data` without its trailing 2-byte version.
///
/// Buffers shorter than the trailer hash as empty.
pub fn crc32_excluding_trailer(data: &[u8]) -> u32 {
    crc32(strip_trailer(data))
}

/// Returns `data` without its trailing 2-byte version
pub fn strip_trailer(data: &[u8]) -> &[u8] {
    &data[..data.len().saturating_sub(VERSION_TRAILER_SIZE)]
}
