//! Container header

use binrw::{BinRead, BinWrite};

/// Size of the header for uncompressed containers
pub const PLAIN_HEADER_SIZE: usize = 5;

/// Size of the header for compressed containers
pub const COMPRESSED_HEADER_SIZE: usize = 9;

/// Fixed-layout header preceding the container payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(big)]
pub struct ContainerHeader {
    /// Raw compression type byte
    pub compression: u8,

    /// Length of the stored (possibly compressed) payload
    pub length: u32,

    /// Length after decompression, present for compressed payloads only
    #[br(if(compression != 0))]
    #[bw(if(*compression != 0))]
    pub uncompressed_length: Option<u32>,
}

impl ContainerHeader {
    /// Encoded header size
    pub const fn size(&self) -> usize {
        if self.uncompressed_length.is_some() {
            COMPRESSED_HEADER_SIZE
        } else {
            PLAIN_HEADER_SIZE
        }
    }
}
