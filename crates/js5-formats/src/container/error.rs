//! Container error types

use crate::buffer::BufferError;
use js5_crypto::CryptoError;
use thiserror::Error;

/// Container-specific error type
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The buffer ends before the header, payload or trailer does
    #[error("truncated container: {0}")]
    Truncated(#[from] BufferError),

    /// Unknown compression type byte
    #[error("unknown compression type: {0}")]
    UnknownCompression(u8),

    /// Decompressed size differs from the size recorded in the header
    #[error("decompressed length mismatch: header says {expected}, got {actual}")]
    LengthMismatch {
        /// Length recorded in the header
        expected: usize,
        /// Length actually produced
        actual: usize,
    },

    /// Declared uncompressed size exceeds the decompression limit
    #[error("uncompressed size {size} exceeds limit of {limit} bytes")]
    SizeLimitExceeded {
        /// Declared size
        size: usize,
        /// Configured limit
        limit: usize,
    },

    /// Payload too large for the 32-bit length field
    #[error("payload of {0} bytes does not fit a 32-bit length")]
    PayloadTooLarge(usize),

    /// Compression failed
    #[error("compression error: {0}")]
    CompressionError(String),

    /// Decompression failed
    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    /// Cipher error
    #[error("cipher error: {0}")]
    Crypto(#[from] CryptoError),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Result type for container operations
pub type ContainerResult<T> = Result<T, ContainerError>;
