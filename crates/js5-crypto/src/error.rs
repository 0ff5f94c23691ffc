//! Error types for cryptographic operations

use thiserror::Error;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid digest size
    #[error("Invalid digest size: expected {expected}, got {actual}")]
    InvalidDigestSize {
        /// Expected digest size in bytes
        expected: usize,
        /// Actual digest size in bytes
        actual: usize,
    },

    /// Invalid key size
    #[error("Invalid key size: expected {expected}, got {actual}")]
    InvalidKeySize {
        /// Expected key size in bytes
        expected: usize,
        /// Actual key size in bytes
        actual: usize,
    },

    /// Invalid key format
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// Cipher range does not lie within the buffer
    #[error("Cipher range {start}..{end} out of bounds for buffer of {len} bytes")]
    RangeOutOfBounds {
        /// Range start
        start: usize,
        /// Range end (exclusive)
        end: usize,
        /// Buffer length
        len: usize,
    },
}
