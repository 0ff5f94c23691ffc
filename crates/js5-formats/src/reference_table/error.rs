//! Error types for reference tables

use crate::buffer::BufferError;
use js5_crypto::CryptoError;
use thiserror::Error;

/// Errors that can occur when parsing or building reference tables
#[derive(Debug, Error)]
pub enum ReferenceTableError {
    /// The buffer ends before the table does
    #[error("truncated reference table: {0}")]
    Truncated(#[from] BufferError),

    /// More entries than the 16-bit count field can hold
    #[error("too many entries: {0} (maximum 65535)")]
    TooManyEntries(usize),

    /// More children in one entry than the 16-bit count field can hold
    #[error("entry {id} has too many children: {count} (maximum 65535)")]
    TooManyChildren {
        /// Entry id
        id: u32,
        /// Number of children
        count: usize,
    },

    /// Gap between consecutive ids does not fit a 16-bit delta
    #[error("id gap from {previous} to {id} does not fit a 16-bit delta")]
    IdGapTooLarge {
        /// Previous id emitted
        previous: u32,
        /// Id that could not be encoded
        id: u32,
    },

    /// Digest error
    #[error("digest error: {0}")]
    Crypto(#[from] CryptoError),

    /// Binary read/write error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Result type alias for reference table operations
pub type Result<T> = std::result::Result<T, ReferenceTableError>;
