//! Archive error types

use thiserror::Error;

/// Archive-specific error type
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArchiveError {
    /// No chunk count byte
    #[error("empty archive buffer")]
    Empty,

    /// Size trailer does not fit in the buffer
    #[error("size trailer of {trailer} bytes exceeds the {available} bytes available")]
    TrailerTooLarge {
        /// Trailer size implied by chunk and member counts
        trailer: usize,
        /// Bytes before the chunk count byte
        available: usize,
    },

    /// A chunk size accumulated to a negative value
    #[error("negative size for member {member} in chunk {chunk}")]
    NegativeSize {
        /// Chunk index
        chunk: usize,
        /// Member index
        member: usize,
    },

    /// Declared member sizes run past the data region
    #[error("member data needs {needed} bytes but only {available} precede the trailer")]
    DataTooShort {
        /// Bytes the declared sizes add up to
        needed: usize,
        /// Size of the data region
        available: usize,
    },

    /// Member index outside the archive
    #[error("member {index} out of range for archive of {len} members")]
    MemberOutOfRange {
        /// Requested member
        index: usize,
        /// Number of members
        len: usize,
    },

    /// Member too large for a 32-bit size field
    #[error("member of {0} bytes does not fit a 32-bit size")]
    MemberTooLarge(usize),
}

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;
