//! Sector-chained virtual file store for JS5 caches.
//!
//! A cache packs many small game assets into a handful of large files in one
//! directory:
//!
//! - `main_file_cache.dat2`: every file's bytes, split across 520-byte
//!   sectors chained by next pointers
//! - `main_file_cache.idx0` .. `idx253`: one index per type, holding a
//!   6-byte `(size, first sector)` record per file id
//! - `main_file_cache.idx255`: the meta index, whose files are the
//!   reference tables of the other types
//!
//! [`FileStore`] reads and writes raw file bytes by `(type, id)`. [`Cache`]
//! layers containers, reference tables and archives on top, keeping the
//! reference table's CRCs and versions in step with every write.
//!
//! # Example
//!
//! ```rust,no_run
//! use js5_formats::{CompressionType, Container};
//! use js5_store::Cache;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut cache = Cache::open("/path/to/cache")?;
//! let mut container = Container::new(CompressionType::Gzip, b"asset".to_vec());
//! cache.write(2, 10, &mut container)?;
//!
//! let read = cache.read(2, 10)?;
//! assert_eq!(read.data, b"asset");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

use thiserror::Error;

// Positional I/O over files or memory
pub mod channel;

// On-disk records
pub mod file_index;
pub mod slice;

// Sector store
pub mod file_store;

// Container/table/archive facade
pub mod cache;

// Checksum table served to clients
pub mod checksum;

// Configuration
pub mod config;

pub use cache::Cache;
pub use channel::{Channel, FileChannel, MemoryChannel};
pub use checksum::{ChecksumEntry, ChecksumTable};
pub use config::{ArchiveCompression, StoreConfig};
pub use file_index::FileIndex;
pub use file_store::FileStore;
pub use slice::Slice;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Type, file, entry or member does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A sector chain is broken or a read came up short.
    #[error("Data corruption detected: {0}")]
    Corruption(String),

    /// A record or argument cannot be represented on disk.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The meta index was accessed through the cache facade.
    #[error("Reference tables can only be accessed through the file store")]
    MetaAccess,

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Container codec error.
    #[error("Container error: {0}")]
    Container(#[from] js5_formats::ContainerError),

    /// Reference table codec error.
    #[error("Reference table error: {0}")]
    ReferenceTable(#[from] js5_formats::ReferenceTableError),

    /// Archive codec error.
    #[error("Archive error: {0}")]
    Archive(#[from] js5_formats::ArchiveError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether the error reports something missing
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether the error reports a broken sector chain
    pub const fn is_corruption(&self) -> bool {
        matches!(self, Self::Corruption(_))
    }

    /// Whether the error comes from decoding or encoding a record
    pub const fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFormat(_) | Self::Container(_) | Self::ReferenceTable(_) | Self::Archive(_)
        )
    }
}

impl From<binrw::Error> for StoreError {
    fn from(e: binrw::Error) -> Self {
        Self::InvalidFormat(e.to_string())
    }
}

/// Version information for the store.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Data file name.
pub const DATA_FILE: &str = "main_file_cache.dat2";

/// Prefix of index file names; the type number follows.
pub const INDEX_FILE_PREFIX: &str = "main_file_cache.idx";

/// Type number of the meta index holding reference tables.
pub const META_TYPE: u8 = 255;

/// Maximum number of regular index files.
pub const MAX_TYPES: usize = 254;

/// File name of the index for `type_id`.
pub fn index_file_name(type_id: u8) -> String {
    format!("{INDEX_FILE_PREFIX}{type_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_file_names() {
        assert_eq!(index_file_name(0), "main_file_cache.idx0");
        assert_eq!(index_file_name(META_TYPE), "main_file_cache.idx255");
    }

    #[test]
    fn test_error_classification() {
        assert!(StoreError::NotFound("x".into()).is_not_found());
        assert!(StoreError::Corruption("x".into()).is_corruption());
        assert!(StoreError::InvalidFormat("x".into()).is_format_error());
        assert!(StoreError::Archive(js5_formats::ArchiveError::Empty).is_format_error());
        assert!(!StoreError::MetaAccess.is_format_error());
    }
}
