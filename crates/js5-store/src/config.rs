//! Configuration for opening a cache

use crate::{MAX_TYPES, Result, StoreError};
use js5_formats::CompressionType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Compression for archives created by member writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveCompression {
    /// Stored as-is
    None,
    /// Headerless bzip2
    Bzip2,
    /// Gzip
    #[default]
    Gzip,
}

impl From<ArchiveCompression> for CompressionType {
    fn from(value: ArchiveCompression) -> Self {
        match value {
            ArchiveCompression::None => Self::None,
            ArchiveCompression::Bzip2 => Self::Bzip2,
            ArchiveCompression::Gzip => Self::Gzip,
        }
    }
}

/// Configuration for the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the data and index files
    pub root: PathBuf,

    /// Number of index files to create when the store does not exist yet
    pub type_count: usize,

    /// Compression of archives started by member writes
    pub archive_compression: ArchiveCompression,

    /// Create an empty store when `root` holds none
    pub create_if_missing: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./cache"),
            type_count: 1,
            archive_compression: ArchiveCompression::Gzip,
            create_if_missing: false,
        }
    }
}

impl StoreConfig {
    /// Create a configuration for the store in `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Set the store directory
    #[must_use]
    pub fn with_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.root = root.as_ref().to_path_buf();
        self
    }

    /// Set the number of types created for a new store
    #[must_use]
    pub const fn with_type_count(mut self, type_count: usize) -> Self {
        self.type_count = type_count;
        self
    }

    /// Set the compression of new archives
    #[must_use]
    pub const fn with_archive_compression(mut self, compression: ArchiveCompression) -> Self {
        self.archive_compression = compression;
        self
    }

    /// Create the store when it does not exist
    #[must_use]
    pub const fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the settings describe a store that can exist
    pub fn validate(&self) -> Result<()> {
        if self.type_count == 0 || self.type_count > MAX_TYPES {
            return Err(StoreError::Config(format!(
                "type_count must be between 1 and {MAX_TYPES}, got {}",
                self.type_count
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let config = StoreConfig::new("/tmp/js5")
            .with_type_count(40)
            .with_archive_compression(ArchiveCompression::Bzip2)
            .with_create_if_missing(true);

        assert_eq!(config.root, PathBuf::from("/tmp/js5"));
        assert_eq!(config.type_count, 40);
        assert_eq!(
            CompressionType::from(config.archive_compression),
            CompressionType::Bzip2
        );
        assert!(config.create_if_missing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, r#"{ "root": "/srv/cache", "archive_compression": "none" }"#)
            .unwrap();

        let config = StoreConfig::from_json_file(&path).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/cache"));
        assert_eq!(config.type_count, 1);
        assert_eq!(config.archive_compression, ArchiveCompression::None);
        assert!(!config.create_if_missing);
    }

    #[test]
    fn test_json_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            StoreConfig::from_json_file(&path),
            Err(StoreError::Config(_))
        ));

        std::fs::write(&path, r#"{ "type_count": 0 }"#).unwrap();
        assert!(matches!(
            StoreConfig::from_json_file(&path),
            Err(StoreError::Config(_))
        ));

        assert!(StoreConfig::from_json_file(dir.path().join("missing.json")).is_err());
    }
}
