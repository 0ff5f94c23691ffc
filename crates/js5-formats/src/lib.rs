//! Codecs for the JS5 virtual file store
//!
#![allow(clippy::cast_possible_wrap)] // Identifiers are stored as raw 32-bit words
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! This crate provides symmetric (parser and builder) implementations of the
//! structures stored inside a JS5 cache. None of them know about sectors or
//! index files; they operate purely on byte buffers.
//!
//! # Supported Formats
//!
//! - **Container**: compressed wrapper (none, bzip2, gzip) with an optional
//!   2-byte version trailer, optionally XTEA-enciphered
//! - **Reference Table**: per-type metadata listing every file, its CRC-32,
//!   version, optional Whirlpool digest and its archive members
//! - **Archive**: multiple member buffers packed into one file with a
//!   chunked, delta-encoded size trailer
//!
//! # Design Principles
//!
//! - **Symmetric Operations**: every format can be parsed and built
//! - **Explicit Offsets**: decoders walk immutable slices rather than
//!   sharing a mutable read position
//! - **Round-Trip Guarantee**: parse(build(value)) == value

#![warn(missing_docs)]

/// Multi-member archive packing
pub mod archive;
pub mod buffer;
/// Compressed container wrapper
///
/// Every file stored in the cache, reference tables included, is wrapped in
/// a container. See the [`container`] module for the byte layout.
pub mod container;
/// Reference tables describing the files of one type
pub mod reference_table;
pub mod sparse;

// Test utilities module
#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub(crate) mod test_utils;

pub use archive::{Archive, ArchiveError};
pub use container::{CompressionType, Container, ContainerError};
pub use reference_table::{ChildEntry, Entry, ReferenceTable, ReferenceTableError, TableHeader};
pub use sparse::SparseMap;

/// Common format trait for self-describing cache formats
pub trait Js5Format: Sized {
    /// Parse from bytes
    fn parse(data: &[u8]) -> Result<Self, Box<dyn std::error::Error>>;

    /// Build to bytes
    fn build(&self) -> Result<Vec<u8>, Box<dyn std::error::Error>>;

    /// Verify round-trip correctness
    fn verify_round_trip(data: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
        let parsed = Self::parse(data)?;
        let rebuilt = parsed.build()?;
        if data != rebuilt.as_slice() {
            return Err("Round-trip verification failed".into());
        }
        Ok(())
    }
}
