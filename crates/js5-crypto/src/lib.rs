//! Checksums, digests and ciphers for the JS5 virtual file store
//!
//! This crate provides the cryptographic primitives used by the store for
//! integrity verification and update checks.
//!
//! # Components
//!
//! - **CRC-32**: per-file checksums recorded in reference tables
//! - **Whirlpool**: 512-bit digests recorded when a table carries them
//! - **XTEA**: block cipher applied to some containers (e.g. map data)
//! - **Name hash**: the identifier hash used for named entries
//!
//! # Examples
//!
//! ## Checksums and digests
//!
//! ```
//! use js5_crypto::{Digest, crc32};
//!
//! let data = b"Hello, World!";
//! let crc = crc32(data);
//! let digest = Digest::from_data(data);
//! println!("crc={crc:08x} whirlpool={digest}");
//! ```
//!
//! ## Identifier hashes
//!
//! ```
//! use js5_crypto::name_hash;
//!
//! assert_eq!(name_hash("a"), 97);
//! ```

#![warn(missing_docs)]

pub mod crc;
pub mod digest;
pub mod error;
pub mod name;
pub mod xtea;

pub use crc::{crc32, crc32_excluding_trailer};
pub use digest::{DIGEST_SIZE, Digest};
pub use error::CryptoError;
pub use name::name_hash;
pub use xtea::XteaKey;
