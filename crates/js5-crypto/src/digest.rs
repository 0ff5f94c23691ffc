//! Whirlpool 512-bit digests for content integrity verification

use crate::error::CryptoError;
use binrw::{BinRead, BinWrite};
use std::fmt;
use whirlpool::{Digest as _, Whirlpool};

/// Size of a Whirlpool digest in bytes
pub const DIGEST_SIZE: usize = 64;

/// Whirlpool digest of a stored file or reference table
#[derive(BinRead, BinWrite, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_SIZE]);

impl Digest {
    /// The all-zero digest, used for entries that carry no digest
    pub const ZERO: Self = Self([0u8; DIGEST_SIZE]);

    /// Create digest from raw bytes
    pub const fn from_bytes(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create digest from a slice, which must be exactly 64 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; DIGEST_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidDigestSize {
                    expected: DIGEST_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    /// Create digest from data by computing its Whirlpool hash
    pub fn from_data(data: &[u8]) -> Self {
        let mut hasher = Whirlpool::new();
        hasher.update(data);
        let result = hasher.finalize();
        let mut bytes = [0u8; DIGEST_SIZE];
        bytes.copy_from_slice(&result);
        Self(bytes)
    }

    /// Parse digest from hex string
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; DIGEST_SIZE];
        hex::decode_to_slice(hex, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Get raw bytes
    pub const fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Whether every byte is zero
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl Default for Digest {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
