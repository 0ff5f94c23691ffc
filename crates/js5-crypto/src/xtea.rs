//! XTEA block cipher
//!
//! Some containers (map regions in particular) are enciphered with XTEA
//! using a per-file 128-bit key. The cipher operates on whole 8-byte blocks
//! of big-endian `u32` pairs; a trailing partial block is left untouched.

use crate::error::CryptoError;
use std::fmt;

/// The golden ratio constant used as the XTEA round delta
pub const GOLDEN_RATIO: u32 = 0x9E37_79B9;

/// Number of XTEA rounds
pub const ROUNDS: u32 = 32;

/// Size of an XTEA block in bytes
pub const BLOCK_SIZE: usize = 8;

/// 128-bit XTEA key as four `u32` words
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct XteaKey([u32; 4]);

impl XteaKey {
    /// The all-zero key. Containers keyed with it are stored in the clear.
    pub const ZERO: Self = Self([0; 4]);

    /// Create a key from its four words
    pub const fn new(words: [u32; 4]) -> Self {
        Self(words)
    }

    /// Create a key from a slice of words, which must hold exactly four
    pub fn from_slice(words: &[u32]) -> Result<Self, CryptoError> {
        let array: [u32; 4] = words
            .try_into()
            .map_err(|_| CryptoError::InvalidKeySize {
                expected: 4,
                actual: words.len(),
            })?;
        Ok(Self(array))
    }

    /// Create a key from 16 big-endian bytes
    pub fn from_be_bytes(bytes: [u8; 16]) -> Self {
        let mut words = [0u32; 4];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self(words)
    }

    /// Get the key words
    pub const fn words(&self) -> &[u32; 4] {
        &self.0
    }

    /// Whether this is the all-zero key
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&w| w == 0)
    }

    /// Encipher every whole block in `data[start..end]` in place
    pub fn encipher(&self, data: &mut [u8], start: usize, end: usize) -> Result<(), CryptoError> {
        for block in blocks(data, start, end)? {
            let (mut v0, mut v1) = read_block(block);
            let mut sum = 0u32;
            for _ in 0..ROUNDS {
                v0 = v0.wrapping_add(
                    mix(v1) ^ sum.wrapping_add(self.0[(sum & 3) as usize]),
                );
                sum = sum.wrapping_add(GOLDEN_RATIO);
                v1 = v1.wrapping_add(
                    mix(v0) ^ sum.wrapping_add(self.0[((sum >> 11) & 3) as usize]),
                );
            }
            write_block(block, v0, v1);
        }
        Ok(())
    }

    /// Decipher every whole block in `data[start..end]` in place
    pub fn decipher(&self, data: &mut [u8], start: usize, end: usize) -> Result<(), CryptoError> {
        for block in blocks(data, start, end)? {
            let (mut v0, mut v1) = read_block(block);
            let mut sum = GOLDEN_RATIO.wrapping_mul(ROUNDS);
            for _ in 0..ROUNDS {
                v1 = v1.wrapping_sub(
                    mix(v0) ^ sum.wrapping_add(self.0[((sum >> 11) & 3) as usize]),
                );
                sum = sum.wrapping_sub(GOLDEN_RATIO);
                v0 = v0.wrapping_sub(
                    mix(v1) ^ sum.wrapping_add(self.0[(sum & 3) as usize]),
                );
            }
            write_block(block, v0, v1);
        }
        Ok(())
    }
}

impl fmt::Debug for XteaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keys are secrets; never print the words
        write!(f, "XteaKey(..)")
    }
}

impl From<[u32; 4]> for XteaKey {
    fn from(words: [u32; 4]) -> Self {
        Self(words)
    }
}

fn mix(v: u32) -> u32 {
    ((v << 4) ^ (v >> 5)).wrapping_add(v)
}

fn blocks(
    data: &mut [u8],
    start: usize,
    end: usize,
) -> Result<std::slice::ChunksExactMut<'_, u8>, CryptoError> {
    if start > end || end > data.len() {
        return Err(CryptoError::RangeOutOfBounds {
            start,
            end,
            len: data.len(),
        });
    }
    Ok(data[start..end].chunks_exact_mut(BLOCK_SIZE))
}

fn read_block(block: &[u8]) -> (u32, u32) {
    let v0 = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
    let v1 = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
    (v0, v1)
}

fn write_block(block: &mut [u8], v0: u32, v1: u32) {
    block[..4].copy_from_slice(&v0.to_be_bytes());
    block[4..].copy_from_slice(&v1.to_be_bytes());
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const KEY: XteaKey = XteaKey::new([0x0001_0203, 0x0405_0607, 0x0809_0A0B, 0x0C0D_0E0F]);

    #[test]
    fn test_encipher_changes_data() {
        let plain = *b"ABCDEFGH";
        let mut data = plain;
        KEY.encipher(&mut data, 0, 8).expect("in range");
        assert_ne!(data, plain);
    }

    #[test]
    fn test_partial_block_untouched() {
        let mut data = *b"0123456789AB";
        let len = data.len();
        KEY.encipher(&mut data, 0, len).expect("in range");
        assert_eq!(&data[8..], b"89AB");
    }

    #[test]
    fn test_range_respected() {
        let mut data = [0x11u8; 21];
        KEY.encipher(&mut data, 5, 21).expect("in range");
        assert_eq!(&data[..5], &[0x11; 5]);
    }

    #[test]
    fn test_out_of_bounds_range() {
        let mut data = [0u8; 8];
        assert!(KEY.encipher(&mut data, 0, 16).is_err());
        assert!(KEY.decipher(&mut data, 6, 2).is_err());
    }

    #[test]
    fn test_key_from_bytes() {
        let key = XteaKey::from_be_bytes([
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D,
            0x0E, 0x0F,
        ]);
        assert_eq!(key, KEY);
        assert!(XteaKey::from_slice(&[1, 2, 3]).is_err());
        assert!(XteaKey::ZERO.is_zero());
    }

    #[test]
    fn test_debug_hides_key() {
        assert_eq!(format!("{KEY:?}"), "XteaKey(..)");
    }

    proptest! {
        #[test]
        fn decipher_inverts_encipher(
            words in any::<[u32; 4]>(),
            data in proptest::collection::vec(any::<u8>(), 0..128),
        ) {
            let key = XteaKey::new(words);
            let mut buffer = data.clone();
            let end = buffer.len();
            key.encipher(&mut buffer, 0, end).unwrap();
            key.decipher(&mut buffer, 0, end).unwrap();
            prop_assert_eq!(buffer, data);
        }
    }
}
