//! Identifier name hashing
//!
//! Tables with identifiers store a 32-bit hash of each entry's name instead
//! of the name itself. The hash is the classic `h = 31 * h + c` over UTF-16
//! code units with wrapping arithmetic.

/// Hash a name the way identifier fields are computed
pub fn name_hash(name: &str) -> i32 {
    name.encode_utf16().fold(0i32, |hash, unit| {
        i32::from(unit).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    })
}
