//! Archives pack several members (e.g. the sprites of one interface) into a
//! single file. Member data comes first, followed by a size trailer and a
//! final chunk count byte:
//!
//! ```text
//! [chunk 0: member 0 .. member N-1][chunk 1: ...] ... [sizes][chunk count u8]
//! ```
//!
//! The trailer holds `chunks × members` big-endian `i32` deltas, chunk-major.
//! Within a chunk each delta is relative to the previous member's chunk size
//! and the accumulator restarts at zero for every chunk. A member's bytes are
//! the concatenation of its pieces across all chunks.
//!
//! The member count is not stored; it comes from the owning reference table
//! entry. Encoding always produces a single chunk.

pub mod error;

pub use error::{ArchiveError, ArchiveResult};

/// Size of one trailer delta
const DELTA_SIZE: usize = 4;

/// Decoded archive members in slot order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Archive {
    members: Vec<Vec<u8>>,
}

impl Archive {
    /// Create an archive of `count` empty members
    pub fn new(count: usize) -> Self {
        Self {
            members: vec![Vec::new(); count],
        }
    }

    /// Create an archive from member buffers
    pub fn from_members(members: Vec<Vec<u8>>) -> Self {
        Self { members }
    }

    /// Number of member slots
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the archive has no slots
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Get a member
    pub fn member(&self, index: usize) -> Option<&[u8]> {
        self.members.get(index).map(Vec::as_slice)
    }

    /// Replace a member
    pub fn put_member(&mut self, index: usize, data: Vec<u8>) -> ArchiveResult<()> {
        let len = self.members.len();
        let slot = self
            .members
            .get_mut(index)
            .ok_or(ArchiveError::MemberOutOfRange { index, len })?;
        *slot = data;
        Ok(())
    }

    /// Grow to at least `count` slots, keeping existing members in place
    pub fn grow(&mut self, count: usize) {
        if count > self.members.len() {
            self.members.resize(count, Vec::new());
        }
    }

    /// All members in slot order
    pub fn members(&self) -> &[Vec<u8>] {
        &self.members
    }

    /// Consume the archive, returning its members
    pub fn into_members(self) -> Vec<Vec<u8>> {
        self.members
    }

    /// Decode an archive holding `member_count` members
    pub fn decode(data: &[u8], member_count: usize) -> ArchiveResult<Self> {
        let (&chunks, body) = data.split_last().ok_or(ArchiveError::Empty)?;
        let chunks = usize::from(chunks);

        let trailer = chunks
            .checked_mul(member_count)
            .and_then(|n| n.checked_mul(DELTA_SIZE))
            .filter(|&n| n <= body.len())
            .ok_or(ArchiveError::TrailerTooLarge {
                trailer: chunks.saturating_mul(member_count).saturating_mul(DELTA_SIZE),
                available: body.len(),
            })?;
        let data_end = body.len() - trailer;

        let mut deltas = body[data_end..]
            .chunks_exact(DELTA_SIZE)
            .map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]));

        let mut chunk_sizes = vec![vec![0usize; member_count]; chunks];
        let mut totals = vec![0usize; member_count];
        for (chunk, sizes) in chunk_sizes.iter_mut().enumerate() {
            let mut size = 0i32;
            for (member, slot) in sizes.iter_mut().enumerate() {
                size = size.wrapping_add(deltas.next().unwrap_or_default());
                *slot = usize::try_from(size)
                    .map_err(|_| ArchiveError::NegativeSize { chunk, member })?;
                totals[member] += *slot;
            }
        }

        let needed: usize = totals.iter().sum();
        if needed > data_end {
            return Err(ArchiveError::DataTooShort {
                needed,
                available: data_end,
            });
        }

        let mut members: Vec<Vec<u8>> = totals.iter().map(|&n| Vec::with_capacity(n)).collect();
        let mut offset = 0;
        for sizes in &chunk_sizes {
            for (member, &size) in members.iter_mut().zip(sizes) {
                member.extend_from_slice(&body[offset..offset + size]);
                offset += size;
            }
        }

        Ok(Self { members })
    }

    /// Encode as a single chunk
    pub fn encode(&self) -> ArchiveResult<Vec<u8>> {
        let data_len: usize = self.members.iter().map(Vec::len).sum();
        let mut out = Vec::with_capacity(data_len + self.members.len() * DELTA_SIZE + 1);

        for member in &self.members {
            out.extend_from_slice(member);
        }

        let mut previous = 0i32;
        for member in &self.members {
            let size = i32::try_from(member.len())
                .map_err(|_| ArchiveError::MemberTooLarge(member.len()))?;
            out.extend_from_slice(&size.wrapping_sub(previous).to_be_bytes());
            previous = size;
        }

        out.push(1);
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_encode_layout() {
        let archive = Archive::from_members(vec![vec![1, 2, 3], vec![4]]);
        let bytes = archive.encode().unwrap();
        assert_eq!(
            bytes,
            vec![
                1, 2, 3, 4, // data
                0, 0, 0, 3, // 3 - 0
                0xFF, 0xFF, 0xFF, 0xFE, // 1 - 3
                1,    // one chunk
            ]
        );
    }

    #[test]
    fn test_decode_single_chunk() {
        let bytes = Archive::from_members(vec![b"abc".to_vec(), Vec::new(), b"z".to_vec()])
            .encode()
            .unwrap();
        let archive = Archive::decode(&bytes, 3).unwrap();
        assert_eq!(archive.member(0), Some(&b"abc"[..]));
        assert_eq!(archive.member(1), Some(&b""[..]));
        assert_eq!(archive.member(2), Some(&b"z"[..]));
        assert_eq!(archive.member(3), None);
    }

    #[test]
    fn test_decode_multiple_chunks() {
        // Two members split over two chunks:
        // chunk 0: "ab" | "X", chunk 1: "c" | "YZ"
        let mut bytes = b"abXcYZ".to_vec();
        for delta in [2i32, -1, 1, 1] {
            bytes.extend_from_slice(&delta.to_be_bytes());
        }
        bytes.push(2);

        let archive = Archive::decode(&bytes, 2).unwrap();
        assert_eq!(archive.member(0), Some(&b"abc"[..]));
        assert_eq!(archive.member(1), Some(&b"XYZ"[..]));
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(Archive::decode(&[], 1), Err(ArchiveError::Empty));

        // One chunk of two members needs an 8-byte trailer
        assert!(matches!(
            Archive::decode(&[0, 0, 0, 1], 2),
            Err(ArchiveError::TrailerTooLarge { .. })
        ));

        // Declares 10 bytes of data, has 2
        let mut bytes = vec![7, 7];
        bytes.extend_from_slice(&10i32.to_be_bytes());
        bytes.push(1);
        assert_eq!(
            Archive::decode(&bytes, 1),
            Err(ArchiveError::DataTooShort {
                needed: 10,
                available: 2
            })
        );

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-4i32).to_be_bytes());
        bytes.push(1);
        assert_eq!(
            Archive::decode(&bytes, 1),
            Err(ArchiveError::NegativeSize {
                chunk: 0,
                member: 0
            })
        );
    }

    #[test]
    fn test_grow_and_put() {
        let mut archive = Archive::new(1);
        archive.put_member(0, vec![9]).unwrap();
        archive.grow(3);
        archive.grow(2);
        assert_eq!(archive.len(), 3);
        assert_eq!(archive.member(0), Some(&[9u8][..]));
        assert_eq!(
            archive.put_member(5, Vec::new()),
            Err(ArchiveError::MemberOutOfRange { index: 5, len: 3 })
        );
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(
            members in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 0..8),
        ) {
            let archive = Archive::from_members(members);
            let bytes = archive.encode().unwrap();
            prop_assert_eq!(Archive::decode(&bytes, archive.len()).unwrap(), archive);
        }
    }
}
