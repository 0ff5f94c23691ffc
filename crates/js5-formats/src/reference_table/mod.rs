//! Every type has a reference table stored in the meta index (type 255)
//! under the type's number. It lists which files exist, their checksums and
//! versions, and for archive files which members they hold.
//!
//! # Format Overview
//!
//! - Header: format byte, then a u32 version when format >= 6
//! - Flags byte ([`FLAG_IDENTIFIERS`], [`FLAG_WHIRLPOOL`])
//! - u16 entry count, then one u16 id delta per entry
//! - Columns, each in entry order: identifiers (if flagged), CRCs,
//!   digests (if flagged), versions, child counts, child id deltas,
//!   child identifiers (if flagged)
//!
//! All multi-byte integers are big-endian. Ids are delta encoded: each is
//! stored as the difference from the previous id, so sparse tables stay
//! compact.
//!
//! # Usage
//!
//! ```rust
//! use js5_formats::reference_table::{Entry, ReferenceTable, TableHeader, FLAG_WHIRLPOOL};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut table = ReferenceTable::new(TableHeader::new(6, 1), FLAG_WHIRLPOOL);
//! table.put_entry(0, Entry::new());
//! table.put_entry(4, Entry::new());
//!
//! let data = table.build()?;
//! let parsed = ReferenceTable::parse(&data)?;
//! assert_eq!(parsed.capacity(), 5);
//! assert_eq!(parsed.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod entry;
pub mod error;
pub mod header;

pub use entry::{ChildEntry, Entry, NO_IDENTIFIER};
pub use error::{ReferenceTableError, Result};
pub use header::{TableHeader, VERSIONED_FORMAT};

use crate::buffer::{BufferError, get_bytes, get_u8, get_u16, get_u32};
use crate::sparse::SparseMap;
use binrw::BinRead;
use binrw::io::Cursor;
use js5_crypto::{DIGEST_SIZE, Digest, name_hash};

/// Entries carry name hashes
pub const FLAG_IDENTIFIERS: u8 = 0x01;

/// Entries carry Whirlpool digests
pub const FLAG_WHIRLPOOL: u8 = 0x02;

/// Metadata index for one type
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReferenceTable {
    /// Format and version
    pub header: TableHeader,
    /// Flag bits
    pub flags: u8,
    entries: SparseMap<Entry>,
}

impl ReferenceTable {
    /// Create an empty table
    pub fn new(header: TableHeader, flags: u8) -> Self {
        Self {
            header,
            flags,
            entries: SparseMap::new(),
        }
    }

    /// Get the format byte
    pub const fn format(&self) -> u8 {
        self.header.format()
    }

    /// Get the table version
    pub const fn version(&self) -> u32 {
        self.header.version()
    }

    /// Set the table version (ignored for formats below 6)
    pub fn set_version(&mut self, version: u32) {
        self.header.set_version(version);
    }

    /// Whether entries carry name hashes
    pub const fn has_identifiers(&self) -> bool {
        self.flags & FLAG_IDENTIFIERS != 0
    }

    /// Whether entries carry Whirlpool digests
    pub const fn has_whirlpool(&self) -> bool {
        self.flags & FLAG_WHIRLPOOL != 0
    }

    /// Look up an entry
    pub fn entry(&self, id: u32) -> Option<&Entry> {
        self.entries.get(id)
    }

    /// Look up an entry mutably
    pub fn entry_mut(&mut self, id: u32) -> Option<&mut Entry> {
        self.entries.get_mut(id)
    }

    /// Get an entry, creating an empty one when absent
    pub fn entry_or_default(&mut self, id: u32) -> &mut Entry {
        self.entries.get_or_insert_with(id, Entry::new)
    }

    /// Insert or replace an entry
    pub fn put_entry(&mut self, id: u32, entry: Entry) {
        self.entries.insert(id, entry);
    }

    /// Remove an entry
    pub fn remove_entry(&mut self, id: u32) -> Option<Entry> {
        self.entries.remove(id)
    }

    /// Look up a child of an entry
    pub fn child(&self, id: u32, child: u32) -> Option<&ChildEntry> {
        self.entries.get(id)?.child(child)
    }

    /// Entries by ascending id
    pub const fn entries(&self) -> &SparseMap<Entry> {
        &self.entries
    }

    /// Number of entries present
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table lists no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest entry id plus one
    pub fn capacity(&self) -> u32 {
        self.entries.capacity()
    }

    /// Find an entry by name
    pub fn find(&self, name: &str) -> Option<u32> {
        let hash = name_hash(name);
        self.entries
            .iter()
            .find(|(_, entry)| entry.identifier == hash)
            .map(|(id, _)| id)
    }

    /// Parse a reference table
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = TableHeader::read_options(&mut Cursor::new(data), binrw::Endian::Big, ())
            .map_err(|e| match e {
                binrw::Error::Io(_) => ReferenceTableError::Truncated(BufferError::UnexpectedEof {
                    offset: 0,
                    needed: if data.first().is_some_and(|&f| f >= VERSIONED_FORMAT) {
                        5
                    } else {
                        1
                    },
                    available: data.len(),
                }),
                other => ReferenceTableError::BinRw(other),
            })?;
        let (flags, mut offset) = get_u8(data, header.size())?;

        let (ids, next) = read_ids(data, offset)?;
        offset = next;

        let mut entries: Vec<Entry> = ids.iter().map(|_| Entry::new()).collect();

        if flags & FLAG_IDENTIFIERS != 0 {
            for entry in &mut entries {
                let (identifier, next) = get_u32(data, offset)?;
                entry.identifier = identifier as i32;
                offset = next;
            }
        }

        for entry in &mut entries {
            let (crc, next) = get_u32(data, offset)?;
            entry.crc = crc;
            offset = next;
        }

        if flags & FLAG_WHIRLPOOL != 0 {
            for entry in &mut entries {
                let (digest, next) = get_bytes(data, offset, DIGEST_SIZE)?;
                entry.digest = Digest::from_slice(digest)?;
                offset = next;
            }
        }

        for entry in &mut entries {
            let (version, next) = get_u32(data, offset)?;
            entry.version = version;
            offset = next;
        }

        let mut child_counts = Vec::with_capacity(entries.len());
        for _ in 0..entries.len() {
            let (count, next) = get_u16(data, offset)?;
            child_counts.push(count);
            offset = next;
        }

        let mut child_ids = Vec::with_capacity(entries.len());
        for &count in &child_counts {
            let (children, next) = read_deltas(data, offset, usize::from(count))?;
            child_ids.push(children);
            offset = next;
        }

        for (entry, children) in entries.iter_mut().zip(&child_ids) {
            for &child in children {
                let mut child_entry = ChildEntry::default();
                if flags & FLAG_IDENTIFIERS != 0 {
                    let (identifier, next) = get_u32(data, offset)?;
                    child_entry.identifier = identifier as i32;
                    offset = next;
                }
                entry.put_child(child, child_entry);
            }
        }

        Ok(Self {
            header,
            flags,
            entries: ids.into_iter().zip(entries).collect(),
        })
    }

    /// Build the encoded table
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut cursor = Cursor::new(&mut out);
        binrw::BinWrite::write_options(&self.header, &mut cursor, binrw::Endian::Big, ())?;
        out.push(self.flags);

        let count = u16::try_from(self.entries.len())
            .map_err(|_| ReferenceTableError::TooManyEntries(self.entries.len()))?;
        out.extend_from_slice(&count.to_be_bytes());
        write_deltas(&mut out, self.entries.ids())?;

        if self.has_identifiers() {
            for entry in self.entries.values() {
                out.extend_from_slice(&entry.identifier.to_be_bytes());
            }
        }

        for entry in self.entries.values() {
            out.extend_from_slice(&entry.crc.to_be_bytes());
        }

        if self.has_whirlpool() {
            for entry in self.entries.values() {
                out.extend_from_slice(entry.digest.as_bytes());
            }
        }

        for entry in self.entries.values() {
            out.extend_from_slice(&entry.version.to_be_bytes());
        }

        for (id, entry) in self.entries.iter() {
            let count = u16::try_from(entry.len()).map_err(|_| {
                ReferenceTableError::TooManyChildren {
                    id,
                    count: entry.len(),
                }
            })?;
            out.extend_from_slice(&count.to_be_bytes());
        }

        for entry in self.entries.values() {
            write_deltas(&mut out, entry.children().ids())?;
        }

        if self.has_identifiers() {
            for entry in self.entries.values() {
                for child in entry.children().values() {
                    out.extend_from_slice(&child.identifier.to_be_bytes());
                }
            }
        }

        Ok(out)
    }
}

/// Read the entry count and the delta-encoded ids that follow it
fn read_ids(data: &[u8], offset: usize) -> Result<(Vec<u32>, usize)> {
    let (count, offset) = get_u16(data, offset)?;
    read_deltas(data, offset, usize::from(count))
}

/// Read `count` u16 deltas, accumulating them into absolute ids
fn read_deltas(data: &[u8], mut offset: usize, count: usize) -> Result<(Vec<u32>, usize)> {
    let mut ids = Vec::with_capacity(count);
    let mut accumulator = 0u32;
    for _ in 0..count {
        let (delta, next) = get_u16(data, offset)?;
        accumulator += u32::from(delta);
        ids.push(accumulator);
        offset = next;
    }
    Ok((ids, offset))
}

fn write_deltas(out: &mut Vec<u8>, ids: &[u32]) -> Result<()> {
    let mut previous = 0u32;
    for &id in ids {
        let delta = u16::try_from(id - previous)
            .map_err(|_| ReferenceTableError::IdGapTooLarge { previous, id })?;
        out.extend_from_slice(&delta.to_be_bytes());
        previous = id;
    }
    Ok(())
}

impl crate::Js5Format for ReferenceTable {
    fn parse(data: &[u8]) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        Self::parse(data).map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
    }

    fn build(&self) -> std::result::Result<Vec<u8>, Box<dyn std::error::Error>> {
        self.build()
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
    }
}
