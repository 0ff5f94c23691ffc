//! Reference table entries

use crate::sparse::SparseMap;
use js5_crypto::{Digest, name_hash};

/// Identifier value meaning "no name"
pub const NO_IDENTIFIER: i32 = -1;

/// A member of an archive file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildEntry {
    /// Hash of the member's name, or [`NO_IDENTIFIER`]
    pub identifier: i32,
}

impl Default for ChildEntry {
    fn default() -> Self {
        Self {
            identifier: NO_IDENTIFIER,
        }
    }
}

impl ChildEntry {
    /// Create a child with the given identifier
    pub const fn new(identifier: i32) -> Self {
        Self { identifier }
    }

    /// Create a child identified by the hash of `name`
    pub fn named(name: &str) -> Self {
        Self::new(name_hash(name))
    }
}

/// Metadata for one file of a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Hash of the file's name, or [`NO_IDENTIFIER`]
    pub identifier: i32,
    /// CRC-32 of the stored container, version trailer excluded
    pub crc: u32,
    /// Whirlpool digest of the stored container, version trailer excluded
    pub digest: Digest,
    /// File version
    pub version: u32,
    children: SparseMap<ChildEntry>,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            identifier: NO_IDENTIFIER,
            crc: 0,
            digest: Digest::ZERO,
            version: 0,
            children: SparseMap::new(),
        }
    }
}

impl Entry {
    /// Create an empty entry
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a child
    pub fn child(&self, id: u32) -> Option<&ChildEntry> {
        self.children.get(id)
    }

    /// Look up a child mutably
    pub fn child_mut(&mut self, id: u32) -> Option<&mut ChildEntry> {
        self.children.get_mut(id)
    }

    /// Insert or replace a child
    pub fn put_child(&mut self, id: u32, child: ChildEntry) {
        self.children.insert(id, child);
    }

    /// Remove a child
    pub fn remove_child(&mut self, id: u32) -> Option<ChildEntry> {
        self.children.remove(id)
    }

    /// Children by ascending id
    pub const fn children(&self) -> &SparseMap<ChildEntry> {
        &self.children
    }

    /// Number of children present
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the entry has no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Highest child id plus one
    pub fn capacity(&self) -> u32 {
        self.children.capacity()
    }

    /// Dense archive slot of child `id`: the number of children before it
    pub fn slot(&self, id: u32) -> Option<usize> {
        self.children.contains(id).then(|| self.children.rank(id))
    }

    /// Find a child by name
    pub fn find_child(&self, name: &str) -> Option<u32> {
        let hash = name_hash(name);
        self.children
            .iter()
            .find(|(_, child)| child.identifier == hash)
            .map(|(id, _)| id)
    }
}
