//! Sector store
//!
//! Files are stored as chains of 520-byte sectors in the data channel, located
//! through 6-byte records in per-type index channels. A write first tries to
//! reuse the file's existing chain in place and falls back to appending a
//! fresh chain at the end of the data channel.

use crate::channel::{Channel, FileChannel, MemoryChannel};
use crate::file_index::{FileIndex, INDEX_SIZE};
use crate::slice::{DATA_SIZE, SLICE_SIZE, Slice};
use crate::{DATA_FILE, MAX_TYPES, META_TYPE, Result, StoreError, index_file_name};
use js5_formats::buffer::TRI_BYTE_MAX;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// Sector-chained file store over a data channel and index channels
#[derive(Debug)]
pub struct FileStore<C: Channel = FileChannel> {
    data: C,
    indexes: Vec<C>,
    meta: C,
    root: Option<PathBuf>,
}

impl FileStore<FileChannel> {
    /// Open the store in `root`.
    ///
    /// Requires the data file, at least `idx0`, and `idx255`. Index files are
    /// picked up in order until the first missing number.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();

        let data_path = root.join(DATA_FILE);
        if !data_path.exists() {
            return Err(StoreError::NotFound(format!(
                "data file {}",
                data_path.display()
            )));
        }
        let data = FileChannel::open(&data_path)?;

        let mut indexes = Vec::new();
        for type_id in 0..MAX_TYPES as u8 {
            let path = root.join(index_file_name(type_id));
            if !path.exists() {
                break;
            }
            indexes.push(FileChannel::open(&path)?);
        }
        if indexes.is_empty() {
            return Err(StoreError::NotFound(format!(
                "no index files in {}",
                root.display()
            )));
        }

        let meta_path = root.join(index_file_name(META_TYPE));
        if !meta_path.exists() {
            return Err(StoreError::NotFound(format!(
                "meta index {}",
                meta_path.display()
            )));
        }
        let meta = FileChannel::open(&meta_path)?;

        info!(
            "Opened store at {} with {} types",
            root.display(),
            indexes.len()
        );

        Ok(Self {
            data,
            indexes,
            meta,
            root: Some(root.to_path_buf()),
        })
    }

    /// Create an empty store with `type_count` index files in `root`.
    ///
    /// The directory is created if needed; fails if any store file already
    /// exists.
    pub fn create(root: impl AsRef<Path>, type_count: usize) -> Result<Self> {
        let root = root.as_ref();
        if type_count == 0 || type_count > MAX_TYPES {
            return Err(StoreError::InvalidFormat(format!(
                "type count must be 1..={MAX_TYPES}, got {type_count}"
            )));
        }

        std::fs::create_dir_all(root)?;
        for type_id in 0..type_count as u8 {
            FileChannel::create_new(root.join(index_file_name(type_id)))?;
        }
        FileChannel::create_new(root.join(index_file_name(META_TYPE)))?;
        FileChannel::create_new(root.join(DATA_FILE))?;

        info!(
            "Created store at {} with {} types",
            root.display(),
            type_count
        );

        Self::open(root)
    }

    /// Directory the store was opened from
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}

impl FileStore<MemoryChannel> {
    /// Create an empty in-memory store with `type_count` types
    pub fn in_memory(type_count: usize) -> Self {
        Self::from_channels(
            MemoryChannel::new(),
            vec![MemoryChannel::new(); type_count],
            MemoryChannel::new(),
        )
    }
}

impl<C: Channel> FileStore<C> {
    /// Assemble a store from already opened channels
    pub fn from_channels(data: C, indexes: Vec<C>, meta: C) -> Self {
        Self {
            data,
            indexes,
            meta,
            root: None,
        }
    }

    /// Number of regular types
    pub fn type_count(&self) -> usize {
        self.indexes.len()
    }

    /// Number of index records for `type_id`
    pub fn file_count(&self, type_id: u8) -> Result<u32> {
        let len = self.index_channel(type_id)?.len()?;
        Ok((len / INDEX_SIZE as u64) as u32)
    }

    /// The data channel
    pub const fn data_channel(&self) -> &C {
        &self.data
    }

    /// Read file `id` of `type_id`
    pub fn read(&self, type_id: u8, id: u32) -> Result<Vec<u8>> {
        let id = checked_id(id)?;
        let index = self.read_index(type_id, id)?.ok_or_else(|| {
            StoreError::NotFound(format!("file {type_id}/{id} has no index record"))
        })?;

        let size = index.size as usize;
        let mut out = Vec::with_capacity(size);
        let mut sector = index.sector;
        let mut chunk = 0u16;

        while out.len() < size {
            if sector == 0 {
                return Err(StoreError::Corruption(format!(
                    "file {type_id}/{id}: chain ends after {} of {size} bytes",
                    out.len()
                )));
            }

            let slice = self.read_slice(sector)?.ok_or_else(|| {
                StoreError::Corruption(format!(
                    "file {type_id}/{id}: sector {sector} lies outside the data file"
                ))
            })?;

            if !slice.belongs_to(type_id, id, chunk) {
                return Err(StoreError::Corruption(format!(
                    "file {type_id}/{id}: sector {sector} belongs to {}/{} chunk {}, expected chunk {chunk}",
                    slice.type_id, slice.id, slice.chunk
                )));
            }

            let take = (size - out.len()).min(DATA_SIZE);
            out.extend_from_slice(&slice.data[..take]);
            trace!("Read sector {} of {}/{} (chunk {})", sector, type_id, id, chunk);

            sector = slice.next_sector;
            chunk = chunk.wrapping_add(1);
        }

        Ok(out)
    }

    /// Write `data` as file `id` of `type_id`
    pub fn write(&mut self, type_id: u8, id: u32, data: &[u8]) -> Result<()> {
        let id = checked_id(id)?;
        if data.len() > TRI_BYTE_MAX as usize {
            return Err(StoreError::InvalidFormat(format!(
                "file {type_id}/{id} of {} bytes exceeds the {TRI_BYTE_MAX} byte limit",
                data.len()
            )));
        }
        self.index_channel(type_id)?;

        if self.write_chain(type_id, id, data, true)? {
            debug!(
                "Overwrote {}/{} in place ({} bytes)",
                type_id,
                id,
                data.len()
            );
            return Ok(());
        }

        self.write_chain(type_id, id, data, false)?;
        debug!("Appended {}/{} ({} bytes)", type_id, id, data.len());
        Ok(())
    }

    /// Flush every channel
    pub fn flush(&mut self) -> Result<()> {
        self.data.flush()?;
        for index in &mut self.indexes {
            index.flush()?;
        }
        self.meta.flush()?;
        Ok(())
    }

    /// Flush and release all channels
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        info!("Closed store with {} types", self.indexes.len());
        Ok(())
    }

    fn index_channel(&self, type_id: u8) -> Result<&C> {
        if type_id == META_TYPE {
            return Ok(&self.meta);
        }
        self.indexes
            .get(usize::from(type_id))
            .ok_or_else(|| StoreError::NotFound(format!("type {type_id}")))
    }

    fn index_channel_mut(&mut self, type_id: u8) -> Result<&mut C> {
        if type_id == META_TYPE {
            return Ok(&mut self.meta);
        }
        self.indexes
            .get_mut(usize::from(type_id))
            .ok_or_else(|| StoreError::NotFound(format!("type {type_id}")))
    }

    /// Read the index record of `id`, or `None` past the end of the index
    fn read_index(&self, type_id: u8, id: u16) -> Result<Option<FileIndex>> {
        let channel = self.index_channel(type_id)?;
        let mut buf = [0u8; INDEX_SIZE];
        let n = channel.read_at(&mut buf, FileIndex::offset(id))?;
        if n < INDEX_SIZE {
            return Ok(None);
        }
        FileIndex::decode(&buf).map(Some)
    }

    /// Read a sector, or `None` when it is not wholly inside the data channel
    fn read_slice(&self, sector: u32) -> Result<Option<Slice>> {
        let mut buf = [0u8; SLICE_SIZE];
        let n = self
            .data
            .read_at(&mut buf, u64::from(sector) * SLICE_SIZE as u64)?;
        if n < SLICE_SIZE {
            return Ok(None);
        }
        Slice::decode(&buf).map(Some)
    }

    /// Sector a new chain link would be appended at
    fn append_sector(&self) -> Result<u32> {
        let sectors = self.data.len()?.div_ceil(SLICE_SIZE as u64);
        if sectors > u64::from(TRI_BYTE_MAX) {
            return Err(StoreError::InvalidFormat(
                "data file has no addressable sectors left".to_string(),
            ));
        }
        // Sector 0 is never used; a next pointer of 0 ends a chain
        Ok((sectors as u32).max(1))
    }

    /// Write one chain. In overwrite mode the existing chain is followed and
    /// `Ok(false)` is returned as soon as it turns out not to belong to this
    /// file, leaving the caller to retry in append mode.
    fn write_chain(
        &mut self,
        type_id: u8,
        id: u16,
        data: &[u8],
        mut overwrite: bool,
    ) -> Result<bool> {
        let mut next_sector = if overwrite {
            match self.read_index(type_id, id)? {
                Some(index) if index.sector != 0 && self.read_slice(index.sector)?.is_some() => {
                    index.sector
                }
                _ => return Ok(false),
            }
        } else {
            self.append_sector()?
        };

        let index = FileIndex::new(data.len() as u32, next_sector);
        self.index_channel_mut(type_id)?
            .write_at(&index.encode()?, FileIndex::offset(id))?;

        let mut remaining = data;
        let mut chunk = 0u16;
        loop {
            let current = next_sector;
            next_sector = 0;

            if overwrite {
                match self.read_slice(current)? {
                    Some(existing) if existing.belongs_to(type_id, id, chunk) => {
                        let next = existing.next_sector;
                        if next != 0 && self.read_slice(next)?.is_none() {
                            return Ok(false);
                        }
                        next_sector = next;
                    }
                    _ => return Ok(false),
                }
            }

            if next_sector == 0 {
                overwrite = false;
                next_sector = self.append_sector()?;
                if next_sector == current {
                    next_sector += 1;
                }
            }

            let (head, tail) = remaining.split_at(remaining.len().min(DATA_SIZE));
            let last = tail.is_empty();
            if last {
                next_sector = 0;
            }

            let slice = Slice::new(type_id, id, chunk, next_sector, head);
            self.data
                .write_at(&slice.encode()?, u64::from(current) * SLICE_SIZE as u64)?;
            trace!(
                "Wrote sector {} of {}/{} (chunk {}, next {})",
                current, type_id, id, chunk, next_sector
            );

            if last {
                return Ok(true);
            }
            remaining = tail;
            chunk = chunk.wrapping_add(1);
        }
    }
}

pub(crate) fn checked_id(id: u32) -> Result<u16> {
    u16::try_from(id)
        .map_err(|_| StoreError::InvalidFormat(format!("file id {id} exceeds {}", u16::MAX)))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pattern(len: usize, seed: u8) -> Vec<u8> {
        (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
    }

    /// Follow the chain of a file and return its sectors
    fn chain(store: &FileStore<MemoryChannel>, type_id: u8, id: u16) -> Vec<u32> {
        let index = store.read_index(type_id, id).unwrap().unwrap();
        let mut sectors = vec![index.sector];
        let mut slice = store.read_slice(index.sector).unwrap().unwrap();
        while slice.next_sector != 0 {
            sectors.push(slice.next_sector);
            slice = store.read_slice(slice.next_sector).unwrap().unwrap();
        }
        sectors
    }

    #[test]
    fn test_first_write_skips_sector_zero() {
        let mut store = FileStore::in_memory(1);
        store.write(0, 0, b"hello").unwrap();

        assert_eq!(chain(&store, 0, 0), vec![1]);
        assert_eq!(store.data_channel().len().unwrap(), 2 * SLICE_SIZE as u64);
        assert_eq!(store.read(0, 0).unwrap(), b"hello");
    }

    #[test]
    fn test_multi_sector_chain() {
        let mut store = FileStore::in_memory(2);
        let data = pattern(1500, 3);
        store.write(1, 4, &data).unwrap();

        assert_eq!(chain(&store, 1, 4), vec![1, 2, 3]);
        assert_eq!(store.read(1, 4).unwrap(), data);
        assert_eq!(store.file_count(1).unwrap(), 5);
        assert_eq!(store.file_count(0).unwrap(), 0);
    }

    #[test]
    fn test_exact_sector_multiple_ends_chain() {
        let mut store = FileStore::in_memory(1);
        let data = pattern(DATA_SIZE * 2, 1);
        store.write(0, 0, &data).unwrap();

        let sectors = chain(&store, 0, 0);
        assert_eq!(sectors.len(), 2);
        assert_eq!(store.read(0, 0).unwrap(), data);
    }

    #[test]
    fn test_empty_file_occupies_one_sector() {
        let mut store = FileStore::in_memory(1);
        store.write(0, 0, &[]).unwrap();

        assert_eq!(store.read(0, 0).unwrap(), Vec::<u8>::new());
        assert_eq!(chain(&store, 0, 0), vec![1]);
        assert_eq!(store.data_channel().len().unwrap(), 2 * SLICE_SIZE as u64);
    }

    #[test]
    fn test_overwrite_reuses_chain() {
        let mut store = FileStore::in_memory(1);
        store.write(0, 0, &pattern(1200, 1)).unwrap();
        let before = chain(&store, 0, 0);
        let data_len = store.data_channel().len().unwrap();

        let smaller = pattern(700, 2);
        store.write(0, 0, &smaller).unwrap();

        assert_eq!(chain(&store, 0, 0), before[..2].to_vec());
        assert_eq!(store.data_channel().len().unwrap(), data_len);
        assert_eq!(store.read(0, 0).unwrap(), smaller);
    }

    #[test]
    fn test_overwrite_grows_past_chain_end() {
        let mut store = FileStore::in_memory(1);
        store.write(0, 0, &pattern(100, 1)).unwrap();
        store.write(0, 1, &pattern(100, 2)).unwrap();

        let bigger = pattern(2000, 3);
        store.write(0, 0, &bigger).unwrap();

        let sectors = chain(&store, 0, 0);
        assert_eq!(sectors[0], 1);
        assert_eq!(sectors.len(), 4);
        assert!(!sectors.contains(&2));
        assert_eq!(store.read(0, 0).unwrap(), bigger);
        assert_eq!(store.read(0, 1).unwrap(), pattern(100, 2));
    }

    #[test]
    fn test_overwrite_falls_back_when_chain_is_foreign() {
        let mut store = FileStore::in_memory(1);
        store.write(0, 0, &pattern(100, 1)).unwrap();
        store.write(0, 1, &pattern(100, 2)).unwrap();

        // Point file 1's index at file 0's sector
        store
            .index_channel_mut(0)
            .unwrap()
            .write_at(&FileIndex::new(100, 1).encode().unwrap(), FileIndex::offset(1))
            .unwrap();

        store.write(0, 1, &pattern(300, 4)).unwrap();
        assert_eq!(store.read(0, 1).unwrap(), pattern(300, 4));
        assert_eq!(store.read(0, 0).unwrap(), pattern(100, 1));
        assert_eq!(chain(&store, 0, 1), vec![3]);
    }

    #[test]
    fn test_meta_type_is_valid() {
        let mut store = FileStore::in_memory(1);
        store.write(META_TYPE, 0, b"table").unwrap();
        assert_eq!(store.read(META_TYPE, 0).unwrap(), b"table");
        assert_eq!(store.file_count(META_TYPE).unwrap(), 1);
    }

    #[test]
    fn test_invalid_arguments() {
        let mut store = FileStore::in_memory(1);
        assert!(store.read(1, 0).unwrap_err().is_not_found());
        assert!(store.write(1, 0, b"x").unwrap_err().is_not_found());
        assert!(store.file_count(9).unwrap_err().is_not_found());
        assert!(store.read(0, 0).unwrap_err().is_not_found());
        assert!(store.read(0, 70_000).unwrap_err().is_format_error());
        assert!(store.write(0, 70_000, b"x").unwrap_err().is_format_error());

        let huge = vec![0u8; TRI_BYTE_MAX as usize + 1];
        assert!(store.write(0, 0, &huge).unwrap_err().is_format_error());
    }

    #[test]
    fn test_corruption_detected() {
        let mut store = FileStore::in_memory(1);
        store.write(0, 0, &pattern(1000, 1)).unwrap();

        // Rewrite the second sector as belonging to another file
        let intruder = Slice::new(0, 9, 1, 0, &[]);
        store
            .data
            .write_at(&intruder.encode().unwrap(), 2 * SLICE_SIZE as u64)
            .unwrap();
        assert!(store.read(0, 0).unwrap_err().is_corruption());
    }

    #[test]
    fn test_truncated_chain_detected() {
        let mut store = FileStore::in_memory(1);
        store.write(0, 0, &pattern(100, 1)).unwrap();

        // Claim a larger size than the chain holds
        store
            .index_channel_mut(0)
            .unwrap()
            .write_at(&FileIndex::new(1000, 1).encode().unwrap(), 0)
            .unwrap();
        assert!(store.read(0, 0).unwrap_err().is_corruption());

        // Point past the data file
        store
            .index_channel_mut(0)
            .unwrap()
            .write_at(&FileIndex::new(10, 50).encode().unwrap(), 0)
            .unwrap();
        assert!(store.read(0, 0).unwrap_err().is_corruption());
    }

    #[test]
    fn test_create_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("cache");

        let mut store = FileStore::create(&root, 3).unwrap();
        assert_eq!(store.type_count(), 3);
        assert_eq!(store.root(), Some(root.as_path()));
        store.write(2, 1, b"persisted").unwrap();
        store.close().unwrap();

        let store = FileStore::open(&root).unwrap();
        assert_eq!(store.type_count(), 3);
        assert_eq!(store.read(2, 1).unwrap(), b"persisted");

        assert!(FileStore::create(&root, 3).is_err());
    }

    #[test]
    fn test_open_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileStore::open(dir.path()).unwrap_err().is_not_found());

        std::fs::write(dir.path().join(DATA_FILE), []).unwrap();
        assert!(FileStore::open(dir.path()).unwrap_err().is_not_found());

        std::fs::write(dir.path().join(index_file_name(0)), []).unwrap();
        assert!(FileStore::open(dir.path()).unwrap_err().is_not_found());

        std::fs::write(dir.path().join(index_file_name(META_TYPE)), []).unwrap();
        assert_eq!(FileStore::open(dir.path()).unwrap().type_count(), 1);
    }

    #[test]
    fn test_create_rejects_bad_type_count() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileStore::create(dir.path().join("a"), 0).is_err());
        assert!(FileStore::create(dir.path().join("b"), MAX_TYPES + 1).is_err());
    }
}
