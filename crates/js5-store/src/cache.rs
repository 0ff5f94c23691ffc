//! Cache facade
//!
//! [`Cache`] wraps a [`FileStore`] and speaks in containers instead of raw
//! bytes. Every write also updates the type's reference table in the meta
//! index: the file's CRC-32, version and (when the table carries them)
//! Whirlpool digest, plus the table's own version.
//!
//! A write stores the updated table first and the file second. The two are
//! independent store writes; an interruption in between leaves a table that
//! describes a file that was never written, which `js5 verify` reports.

use crate::channel::{Channel, FileChannel};
use crate::checksum::{ChecksumEntry, ChecksumTable};
use crate::config::StoreConfig;
use crate::file_store::{FileStore, checked_id};
use crate::{DATA_FILE, META_TYPE, Result, StoreError};
use js5_crypto::crc::strip_trailer;
use js5_crypto::{Digest, XteaKey, crc32, crc32_excluding_trailer};
use js5_formats::{Archive, ChildEntry, CompressionType, Container, ReferenceTable, TableHeader};
use std::path::Path;
use tracing::{debug, info};

/// Container, reference table and archive access over a [`FileStore`]
#[derive(Debug)]
pub struct Cache<C: Channel = FileChannel> {
    store: FileStore<C>,
    archive_compression: CompressionType,
}

impl Cache<FileChannel> {
    /// Open the cache in `root`
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(FileStore::open(root)?))
    }

    /// Open the cache described by `config`, creating it first when it is
    /// missing and `create_if_missing` is set
    pub fn open_with_config(config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let store = if config.create_if_missing && !config.root.join(DATA_FILE).exists() {
            FileStore::create(&config.root, config.type_count)?
        } else {
            FileStore::open(&config.root)?
        };

        Ok(Self::new(store).with_archive_compression(config.archive_compression.into()))
    }
}

impl<C: Channel> Cache<C> {
    /// Wrap a store. New archives are gzip compressed.
    pub fn new(store: FileStore<C>) -> Self {
        Self {
            store,
            archive_compression: CompressionType::Gzip,
        }
    }

    /// Set the compression of archives started by [`write_member`](Self::write_member)
    #[must_use]
    pub const fn with_archive_compression(mut self, compression: CompressionType) -> Self {
        self.archive_compression = compression;
        self
    }

    /// The underlying store
    pub const fn store(&self) -> &FileStore<C> {
        &self.store
    }

    /// The underlying store, mutably
    pub fn store_mut(&mut self) -> &mut FileStore<C> {
        &mut self.store
    }

    /// Release the underlying store
    pub fn into_store(self) -> FileStore<C> {
        self.store
    }

    /// Number of regular types
    pub fn type_count(&self) -> usize {
        self.store.type_count()
    }

    /// Number of index records for `type_id`
    pub fn file_count(&self, type_id: u8) -> Result<u32> {
        self.store.file_count(type_id)
    }

    /// Compute the checksum table over every type's stored reference table.
    ///
    /// Types without a reference table get a zero entry.
    pub fn create_checksum_table(&self) -> Result<ChecksumTable> {
        let mut table = ChecksumTable::new(self.type_count());

        for (type_id, slot) in (0..=u8::MAX).zip(table.entries.iter_mut()) {
            let raw = match self.store.read(META_TYPE, u32::from(type_id)) {
                Ok(raw) => raw,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };
            if raw.is_empty() {
                continue;
            }

            let container = Container::parse(&raw)?;
            let reference = ReferenceTable::parse(&container.data)?;
            *slot = ChecksumEntry::new(crc32(&raw), reference.version(), Digest::from_data(&raw));
        }

        Ok(table)
    }

    /// Decode the reference table of `type_id`
    pub fn reference_table(&self, type_id: u8) -> Result<ReferenceTable> {
        Ok(self.read_table(type_id)?.1)
    }

    /// Store an empty reference table for `type_id`, replacing any present
    pub fn create_reference_table(
        &mut self,
        type_id: u8,
        flags: u8,
        compression: CompressionType,
    ) -> Result<()> {
        if usize::from(type_id) >= self.type_count() {
            return Err(StoreError::NotFound(format!("type {type_id}")));
        }
        let table = ReferenceTable::new(TableHeader::default(), flags);
        self.store_table(type_id, compression, &table)
    }

    /// Read file `file` of `type_id`
    pub fn read(&self, type_id: u8, file: u32) -> Result<Container> {
        if type_id == META_TYPE {
            return Err(StoreError::MetaAccess);
        }
        Ok(Container::parse(&self.store.read(type_id, file)?)?)
    }

    /// Read an enciphered file
    pub fn read_with_key(&self, type_id: u8, file: u32, key: &XteaKey) -> Result<Container> {
        if type_id == META_TYPE {
            return Err(StoreError::MetaAccess);
        }
        Ok(Container::parse_with_key(
            &self.store.read(type_id, file)?,
            key,
        )?)
    }

    /// Write `container` as file `file` of `type_id`.
    ///
    /// Bumps the container's version, records its checksum and version in
    /// the reference table, stores the table and then the file.
    pub fn write(&mut self, type_id: u8, file: u32, container: &mut Container) -> Result<()> {
        if type_id == META_TYPE {
            return Err(StoreError::MetaAccess);
        }
        checked_id(file)?;

        let version = container.bump_version();
        let (table_compression, mut table) = self.read_table(type_id)?;

        let encoded = container.build()?;
        let whirlpool = table.has_whirlpool();
        let entry = table.entry_or_default(file);
        entry.version = u32::from(version);
        entry.crc = crc32_excluding_trailer(&encoded);
        if whirlpool {
            entry.digest = Digest::from_data(strip_trailer(&encoded));
        }

        let table_version = table.version().wrapping_add(1);
        table.set_version(table_version);
        debug!(
            "Updated table {} to version {} for file {} (version {})",
            type_id, table_version, file, version
        );

        self.store_table(type_id, table_compression, &table)?;
        self.store.write(type_id, file, &encoded)
    }

    /// Read member `member` of archive file `file`
    pub fn read_member(&self, type_id: u8, file: u32, member: u32) -> Result<Vec<u8>> {
        let container = self.read(type_id, file)?;
        let table = self.reference_table(type_id)?;

        let entry = table
            .entry(file)
            .filter(|entry| member < entry.capacity())
            .ok_or_else(|| {
                StoreError::NotFound(format!("member {member} of file {type_id}/{file}"))
            })?;
        let slot = entry.slot(member).ok_or_else(|| {
            StoreError::NotFound(format!(
                "member {member} of file {type_id}/{file} has no entry"
            ))
        })?;

        Archive::decode(&container.data, entry.len())?
            .into_members()
            .into_iter()
            .nth(slot)
            .ok_or_else(|| {
                StoreError::NotFound(format!("member {member} of file {type_id}/{file}"))
            })
    }

    /// Write member `member` of archive file `file`.
    ///
    /// The archive is loaded if the file and its entry exist, otherwise a
    /// new one is started. Slots that gain no data are filled with a 1-byte
    /// placeholder and an unnamed child entry.
    pub fn write_member(&mut self, type_id: u8, file: u32, member: u32, data: &[u8]) -> Result<()> {
        if type_id == META_TYPE {
            return Err(StoreError::MetaAccess);
        }
        checked_id(file)?;
        if member >= u32::from(u16::MAX) {
            return Err(StoreError::InvalidFormat(format!(
                "member id {member} exceeds {}",
                u16::MAX - 1
            )));
        }

        let (table_compression, mut table) = self.read_table(type_id)?;
        let old_capacity = table.entry(file).map(|entry| entry.capacity());

        let entry = table.entry_or_default(file);
        if entry.child(member).is_none() {
            entry.put_child(member, ChildEntry::default());
        }

        let (mut archive, compression, version) = match old_capacity {
            Some(capacity) if file < self.file_count(type_id)? => {
                let container = self.read(type_id, file)?;
                let archive = Archive::decode(&container.data, capacity as usize)?;
                (archive, container.compression, container.version)
            }
            _ => (Archive::new(0), self.archive_compression, Some(1)),
        };

        let member_index = member as usize;
        let filled = archive.len();
        archive.grow(member_index + 1);
        archive.put_member(member_index, data.to_vec())?;

        for id in filled..archive.len() {
            if id != member_index {
                archive.put_member(id, vec![0])?;
                entry.put_child(id as u32, ChildEntry::default());
            }
        }
        debug!(
            "Wrote member {} of {}/{} ({} slots)",
            member,
            type_id,
            file,
            archive.len()
        );

        self.store_table(type_id, table_compression, &table)?;

        let mut container = Container {
            compression,
            data: archive.encode()?,
            version,
        };
        self.write(type_id, file, &mut container)
    }

    /// Flush and release the store
    pub fn close(self) -> Result<()> {
        info!("Closing cache");
        self.store.close()
    }

    fn read_table(&self, type_id: u8) -> Result<(CompressionType, ReferenceTable)> {
        let container = Container::parse(&self.store.read(META_TYPE, u32::from(type_id))?)?;
        let table = ReferenceTable::parse(&container.data)?;
        Ok((container.compression, table))
    }

    fn store_table(
        &mut self,
        type_id: u8,
        compression: CompressionType,
        table: &ReferenceTable,
    ) -> Result<()> {
        let container = Container::new(compression, table.build()?);
        self.store
            .write(META_TYPE, u32::from(type_id), &container.build()?)
    }
}
