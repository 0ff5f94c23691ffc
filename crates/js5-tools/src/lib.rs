//! Maintenance tools for JS5 caches.
//!
//! Each tool is a plain client of [`FileStore`] or [`Cache`](js5_store::Cache):
//!
//! - [`verify`]: check every listed file against its reference table entry
//! - [`defragment`]: copy a cache into a fresh store, file by file
//! - [`aggregate`]: repair damaged files from another copy of the cache
//! - [`dump`]: list the entries of one type's reference table
//!
//! The `js5` binary exposes them on the command line.

#![warn(missing_docs)]

pub mod aggregate;
pub mod cli;
pub mod defrag;
pub mod dump;
pub mod verify;

pub use aggregate::{AggregateStats, aggregate};
pub use defrag::{DefragmentStats, defragment, defragment_into};
pub use dump::{EntrySummary, dump};
pub use verify::{Finding, FindingKind, VerifyReport, verify};

use js5_formats::{Container, ReferenceTable};
use js5_store::{Channel, FileStore, META_TYPE, Result};
use std::ops::Range;

/// Raw meta record and decoded reference table of `type_id`, or `None`
/// when the type has no table
pub(crate) fn load_table<C: Channel>(
    store: &FileStore<C>,
    type_id: u8,
) -> Result<Option<(Vec<u8>, ReferenceTable)>> {
    let raw = match store.read(META_TYPE, u32::from(type_id)) {
        Ok(raw) if !raw.is_empty() => raw,
        Ok(_) => return Ok(None),
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(e),
    };
    let container = Container::parse(&raw)?;
    let table = ReferenceTable::parse(&container.data)?;
    Ok(Some((raw, table)))
}

/// Types that may hold a reference table: those with both an index file
/// and a meta index record
pub(crate) fn table_types<C: Channel>(store: &FileStore<C>) -> Result<Range<u8>> {
    let types = u32::try_from(store.type_count()).unwrap_or(u32::MAX);
    let count = store
        .file_count(META_TYPE)?
        .min(types)
        .min(u32::from(u8::MAX));
    Ok(0..count as u8)
}
