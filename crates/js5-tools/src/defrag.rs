//! Defragmentation
//!
//! Rewrites a cache into a fresh store. Files are copied one after another,
//! so every chain in the new data file is contiguous and overwritten
//! sectors left behind by earlier writes are dropped.

use crate::{load_table, table_types};
use js5_store::{Channel, FileStore, META_TYPE, Result};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Totals of a defragmentation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DefragmentStats {
    /// Reference tables copied
    pub tables: usize,
    /// Files copied
    pub files: usize,
    /// Bytes copied, tables included
    pub bytes: u64,
}

/// Copy `source` into a new store created at `destination_root`
pub fn defragment<C: Channel>(
    source: &FileStore<C>,
    destination_root: impl AsRef<Path>,
) -> Result<DefragmentStats> {
    let mut destination = FileStore::create(destination_root, source.type_count())?;
    let stats = defragment_into(source, &mut destination)?;
    destination.close()?;
    Ok(stats)
}

/// Copy every reference table of `source`, and every file those tables
/// list, into `destination`
pub fn defragment_into<C: Channel, D: Channel>(
    source: &FileStore<C>,
    destination: &mut FileStore<D>,
) -> Result<DefragmentStats> {
    let mut stats = DefragmentStats::default();

    for type_id in table_types(source)? {
        let Some((raw, table)) = load_table(source, type_id)? else {
            continue;
        };
        destination.write(META_TYPE, u32::from(type_id), &raw)?;
        stats.tables += 1;
        stats.bytes += raw.len() as u64;

        for file in table.entries().ids() {
            let data = source.read(type_id, *file)?;
            destination.write(type_id, *file, &data)?;
            stats.files += 1;
            stats.bytes += data.len() as u64;
        }
        debug!("Copied type {} ({} entries)", type_id, table.len());
    }

    info!(
        "Defragmented {} tables and {} files ({} bytes)",
        stats.tables, stats.files, stats.bytes
    );
    Ok(stats)
}
