//! Repair from a second copy
//!
//! Files that fail verification are replaced with the other cache's copy,
//! but only when the other table describes the very same file: same version
//! and same CRC.

use crate::verify::check_file;
use crate::{load_table, table_types};
use js5_store::{Channel, FileStore, Result};
use serde::Serialize;
use tracing::{debug, info};

/// Totals of an aggregation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    /// Files listed in the tables
    pub checked: usize,
    /// Files that failed verification
    pub damaged: usize,
    /// Damaged files replaced from the other cache
    pub repaired: usize,
}

/// Replace damaged files of `store` with intact copies from `other`
pub fn aggregate<C: Channel, D: Channel>(
    store: &mut FileStore<C>,
    other: &FileStore<D>,
) -> Result<AggregateStats> {
    let mut stats = AggregateStats::default();

    for type_id in table_types(store)? {
        let Some((_, table)) = load_table(store, type_id)? else {
            continue;
        };
        let Some((_, other_table)) = load_table(other, type_id)? else {
            debug!("Type {} has no table in the other cache", type_id);
            continue;
        };

        for (file, entry) in table.entries().iter() {
            stats.checked += 1;
            let damaged = match store.read(type_id, file) {
                Ok(stored) => !check_file(&stored, entry.crc, entry.version).is_empty(),
                Err(_) => true,
            };
            if !damaged {
                continue;
            }
            stats.damaged += 1;

            let same = other_table
                .entry(file)
                .is_some_and(|o| o.version == entry.version && o.crc == entry.crc);
            if !same {
                continue;
            }

            match other.read(type_id, file) {
                Ok(data) => {
                    store.write(type_id, file, &data)?;
                    stats.repaired += 1;
                    debug!("Repaired {}:{}", type_id, file);
                }
                Err(e) => debug!("Other copy of {}:{} unreadable: {}", type_id, file, e),
            }
        }
    }

    info!(
        "Checked {} files, {} damaged, {} repaired",
        stats.checked, stats.damaged, stats.repaired
    );
    Ok(stats)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::verify;
    use js5_formats::{CompressionType, Container};
    use js5_store::{Cache, MemoryChannel};
    use pretty_assertions::assert_eq;

    fn populated() -> Cache<MemoryChannel> {
        let mut cache = Cache::new(FileStore::in_memory(1));
        cache
            .create_reference_table(0, 0, CompressionType::None)
            .unwrap();
        for file in 0..3 {
            cache
                .write(0, file, &mut Container::new(CompressionType::Gzip, vec![file as u8; 50]))
                .unwrap();
        }
        cache
    }

    #[test]
    fn test_repairs_damaged_files() {
        let other = populated().into_store();
        let mut store = populated().into_store();
        store.write(0, 1, &[1, 2]).unwrap();
        assert!(!verify(&store).unwrap().is_clean());

        let stats = aggregate(&mut store, &other).unwrap();
        assert_eq!(
            stats,
            AggregateStats {
                checked: 3,
                damaged: 1,
                repaired: 1
            }
        );
        assert!(verify(&store).unwrap().is_clean());
    }

    #[test]
    fn test_skips_mismatched_versions() {
        let mut newer = populated();
        newer
            .write(0, 1, &mut Container::new(CompressionType::Gzip, vec![9; 50]))
            .unwrap();
        let other = newer.into_store();

        let mut store = populated().into_store();
        store.write(0, 1, &[]).unwrap();

        let stats = aggregate(&mut store, &other).unwrap();
        assert_eq!(stats.damaged, 1);
        assert_eq!(stats.repaired, 0);
    }
}
