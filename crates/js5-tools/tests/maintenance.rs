#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests running the maintenance tools over on-disk caches

use js5_formats::{CompressionType, Container};
use js5_store::{Cache, FileStore, StoreConfig};
use js5_tools::{FindingKind, aggregate, defragment, dump, verify};
use std::path::Path;

fn create_cache(root: &Path, types: usize) -> Cache {
    let config = StoreConfig::new(root)
        .with_type_count(types)
        .with_create_if_missing(true);
    let mut cache = Cache::open_with_config(&config).unwrap();
    for type_id in 0..types as u8 {
        cache
            .create_reference_table(type_id, 0, CompressionType::Gzip)
            .unwrap();
    }
    cache
}

#[test]
fn growing_file_verifies_clean() {
    let dir = tempfile::tempdir().unwrap();
    let mut cache = create_cache(dir.path(), 1);

    cache
        .write(0, 0, &mut Container::new(CompressionType::None, vec![1; 100]))
        .unwrap();
    cache
        .write(0, 0, &mut Container::new(CompressionType::None, vec![2; 2000]))
        .unwrap();
    cache.close().unwrap();

    let store = FileStore::open(dir.path()).unwrap();
    let report = verify(&store).unwrap();
    assert!(report.is_clean(), "{:?}", report.findings);
    assert_eq!(report.files, 1);
}

#[test]
fn defragmented_copy_matches_source() {
    let dir = tempfile::tempdir().unwrap();
    let source_root = dir.path().join("source");
    let copy_root = dir.path().join("copy");

    let mut cache = create_cache(&source_root, 2);
    for file in 0..4 {
        cache.write_member(1, file, 0, &vec![file as u8; 700]).unwrap();
        cache.write_member(1, file, 3, b"tail").unwrap();
    }
    cache.close().unwrap();

    let source = FileStore::open(&source_root).unwrap();
    let stats = defragment(&source, &copy_root).unwrap();
    assert_eq!(stats.tables, 2);
    assert_eq!(stats.files, 4);

    let copy = Cache::open(&copy_root).unwrap();
    assert!(verify(copy.store()).unwrap().is_clean());
    for file in 0..4 {
        assert_eq!(copy.read_member(1, file, 0).unwrap(), vec![file as u8; 700]);
        assert_eq!(copy.read_member(1, file, 3).unwrap(), b"tail");
    }
    assert_eq!(dump(&copy, 1).unwrap().len(), 4);
}

#[test]
fn aggregate_repairs_from_backup() {
    let dir = tempfile::tempdir().unwrap();
    let live_root = dir.path().join("live");

    let mut cache = create_cache(&live_root, 1);
    for file in 0..3 {
        cache
            .write(0, file, &mut Container::new(CompressionType::Gzip, vec![5; 900]))
            .unwrap();
    }
    cache.close().unwrap();

    let mut live = FileStore::open(&live_root).unwrap();
    defragment(&live, dir.path().join("backup")).unwrap();
    live.write(0, 2, b"garbage").unwrap();

    let report = verify(&live).unwrap();
    assert_eq!(report.findings.len(), 2);
    assert!(matches!(report.findings[0].kind, FindingKind::Corrupt { .. }));

    let backup = FileStore::open(dir.path().join("backup")).unwrap();
    let stats = aggregate(&mut live, &backup).unwrap();
    assert_eq!(stats.repaired, 1);
    assert!(verify(&live).unwrap().is_clean());
}
