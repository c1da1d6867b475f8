//! Loading manifests from disk.

mod common;

use std::io::Write;

use common::{table_names, SHOP};
use tempfile::NamedTempFile;
use tessera_migrate::prelude::*;

#[test]
fn test_load_reads_a_manifest_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(SHOP.as_bytes()).unwrap();

    let manifest = Manifest::load(file.path()).unwrap();
    assert_eq!(manifest.tables(), vec!["orders", "customers", "tags"]);

    let ordered = reorder_models(&manifest.models(), false).unwrap();
    assert_eq!(table_names(&ordered), vec!["customers", "orders", "tags"]);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models.json");

    match Manifest::load(&path) {
        Err(MigrateError::Io { path: failed, .. }) => assert_eq!(failed, path),
        other => panic!("Expected an I/O error, got {other:?}"),
    }
}

#[test]
fn test_malformed_json_is_a_serialization_error() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"{ \"models\": [").unwrap();

    assert!(matches!(
        Manifest::load(file.path()),
        Err(MigrateError::Serialization(_))
    ));
}
