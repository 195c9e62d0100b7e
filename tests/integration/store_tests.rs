use hashledger::scanner::Fingerprinter;
use hashledger::store::{RecordStore, StoreError};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_unique_digest_enforced_across_paths() {
    let dir = tempdir().unwrap();
    let store = RecordStore::create(&dir.path().join("image.db")).unwrap();
    let fp = Fingerprinter::default();
    let digest = fp.digest(b"hello");

    let first = store.insert(&digest, Path::new("/a/hello.txt")).unwrap();
    let rejected = store.insert(&digest, Path::new("/b/hello.txt"));

    match rejected {
        Err(StoreError::DuplicateDigest { digest: d, path }) => {
            assert_eq!(d, digest.as_str());
            assert_eq!(path, Path::new("/b/hello.txt"));
        }
        other => panic!("expected DuplicateDigest, got {other:?}"),
    }

    let records = store.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].sequence, first.sequence);
    assert_eq!(records[0].path, "/a/hello.txt");
}

#[test]
fn test_records_persist_after_close() {
    let dir = tempdir().unwrap();
    let location = dir.path().join("image.db");
    let fp = Fingerprinter::default();

    {
        let store = RecordStore::create(&location).unwrap();
        store.insert(&fp.digest(b"one"), Path::new("one")).unwrap();
        store.insert(&fp.digest(b"two"), Path::new("two")).unwrap();
    }

    let store = RecordStore::open(&location).unwrap();
    let paths: Vec<_> = store.records().unwrap().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["one", "two"]);
}

#[test]
fn test_reopened_store_still_rejects_known_digest() {
    let dir = tempdir().unwrap();
    let location = dir.path().join("image.db");
    let digest = Fingerprinter::default().digest(b"persisted");

    {
        let store = RecordStore::create(&location).unwrap();
        store.insert(&digest, Path::new("first")).unwrap();
    }

    let store = RecordStore::open(&location).unwrap();
    let err = store.insert(&digest, Path::new("second")).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateDigest { .. }));
}

#[test]
fn test_create_replaces_foreign_file() {
    let dir = tempdir().unwrap();
    let location = dir.path().join("image.db");
    fs::write(&location, b"this is not a sqlite database").unwrap();

    let store = RecordStore::create(&location).unwrap();
    assert_eq!(store.count().unwrap(), 0);
    assert_eq!(store.location(), location.as_path());
}

#[test]
fn test_create_removes_stale_sidecars() {
    let dir = tempdir().unwrap();
    let location = dir.path().join("image.db");
    let wal = dir.path().join("image.db-wal");
    let journal = dir.path().join("image.db-journal");
    fs::write(&wal, b"stale").unwrap();
    fs::write(&journal, b"stale").unwrap();

    let store = RecordStore::create(&location).unwrap();
    assert_eq!(store.count().unwrap(), 0);
    assert!(!journal.exists());
    if wal.exists() {
        assert_ne!(fs::read(&wal).unwrap(), b"stale");
    }
}

#[test]
fn test_timestamps_are_utc_rfc3339() {
    let store = RecordStore::open_in_memory().unwrap();
    let record = store
        .insert(&Fingerprinter::default().digest(b"t"), Path::new("t"))
        .unwrap();

    assert!(record.observed_at.ends_with('Z'));
    assert!(chrono::DateTime::parse_from_rfc3339(&record.observed_at).is_ok());
}

#[test]
fn test_create_in_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let err = RecordStore::create(&dir.path().join("missing").join("image.db")).unwrap_err();
    assert!(matches!(err, StoreError::Open { .. }));
}
