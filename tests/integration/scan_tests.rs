use hashledger::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use hashledger::scanner::{Fingerprinter, ScanError, WalkerConfig};
use hashledger::store::RecordStore;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn digest_set(store: &RecordStore) -> BTreeSet<String> {
    store
        .records()
        .unwrap()
        .into_iter()
        .map(|r| r.digest)
        .collect()
}

#[test]
fn test_empty_directory_creates_empty_store() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let store_path = out.path().join("image.db");

    let summary = DuplicateFinder::default()
        .run(dir.path(), &store_path)
        .unwrap();

    assert_eq!(summary.files_seen, 0);
    assert_eq!(summary.records_written, 0);
    assert!(!summary.has_errors());
    assert!(store_path.exists());

    let store = RecordStore::open(&store_path).unwrap();
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_hello_hello_world() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let store_path = out.path().join("image.db");
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();
    fs::write(dir.path().join("c.txt"), "world").unwrap();

    let summary = DuplicateFinder::default()
        .run(dir.path(), &store_path)
        .unwrap();

    assert_eq!(summary.files_seen, 3);
    assert_eq!(summary.records_written, 2);
    assert_eq!(summary.duplicates.len(), 1);
    assert!(summary.duplicates[0].path.ends_with("b.txt"));
    assert_eq!(summary.rejected_by_store, 1);
    assert!(!summary.has_errors());

    let fp = Fingerprinter::default();
    let store = RecordStore::open(&store_path).unwrap();
    let records = store.records().unwrap();
    assert_eq!(records.len(), 2);

    let hello = records
        .iter()
        .find(|r| r.digest == fp.digest(b"hello").as_str())
        .unwrap();
    assert!(hello.path.ends_with("a.txt"));
    assert!(store.contains(&fp.digest(b"world")).unwrap());
}

#[test]
fn test_nested_directories_are_scanned() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("2023").join("summer");
    fs::create_dir_all(&nested).unwrap();
    fs::write(dir.path().join("top.jpg"), "top").unwrap();
    fs::write(nested.join("beach.jpg"), "beach").unwrap();
    fs::write(nested.join("beach-copy.jpg"), "beach").unwrap();

    let store = RecordStore::open_in_memory().unwrap();
    let summary = DuplicateFinder::default()
        .run_with_store(dir.path(), &store)
        .unwrap();

    assert_eq!(summary.files_seen, 3);
    assert_eq!(store.count().unwrap(), 2);
    // "beach-copy.jpg" sorts before "beach.jpg", so it is recorded first
    assert!(summary.duplicates[0].path.ends_with("beach.jpg"));
}

#[test]
fn test_empty_files_share_one_record() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.empty"), "").unwrap();
    fs::write(dir.path().join("b.empty"), "").unwrap();

    let store = RecordStore::open_in_memory().unwrap();
    let summary = DuplicateFinder::default()
        .run_with_store(dir.path(), &store)
        .unwrap();

    assert_eq!(summary.files_seen, 2);
    assert_eq!(summary.records_written, 1);
    assert_eq!(summary.duplicates.len(), 1);
    assert_eq!(summary.bytes_hashed, 0);
}

#[test]
fn test_binary_files() {
    let dir = tempdir().unwrap();
    let bytes: Vec<u8> = (0..=255u8).collect();
    fs::write(dir.path().join("one.bin"), &bytes).unwrap();
    fs::write(dir.path().join("two.bin"), &bytes[..128]).unwrap();

    let store = RecordStore::open_in_memory().unwrap();
    let summary = DuplicateFinder::default()
        .run_with_store(dir.path(), &store)
        .unwrap();

    assert_eq!(summary.records_written, 2);
    assert_eq!(summary.bytes_hashed, 256 + 128);
}

#[test]
fn test_repeated_runs_are_identical() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    for (name, content) in [("x", "1"), ("y", "2"), ("z", "1")] {
        fs::write(dir.path().join(name), content).unwrap();
        fs::write(sub.join(name), content).unwrap();
    }

    let finder = DuplicateFinder::default();

    let first_path = out.path().join("first.db");
    let first = finder.run(dir.path(), &first_path).unwrap();
    let second_path = out.path().join("second.db");
    let second = finder.run(dir.path(), &second_path).unwrap();

    assert_eq!(first.duplicates, second.duplicates);
    assert_eq!(
        digest_set(&RecordStore::open(&first_path).unwrap()),
        digest_set(&RecordStore::open(&second_path).unwrap())
    );
}

#[test]
fn test_rerun_replaces_previous_store() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let store_path = out.path().join("image.db");
    fs::write(dir.path().join("a.txt"), "first run").unwrap();

    let finder = DuplicateFinder::default();
    finder.run(dir.path(), &store_path).unwrap();

    fs::remove_file(dir.path().join("a.txt")).unwrap();
    fs::write(dir.path().join("b.txt"), "second run").unwrap();
    let summary = finder.run(dir.path(), &store_path).unwrap();

    // Nothing from the first run survives, so b.txt is not rejected
    assert_eq!(summary.records_written, 1);
    let store = RecordStore::open(&store_path).unwrap();
    let records = store.records().unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].path.ends_with("b.txt"));
}

#[test]
fn test_store_inside_root_is_not_recorded() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
    fs::write(dir.path().join("z.txt"), b"omega").unwrap();
    let store_path = dir.path().join("image.db");
    let finder = DuplicateFinder::default();

    let first = finder.run(dir.path(), &store_path).unwrap();
    let first_digests = digest_set(&RecordStore::open(&store_path).unwrap());

    let second = finder.run(dir.path(), &store_path).unwrap();
    let store = RecordStore::open(&store_path).unwrap();
    let second_digests = digest_set(&store);

    assert_eq!(first.files_seen, 2);
    assert_eq!(second.files_seen, 2);
    assert_eq!(first_digests, second_digests);

    let names: Vec<String> = store
        .records()
        .unwrap()
        .into_iter()
        .map(|r| r.path)
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names[0].ends_with("a.txt"));
    assert!(names[1].ends_with("z.txt"));
}

#[test]
fn test_store_in_subdirectory_given_indirectly_is_not_recorded() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("db")).unwrap();
    fs::write(dir.path().join("photo.jpg"), b"pixels").unwrap();
    let store_path = dir.path().join("db").join("..").join("db").join("image.db");

    let summary = DuplicateFinder::default()
        .run(dir.path(), &store_path)
        .unwrap();

    assert_eq!(summary.files_seen, 1);
    assert_eq!(summary.records_written, 1);
}

#[test]
fn test_missing_root_is_fatal_before_store_creation() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let store_path = out.path().join("image.db");

    let err = DuplicateFinder::default()
        .run(&dir.path().join("does-not-exist"), &store_path)
        .unwrap_err();

    assert!(matches!(err, FinderError::Root(ScanError::NotFound(_))));
    assert!(!store_path.exists());
}

#[test]
fn test_missing_root_keeps_previous_store() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let store_path = out.path().join("image.db");
    fs::write(dir.path().join("a.txt"), "keep me").unwrap();

    let finder = DuplicateFinder::default();
    finder.run(dir.path(), &store_path).unwrap();

    assert!(finder
        .run(&dir.path().join("gone"), &store_path)
        .is_err());
    assert_eq!(RecordStore::open(&store_path).unwrap().count().unwrap(), 1);
}

#[test]
fn test_file_root_is_fatal() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    fs::write(&file, "x").unwrap();

    let err = DuplicateFinder::default()
        .run(&file, &dir.path().join("image.db"))
        .unwrap_err();

    assert!(matches!(err, FinderError::Root(ScanError::NotADirectory(_))));
}

#[test]
fn test_unopenable_store_is_fatal() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "x").unwrap();
    let store_path = dir.path().join("no-such-dir").join("image.db");

    let err = DuplicateFinder::default()
        .run(dir.path(), &store_path)
        .unwrap_err();

    assert!(matches!(err, FinderError::Store(_)));
}

#[test]
fn test_skip_hidden_config() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("visible.txt"), "v").unwrap();
    fs::write(dir.path().join(".hidden.txt"), "h").unwrap();

    let config = FinderConfig::default().with_walker(WalkerConfig::new(false, true));
    let store = RecordStore::open_in_memory().unwrap();
    let summary = DuplicateFinder::new(config)
        .run_with_store(dir.path(), &store)
        .unwrap();

    assert_eq!(summary.files_seen, 1);
    let records = store.records().unwrap();
    assert!(records[0].path.ends_with("visible.txt"));
}

/// Make `path` unreadable. Returns false when permissions are not enforced
/// (e.g. running as root), in which case the caller should skip.
#[cfg(unix)]
fn revoke_read(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o000)).unwrap();
    if path.is_dir() {
        fs::read_dir(path).is_err()
    } else {
        fs::File::open(path).is_err()
    }
}

#[cfg(unix)]
fn restore(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_skipped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "one").unwrap();
    fs::write(dir.path().join("b.txt"), "two").unwrap();
    fs::write(dir.path().join("c.txt"), "three").unwrap();
    let locked = dir.path().join("locked.txt");
    fs::write(&locked, "secret").unwrap();

    if !revoke_read(&locked) {
        restore(&locked, 0o644);
        eprintln!("permissions not enforced, skipping");
        return;
    }

    let store = RecordStore::open_in_memory().unwrap();
    let summary = DuplicateFinder::default()
        .run_with_store(dir.path(), &store)
        .unwrap();
    restore(&locked, 0o644);

    assert_eq!(summary.files_seen, 4);
    assert_eq!(summary.read_errors, 1);
    assert_eq!(summary.records_written, 3);
    assert_eq!(store.count().unwrap(), 3);
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_is_skipped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "one").unwrap();
    let sub = dir.path().join("no_access");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("inside.txt"), "two").unwrap();

    if !revoke_read(&sub) {
        restore(&sub, 0o755);
        eprintln!("permissions not enforced, skipping");
        return;
    }

    let store = RecordStore::open_in_memory().unwrap();
    let summary = DuplicateFinder::default()
        .run_with_store(dir.path(), &store)
        .unwrap();
    restore(&sub, 0o755);

    assert_eq!(summary.walk_errors, 1);
    assert_eq!(summary.records_written, 1);
}
