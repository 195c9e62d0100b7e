//! SQLite-backed record store.

use std::borrow::Cow;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, ErrorCode};

use super::record::{timestamp_now, FileRecord};
use crate::scanner::Digest;

const CREATE_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS image_records (
        sequence    INTEGER PRIMARY KEY AUTOINCREMENT,
        observed_at TEXT NOT NULL,
        digest      TEXT NOT NULL UNIQUE,
        path        TEXT NOT NULL
    )
";

const INSERT_SQL: &str =
    "INSERT INTO image_records (observed_at, digest, path) VALUES (?1, ?2, ?3)";

/// SQLite side files that belong to a database at the same location.
const SIDECAR_SUFFIXES: &[&str] = &["-wal", "-shm", "-journal"];

/// Errors raised by the record store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The database could not be opened or its schema created.
    #[error("Failed to open record store at {path}: {source}")]
    Open {
        /// Store location
        path: PathBuf,
        /// Underlying SQLite error
        #[source]
        source: rusqlite::Error,
    },

    /// A previous store at the location could not be removed.
    #[error("Failed to remove previous record store at {path}: {source}")]
    Reset {
        /// File that could not be removed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The digest is already recorded; the existing row was kept.
    #[error("Digest {digest} already recorded, rejected {path}")]
    DuplicateDigest {
        /// The rejected digest
        digest: String,
        /// Path whose insert was rejected
        path: PathBuf,
    },

    /// The row could not be written.
    #[error("Failed to record {path}: {source}")]
    Write {
        /// Path whose insert failed
        path: PathBuf,
        /// Underlying SQLite error
        #[source]
        source: rusqlite::Error,
    },

    /// A read query failed.
    #[error("Record store query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable table of (sequence, observed_at, digest, path).
pub struct RecordStore {
    conn: Connection,
    location: PathBuf,
    /// Canonical paths of the database file and its side files.
    own_files: Vec<PathBuf>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl RecordStore {
    /// Create a fresh store at `location`, discarding any store already there.
    ///
    /// # Errors
    ///
    /// [`StoreError::Reset`] if an existing file cannot be removed,
    /// [`StoreError::Open`] if the new database cannot be created.
    pub fn create(location: &Path) -> StoreResult<Self> {
        remove_if_exists(location)?;
        for suffix in SIDECAR_SUFFIXES {
            remove_if_exists(&sidecar_path(location, suffix))?;
        }
        Self::open(location)
    }

    /// Open the store at `location`, creating the file and table if absent.
    ///
    /// # Errors
    ///
    /// [`StoreError::Open`] if the database cannot be opened or the schema
    /// cannot be created.
    pub fn open(location: &Path) -> StoreResult<Self> {
        let open_error = |source| StoreError::Open {
            path: location.to_path_buf(),
            source,
        };

        let conn = Connection::open(location).map_err(open_error)?;
        configure_connection(&conn);
        conn.execute_batch(CREATE_TABLE_SQL).map_err(open_error)?;

        log::debug!("Opened record store at {}", location.display());
        Ok(Self {
            conn,
            location: location.to_path_buf(),
            own_files: own_files(location),
        })
    }

    /// Open a store that lives only as long as this value.
    ///
    /// # Errors
    ///
    /// [`StoreError::Open`] if SQLite cannot allocate the database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let location = PathBuf::from(":memory:");
        let open_error = |source| StoreError::Open {
            path: location.clone(),
            source,
        };

        let conn = Connection::open_in_memory().map_err(open_error)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(open_error)?;
        Ok(Self {
            conn,
            location,
            own_files: Vec::new(),
        })
    }

    /// Where this store lives.
    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Whether `path` is this store's database file or one of its side files.
    ///
    /// Always false for an in-memory store.
    #[must_use]
    pub fn is_own_file(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        if !self.own_files.iter().any(|f| f.file_name() == Some(name)) {
            return false;
        }
        canonical_in_parent(path).is_some_and(|p| self.own_files.contains(&p))
    }

    /// Record `digest` for `path`.
    ///
    /// Paths that are not valid UTF-8 are stored with the offending bytes
    /// replaced by U+FFFD.
    ///
    /// `sequence` and `observed_at` are assigned here.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateDigest`] if the digest is already recorded,
    /// [`StoreError::Write`] for any other failure. Both leave the store
    /// unchanged.
    pub fn insert(&self, digest: &Digest, path: &Path) -> StoreResult<FileRecord> {
        let observed_at = timestamp_now();
        let path_text = path.to_string_lossy();
        if matches!(path_text, Cow::Owned(_)) {
            log::debug!("Path is not valid UTF-8, storing lossy form: {}", path_text);
        }

        let result = self
            .conn
            .prepare_cached(INSERT_SQL)
            .and_then(|mut stmt| stmt.execute(params![observed_at, digest.as_str(), path_text]));

        match result {
            Ok(_) => Ok(FileRecord {
                sequence: self.conn.last_insert_rowid(),
                observed_at,
                digest: digest.as_str().to_owned(),
                path: path_text.into_owned(),
            }),
            Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateDigest {
                digest: digest.as_str().to_owned(),
                path: path.to_path_buf(),
            }),
            Err(source) => Err(StoreError::Write {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Whether a record with this digest already exists.
    ///
    /// # Errors
    ///
    /// [`StoreError::Query`] if the lookup fails.
    pub fn contains(&self, digest: &Digest) -> StoreResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM image_records WHERE digest = ?1)",
            params![digest.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// [`StoreError::Query`] if the count fails.
    pub fn count(&self) -> StoreResult<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM image_records", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// All records in insertion order.
    ///
    /// # Errors
    ///
    /// [`StoreError::Query`] if the scan fails.
    pub fn records(&self) -> StoreResult<Vec<FileRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT sequence, observed_at, digest, path FROM image_records ORDER BY sequence ASC",
        )?;
        let rows = stmt.query_map([], FileRecord::from_row)?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

/// Apply pragmas suited to many small sequential inserts.
///
/// Failures are ignored; SQLite's defaults are still correct, just slower.
fn configure_connection(conn: &Connection) {
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
}

fn is_unique_violation(error: &rusqlite::Error) -> bool {
    match error {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}

fn sidecar_path(location: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(location.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Canonical location of the store and every side file it may create.
fn own_files(location: &Path) -> Vec<PathBuf> {
    let Some(main) = canonical_in_parent(location) else {
        log::debug!("Cannot resolve {}; store files will not be excluded", location.display());
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = SIDECAR_SUFFIXES
        .iter()
        .map(|suffix| sidecar_path(&main, suffix))
        .collect();
    files.push(main);
    files
}

/// Resolve the parent directory of `path` and rejoin its file name.
///
/// Works for files that do not exist yet, such as side files.
fn canonical_in_parent(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?;
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    parent.canonicalize().ok().map(|dir| dir.join(name))
}

fn remove_if_exists(path: &Path) -> StoreResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::info!("Removed previous record store file {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StoreError::Reset {
            path: path.to_path_buf(),
            source,
        }),
    }
}
