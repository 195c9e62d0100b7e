//! Durable record store for hashledger.
//!
//! This module persists one [`FileRecord`] per distinct content digest in a
//! SQLite table. The table's `UNIQUE` constraint on `digest` is the single
//! authority on uniqueness: an insert for a digest that is already present is
//! rejected with [`StoreError::DuplicateDigest`] and the existing row is kept.
//!
//! # Architecture
//!
//! * [`database`]: SQLite connection, schema creation and inserts.
//! * [`record`]: The row model and its timestamp format.
//!
//! # Lifecycle
//!
//! A run calls [`RecordStore::create`], which discards any store already at
//! the target location before creating an empty one. The file is left on disk
//! as the run's output.

pub mod database;
pub mod record;

pub use database::{RecordStore, StoreError, StoreResult};
pub use record::FileRecord;
