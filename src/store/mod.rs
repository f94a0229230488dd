//! Shard discovery and record-store access.
//!
//! The pipeline only needs three things from a shard: open it by path,
//! visit every record in row order, and fetch one record by zero-based
//! index. [`RecordStore`] and [`StoreOpener`] are that seam.
//!
//! Two ASE layouts sit behind it: [`AseLmdbStore`] for `.aselmdb` files and
//! [`AseSqliteStore`] for SQLite `.db` files. [`AseOpener`] picks one by
//! extension.

mod aselmdb;
mod backend;
mod catalog;
mod decode;
mod error;
mod sqlite;

pub use aselmdb::AseLmdbStore;
pub use backend::{AseOpener, Backend, ShardStore};
pub use catalog::ShardCatalog;
pub use error::Error;
pub use sqlite::AseSqliteStore;


use std::path::Path;

use crate::model::structure::Structure;

/// One record as yielded by a full-shard scan.
///
/// The structure is decoded per record so that a single bad row does not
/// abort the scan.
#[derive(Debug)]
pub struct StoredRecord {
    pub row_id: i64,
    pub index: usize,
    pub structure: Result<Structure, Error>,
}

pub trait RecordStore {
    /// Number of records in the shard.
    fn len(&self) -> Result<usize, Error>;

    fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len()? == 0)
    }

    /// Visits every record in ascending row order.
    fn for_each_record(&self, visit: &mut dyn FnMut(StoredRecord)) -> Result<(), Error>;

    /// Fetches the record at a zero-based position in row order.
    fn fetch(&self, index: usize) -> Result<Structure, Error>;
}

pub trait StoreOpener {
    type Store: RecordStore;

    fn open(&self, path: &Path) -> Result<Self::Store, Error>;
}
