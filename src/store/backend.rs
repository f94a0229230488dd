use std::path::Path;

use super::{AseLmdbStore, AseSqliteStore, Error, RecordStore, StoreOpener, StoredRecord};
use crate::model::structure::Structure;

/// On-disk layout of a shard, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// ASE LMDB (`.aselmdb`, `.lmdb`).
    Lmdb,
    /// ASE SQLite (`.db` and anything else).
    Sqlite,
}

impl Backend {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "aselmdb" | "lmdb" => Backend::Lmdb,
            _ => Backend::Sqlite,
        }
    }
}

#[derive(Debug)]
pub enum ShardStore {
    Lmdb(AseLmdbStore),
    Sqlite(AseSqliteStore),
}

impl RecordStore for ShardStore {
    fn len(&self) -> Result<usize, Error> {
        match self {
            ShardStore::Lmdb(store) => store.len(),
            ShardStore::Sqlite(store) => store.len(),
        }
    }

    fn for_each_record(&self, visit: &mut dyn FnMut(StoredRecord)) -> Result<(), Error> {
        match self {
            ShardStore::Lmdb(store) => store.for_each_record(visit),
            ShardStore::Sqlite(store) => store.for_each_record(visit),
        }
    }

    fn fetch(&self, index: usize) -> Result<Structure, Error> {
        match self {
            ShardStore::Lmdb(store) => store.fetch(index),
            ShardStore::Sqlite(store) => store.fetch(index),
        }
    }
}

/// Opens `.aselmdb` shards with the LMDB backend and everything else as
/// ASE SQLite.
#[derive(Debug, Clone, Copy, Default)]
pub struct AseOpener;

impl StoreOpener for AseOpener {
    type Store = ShardStore;

    fn open(&self, path: &Path) -> Result<Self::Store, Error> {
        match Backend::from_path(path) {
            Backend::Lmdb => AseLmdbStore::open(path).map(ShardStore::Lmdb),
            Backend::Sqlite => AseSqliteStore::open(path).map(ShardStore::Sqlite),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::Element::*;
    use crate::store::fixtures::{chain, write_lmdb_shard, write_shard};
    use tempfile::TempDir;

    #[test]
    fn backend_follows_the_extension() {
        assert_eq!(Backend::from_path(Path::new("db_1.aselmdb")), Backend::Lmdb);
        assert_eq!(Backend::from_path(Path::new("DB_1.ASELMDB")), Backend::Lmdb);
        assert_eq!(Backend::from_path(Path::new("db_1.lmdb")), Backend::Lmdb);
        assert_eq!(Backend::from_path(Path::new("db_1.db")), Backend::Sqlite);
        assert_eq!(Backend::from_path(Path::new("shard")), Backend::Sqlite);
    }

    #[test]
    fn opener_reads_both_layouts() {
        let dir = TempDir::new().unwrap();
        let lmdb = dir.path().join("db_1.aselmdb");
        let sqlite = dir.path().join("db_2.db");
        write_lmdb_shard(&lmdb, &[chain(&[Ti, Ti, C])]);
        write_shard(&sqlite, &[chain(&[V]), chain(&[Nb, N])]);

        let a = AseOpener.open(&lmdb).unwrap();
        assert!(matches!(a, ShardStore::Lmdb(_)));
        assert_eq!(a.fetch(0).unwrap().site_count(), 3);

        let b = AseOpener.open(&sqlite).unwrap();
        assert!(matches!(b, ShardStore::Sqlite(_)));
        assert_eq!(b.len().unwrap(), 2);
    }

    #[test]
    fn wrong_layout_for_extension_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db_1.aselmdb");
        write_shard(&path, &[chain(&[Ti])]);
        assert!(matches!(
            AseOpener.open(&path),
            Err(Error::ShardOpen { .. })
        ));
    }
}
