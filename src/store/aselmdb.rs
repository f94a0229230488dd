use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use flate2::read::ZlibDecoder;
use lmdb::{Database, Environment, EnvironmentFlags, Transaction};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::decode::assemble;
use super::{Error, RecordStore, StoredRecord};
use crate::model::structure::Structure;

const NEXT_ID_KEY: &str = "nextid";
const DELETED_IDS_KEY: &str = "deleted_ids";

/// Read-only view of one ASE LMDB (`.aselmdb`) shard.
///
/// Records live under their decimal id as zlib-compressed JSON rows with
/// `numbers`, `positions`, `cell` and `pbc`. The live ids are `1..nextid`
/// minus `deleted_ids`, both stored as compressed JSON next to the rows.
pub struct AseLmdbStore {
    env: Environment,
    db: Database,
    ids: Vec<i64>,
}

impl AseLmdbStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let env = Environment::new()
            .set_flags(
                EnvironmentFlags::NO_SUB_DIR
                    | EnvironmentFlags::READ_ONLY
                    | EnvironmentFlags::NO_LOCK,
            )
            .open(path)
            .map_err(|e| Error::shard_open(path, e))?;
        let db = env.open_db(None).map_err(|e| Error::shard_open(path, e))?;
        let ids = read_ids(&env, db).map_err(|detail| Error::shard_open(path, detail))?;

        Ok(Self { env, db, ids })
    }
}

impl fmt::Debug for AseLmdbStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AseLmdbStore")
            .field("records", &self.ids.len())
            .finish()
    }
}

fn read_ids(env: &Environment, db: Database) -> Result<Vec<i64>, String> {
    let txn = env.begin_ro_txn().map_err(|e| e.to_string())?;

    let next_id: i64 = match txn.get(db, &NEXT_ID_KEY) {
        Ok(bytes) => inflate(bytes).map_err(|e| format!("{NEXT_ID_KEY}: {e}"))?,
        Err(lmdb::Error::NotFound) => 1,
        Err(e) => return Err(e.to_string()),
    };
    let deleted: BTreeSet<i64> = match txn.get(db, &DELETED_IDS_KEY) {
        Ok(bytes) => inflate(bytes).map_err(|e| format!("{DELETED_IDS_KEY}: {e}"))?,
        Err(lmdb::Error::NotFound) => BTreeSet::new(),
        Err(e) => return Err(e.to_string()),
    };

    Ok((1..next_id).filter(|id| !deleted.contains(id)).collect())
}

impl RecordStore for AseLmdbStore {
    fn len(&self) -> Result<usize, Error> {
        Ok(self.ids.len())
    }

    fn for_each_record(&self, visit: &mut dyn FnMut(StoredRecord)) -> Result<(), Error> {
        let txn = self.env.begin_ro_txn()?;

        for (index, &row_id) in self.ids.iter().enumerate() {
            let structure = match txn.get(self.db, &row_id.to_string()) {
                Ok(bytes) => decode_row(row_id, bytes),
                Err(lmdb::Error::NotFound) => Err(Error::corrupt(row_id, "listed id has no entry")),
                Err(e) => Err(Error::corrupt(row_id, e.to_string())),
            };
            visit(StoredRecord {
                row_id,
                index,
                structure,
            });
        }

        Ok(())
    }

    fn fetch(&self, index: usize) -> Result<Structure, Error> {
        let &row_id = self.ids.get(index).ok_or(Error::RecordNotFound { index })?;
        let txn = self.env.begin_ro_txn()?;
        match txn.get(self.db, &row_id.to_string()) {
            Ok(bytes) => decode_row(row_id, bytes),
            Err(lmdb::Error::NotFound) => Err(Error::RecordNotFound { index }),
            Err(e) => Err(e.into()),
        }
    }
}

fn inflate<T: DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<T> {
    serde_json::from_reader(ZlibDecoder::new(bytes))
}

fn decode_row(row_id: i64, bytes: &[u8]) -> Result<Structure, Error> {
    let row: Value = inflate(bytes).map_err(|e| Error::corrupt(row_id, e.to_string()))?;

    let numbers = field(row_id, &row, "numbers")?
        .into_iter()
        .map(|z| {
            if z.fract() == 0.0 {
                Ok(z as i64)
            } else {
                Err(Error::corrupt(row_id, format!("atomic number {z} is not an integer")))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    let positions = field(row_id, &row, "positions")?;
    let cell = field(row_id, &row, "cell")?;

    let flags = field(row_id, &row, "pbc")?;
    let pbc = match flags.as_slice() {
        [] => [false; 3],
        &[all] => [all != 0.0; 3],
        &[a, b, c] => [a != 0.0, b != 0.0, c != 0.0],
        other => {
            return Err(Error::corrupt(
                row_id,
                format!("pbc has {} values, expected 3", other.len()),
            ));
        }
    };

    assemble(row_id, &numbers, &positions, &cell, pbc)
}

/// Flattens one array-valued column; a missing or null column is empty.
fn field(row_id: i64, row: &Value, key: &str) -> Result<Vec<f64>, Error> {
    let mut out = Vec::new();
    match row.get(key) {
        None | Some(Value::Null) => {}
        Some(value) => {
            flatten(value, &mut out).map_err(|e| Error::corrupt(row_id, format!("{key}: {e}")))?
        }
    }
    Ok(out)
}

// Accepts nested lists, booleans, and ASE's `{"__ndarray__": [shape, dtype, flat]}`.
fn flatten(value: &Value, out: &mut Vec<f64>) -> Result<(), String> {
    match value {
        Value::Number(n) => out.push(n.as_f64().ok_or_else(|| format!("{n} is out of range"))?),
        Value::Bool(b) => out.push(if *b { 1.0 } else { 0.0 }),
        Value::Array(items) => {
            for item in items {
                flatten(item, out)?;
            }
        }
        Value::Object(map) => match map.get("__ndarray__") {
            Some(Value::Array(parts)) if parts.len() == 3 => flatten(&parts[2], out)?,
            _ => return Err("unexpected object".to_string()),
        },
        Value::String(s) => return Err(format!("unexpected string '{s}'")),
        Value::Null => return Err("unexpected null".to_string()),
    }
    Ok(())
}

/// Writers for `.aselmdb` shard files used across the crate's tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Write;
    use std::path::Path;

    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use lmdb::{Environment, EnvironmentFlags, Transaction, WriteFlags};
    use serde_json::{Value, json};

    use crate::model::structure::Structure;

    pub fn deflate(value: &Value) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&serde_json::to_vec(value).expect("serialize"))
            .expect("compress");
        encoder.finish().expect("finish zlib stream")
    }

    pub fn row_json(s: &Structure) -> Value {
        json!({
            "numbers": s.sites.iter().map(|site| site.element.atomic_number()).collect::<Vec<_>>(),
            "positions": s.sites.iter().map(|site| site.position.to_vec()).collect::<Vec<_>>(),
            "cell": s.cell.iter().map(|row| row.to_vec()).collect::<Vec<_>>(),
            "pbc": s.pbc.to_vec(),
        })
    }

    /// Writes raw `(key, value)` entries into the shard's main database.
    pub fn put_entries(path: &Path, entries: &[(String, Vec<u8>)]) {
        let env = Environment::new()
            .set_flags(EnvironmentFlags::NO_SUB_DIR)
            .set_map_size(1 << 24)
            .open(path)
            .expect("create environment");
        let db = env.open_db(None).expect("main database");
        let mut txn = env.begin_rw_txn().expect("write transaction");
        for (key, value) in entries {
            txn.put(db, key, value, WriteFlags::empty())
                .expect("put entry");
        }
        txn.commit().expect("commit");
    }

    pub fn write_lmdb_shard_with_ids(path: &Path, rows: &[(i64, Structure)], deleted: &[i64]) {
        let mut entries: Vec<(String, Vec<u8>)> = rows
            .iter()
            .map(|(id, s)| (id.to_string(), deflate(&row_json(s))))
            .collect();
        let next_id = rows
            .iter()
            .map(|(id, _)| id + 1)
            .chain(deleted.iter().map(|id| id + 1))
            .max()
            .unwrap_or(1);
        entries.push(("nextid".to_string(), deflate(&json!(next_id))));
        if !deleted.is_empty() {
            entries.push(("deleted_ids".to_string(), deflate(&json!(deleted))));
        }
        put_entries(path, &entries);
    }

    pub fn write_lmdb_shard(path: &Path, structures: &[Structure]) {
        let rows: Vec<(i64, Structure)> = structures
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, s)| (i as i64 + 1, s))
            .collect();
        write_lmdb_shard_with_ids(path, &rows, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{deflate, put_entries, row_json, write_lmdb_shard, write_lmdb_shard_with_ids};
    use super::*;
    use crate::model::types::Element::*;
    use crate::store::fixtures::chain;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn scans_live_ids_in_order_skipping_deleted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db_1.aselmdb");
        write_lmdb_shard_with_ids(
            &path,
            &[
                (1, chain(&[Ti, Ti, C])),
                (3, chain(&[Nb, N])),
                (4, Structure::new()),
            ],
            &[2],
        );

        let store = AseLmdbStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 3);

        let mut seen = Vec::new();
        store
            .for_each_record(&mut |rec| {
                let s = rec.structure.expect("decodes");
                seen.push((rec.row_id, rec.index, s.site_count()));
            })
            .unwrap();

        assert_eq!(seen, vec![(1, 0, 3), (3, 1, 2), (4, 2, 0)]);
    }

    #[test]
    fn fetch_is_zero_based_over_live_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db_1.aselmdb");
        write_lmdb_shard_with_ids(&path, &[(1, chain(&[Ti])), (3, chain(&[V, V]))], &[2]);

        let store = AseLmdbStore::open(&path).unwrap();
        assert_eq!(store.fetch(0).unwrap().sites[0].element, Ti);
        assert_eq!(store.fetch(1).unwrap().site_count(), 2);
        assert!(matches!(
            store.fetch(2),
            Err(Error::RecordNotFound { index: 2 })
        ));
    }

    #[test]
    fn decodes_positions_cell_and_pbc() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db_1.aselmdb");
        let mut s = chain(&[Ti, C]);
        s.sites[1].position = [0.5, -1.25, 3.0];
        s.cell = [[3.0, 0.0, 0.0], [-1.5, 2.6, 0.0], [0.0, 0.0, 20.0]];
        s.pbc = [true, true, false];
        write_lmdb_shard(&path, &[s.clone()]);

        let store = AseLmdbStore::open(&path).unwrap();
        assert_eq!(store.fetch(0).unwrap(), s);
    }

    #[test]
    fn reads_tagged_ndarray_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db_1.aselmdb");
        let row = json!({
            "numbers": {"__ndarray__": [[2], "int64", [22, 6]]},
            "positions": {"__ndarray__": [[2, 3], "float64", [0.0, 0.0, 0.0, 1.0, 1.0, 1.0]]},
            "pbc": {"__ndarray__": [[3], "bool", [true, false, false]]},
        });
        put_entries(
            &path,
            &[
                ("1".to_string(), deflate(&row)),
                ("nextid".to_string(), deflate(&json!(2))),
            ],
        );

        let s = AseLmdbStore::open(&path).unwrap().fetch(0).unwrap();
        assert_eq!(s.site_count(), 2);
        assert_eq!(s.sites[0].element, Ti);
        assert_eq!(s.sites[1].position, [1.0, 1.0, 1.0]);
        assert_eq!(s.pbc, [true, false, false]);
        assert!(!s.has_cell());
    }

    #[test]
    fn bad_payloads_fail_individually() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db_1.aselmdb");
        put_entries(
            &path,
            &[
                ("1".to_string(), deflate(&row_json(&chain(&[Ti, C])))),
                ("2".to_string(), b"not zlib".to_vec()),
                ("3".to_string(), deflate(&json!({"numbers": [0], "positions": [[0, 0, 0]]}))),
                ("5".to_string(), deflate(&row_json(&chain(&[V])))),
                ("nextid".to_string(), deflate(&json!(6))),
            ],
        );

        let store = AseLmdbStore::open(&path).unwrap();
        let mut outcomes = Vec::new();
        store
            .for_each_record(&mut |rec| outcomes.push((rec.row_id, rec.structure)))
            .unwrap();

        assert_eq!(outcomes.len(), 5);
        assert!(outcomes[0].1.is_ok());
        assert!(matches!(outcomes[1].1, Err(Error::CorruptRecord { row_id: 2, .. })));
        assert!(matches!(
            outcomes[2].1,
            Err(Error::UnknownAtomicNumber { row_id: 3, number: 0 })
        ));
        assert!(matches!(outcomes[3].1, Err(Error::CorruptRecord { row_id: 4, .. })));
        assert!(outcomes[4].1.is_ok());
    }

    #[test]
    fn shard_without_nextid_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db_1.aselmdb");
        put_entries(&path, &[("metadata".to_string(), deflate(&json!({})))]);

        let store = AseLmdbStore::open(&path).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn non_lmdb_files_fail_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.aselmdb");
        std::fs::write(&path, vec![7u8; 8192]).unwrap();
        assert!(matches!(
            AseLmdbStore::open(&path),
            Err(Error::ShardOpen { .. })
        ));
        assert!(matches!(
            AseLmdbStore::open(dir.path().join("missing.aselmdb")),
            Err(Error::ShardOpen { .. })
        ));
    }
}
