use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use super::decode::assemble;
use super::{Error, RecordStore, StoredRecord};
use crate::model::structure::Structure;

const IDS_SQL: &str = "SELECT id FROM systems ORDER BY id";
const SCAN_SQL: &str = "SELECT id, numbers, positions, cell, pbc FROM systems ORDER BY id";
const FETCH_SQL: &str = "SELECT id, numbers, positions, cell, pbc FROM systems WHERE id = ?1";

/// Read-only view of one ASE SQLite database file.
///
/// Only the `systems` columns needed to rebuild a structure are read:
/// `numbers` (int32), `positions` (float64, n × 3), `cell` (float64, 3 × 3)
/// and the `pbc` bitmask, all little-endian as ASE writes them.
///
/// The ordered row ids are read once at open, so a fetch by position is a
/// primary-key lookup.
#[derive(Debug)]
pub struct AseSqliteStore {
    conn: Connection,
    ids: Vec<i64>,
}

impl AseSqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn =
            Connection::open_with_flags(path, flags).map_err(|e| Error::shard_open(path, e))?;

        // SQLite opens lazily; reading the ids makes a non-database file fail here.
        let ids = read_ids(&conn).map_err(|e| Error::shard_open(path, e))?;

        Ok(Self { conn, ids })
    }
}

fn read_ids(conn: &Connection) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare(IDS_SQL)?;
    let ids = stmt.query_map([], |row| row.get(0))?;
    ids.collect()
}

impl RecordStore for AseSqliteStore {
    fn len(&self) -> Result<usize, Error> {
        Ok(self.ids.len())
    }

    fn for_each_record(&self, visit: &mut dyn FnMut(StoredRecord)) -> Result<(), Error> {
        let mut stmt = self.conn.prepare(SCAN_SQL)?;
        let mut rows = stmt.query([])?;
        let mut index = 0usize;

        while let Some(row) = rows.next()? {
            let (row_id, structure) = match RawRow::from_row(row) {
                Ok(raw) => (raw.id, raw.decode()),
                Err(e) => {
                    let row_id = row.get::<_, i64>(0).unwrap_or_default();
                    (row_id, Err(Error::corrupt(row_id, e.to_string())))
                }
            };
            visit(StoredRecord {
                row_id,
                index,
                structure,
            });
            index += 1;
        }

        Ok(())
    }

    fn fetch(&self, index: usize) -> Result<Structure, Error> {
        let &row_id = self.ids.get(index).ok_or(Error::RecordNotFound { index })?;
        let raw = self
            .conn
            .query_row(FETCH_SQL, params![row_id], |row| Ok(RawRow::from_row(row)))
            .optional()?
            .ok_or(Error::RecordNotFound { index })?
            .map_err(|e| Error::corrupt(row_id, e.to_string()))?;
        raw.decode()
    }
}

struct RawRow {
    id: i64,
    numbers: Option<Vec<u8>>,
    positions: Option<Vec<u8>>,
    cell: Option<Vec<u8>>,
    pbc: Option<i64>,
}

impl RawRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            numbers: row.get(1)?,
            positions: row.get(2)?,
            cell: row.get(3)?,
            pbc: row.get(4)?,
        })
    }

    fn decode(self) -> Result<Structure, Error> {
        let id = self.id;
        let numbers: Vec<i64> = decode_i32(id, "numbers", self.numbers.as_deref().unwrap_or_default())?
            .into_iter()
            .map(i64::from)
            .collect();
        let positions = decode_f64(id, "positions", self.positions.as_deref().unwrap_or_default())?;
        let cell = decode_f64(id, "cell", self.cell.as_deref().unwrap_or_default())?;

        let mask = self.pbc.unwrap_or(0);
        let pbc = [mask & 1 != 0, mask & 2 != 0, mask & 4 != 0];

        assemble(id, &numbers, &positions, &cell, pbc)
    }
}

fn decode_i32(row_id: i64, column: &str, bytes: &[u8]) -> Result<Vec<i32>, Error> {
    if bytes.len() % 4 != 0 {
        return Err(Error::corrupt(
            row_id,
            format!("{column} blob length {} is not a multiple of 4", bytes.len()),
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn decode_f64(row_id: i64, column: &str, bytes: &[u8]) -> Result<Vec<f64>, Error> {
    if bytes.len() % 8 != 0 {
        return Err(Error::corrupt(
            row_id,
            format!("{column} blob length {} is not a multiple of 8", bytes.len()),
        ));
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|b| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(b);
            f64::from_le_bytes(buf)
        })
        .collect())
}

/// Builders for ASE-layout shard files used across the crate's tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::Path;

    use rusqlite::{Connection, params};

    use crate::model::structure::Structure;
    use crate::model::types::Element;

    pub fn write_shard(path: &Path, structures: &[Structure]) {
        let rows: Vec<(i64, Structure)> = structures
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, s)| (i as i64 + 1, s))
            .collect();
        write_shard_with_ids(path, &rows);
    }

    pub fn write_shard_with_ids(path: &Path, rows: &[(i64, Structure)]) {
        let conn = Connection::open(path).expect("create shard");
        conn.execute_batch(
            "CREATE TABLE systems (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                unique_id TEXT,
                numbers BLOB,
                positions BLOB,
                cell BLOB,
                pbc INTEGER
            )",
        )
        .expect("create table");

        for (id, s) in rows {
            let numbers: Vec<u8> = s
                .sites
                .iter()
                .flat_map(|site| i32::from(site.element.atomic_number()).to_le_bytes())
                .collect();
            let positions: Vec<u8> = s
                .sites
                .iter()
                .flat_map(|site| site.position)
                .flat_map(f64::to_le_bytes)
                .collect();
            let cell: Vec<u8> = s.cell.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
            let pbc = s
                .pbc
                .iter()
                .enumerate()
                .filter(|&(_, &p)| p)
                .map(|(i, _)| 1i64 << i)
                .sum::<i64>();
            conn.execute(
                "INSERT INTO systems (id, unique_id, numbers, positions, cell, pbc)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, format!("uid-{id}"), numbers, positions, cell, pbc],
            )
            .expect("insert row");
        }
    }

    /// A line of sites with unit spacing along x.
    pub fn chain(elements: &[Element]) -> Structure {
        Structure::from_sites(
            elements
                .iter()
                .enumerate()
                .map(|(i, &e)| (e, [i as f64, 0.0, 0.0])),
        )
    }
}
