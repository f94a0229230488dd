use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::Error;
use crate::model::record::ChemicalRecord;
use crate::screen::{ClassificationResult, RuleConfig, screen_structure};
use crate::store::{RecordStore, ShardCatalog, StoreOpener};

/// One classified record.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRow {
    pub shard: String,
    pub row_id: i64,
    pub index: usize,
    pub formula: String,
    /// Distinct element symbols, sorted.
    pub elements: Vec<&'static str>,
    pub result: ClassificationResult,
}

impl ScanRow {
    pub fn classify(record: &ChemicalRecord, rule: &RuleConfig) -> Self {
        let (composition, result) = screen_structure(&record.structure, rule);
        Self {
            shard: record.shard.clone(),
            row_id: record.row_id,
            index: record.index,
            formula: composition.empirical_formula(),
            elements: composition.sorted_symbols(),
            result,
        }
    }
}

/// Per-shard counters from a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardScan {
    pub name: String,
    pub path: PathBuf,
    pub records: usize,
    pub hits: usize,
    pub unreadable: usize,
    /// Set when the shard could not be opened or its scan broke off.
    pub failure: Option<String>,
}

impl ShardScan {
    fn new(name: &str, path: &Path) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            records: 0,
            hits: 0,
            unreadable: 0,
            failure: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    /// Sorted by verdict (matches first), then shard name, then row id.
    pub rows: Vec<ScanRow>,
    pub shards: Vec<ShardScan>,
    pub total_rows: usize,
    pub hit_rows: usize,
    pub unreadable: usize,
}

impl ScanReport {
    pub fn shards_scanned(&self) -> usize {
        self.shards.iter().filter(|s| !s.is_failed()).count()
    }

    pub fn failed_shards(&self) -> usize {
        self.shards.iter().filter(|s| s.is_failed()).count()
    }
}

/// Classifies every record of every shard in the catalog.
///
/// Shards that fail to open are skipped and records that fail to decode
/// are counted as unreadable; neither aborts the scan. `on_shard` runs
/// after each shard is finished.
pub fn scan_catalog<O: StoreOpener>(
    catalog: &ShardCatalog,
    opener: &O,
    rule: &RuleConfig,
    mut on_shard: impl FnMut(&ShardScan),
) -> Result<ScanReport, Error> {
    if catalog.is_empty() {
        return Err(Error::NoShardsFound {
            root: catalog.root().to_path_buf(),
            pattern: catalog.pattern().to_string(),
        });
    }

    let mut report = ScanReport::default();

    for (name, path) in catalog.iter() {
        let mut tally = ShardScan::new(name, path);

        match opener.open(path) {
            Ok(store) => scan_shard(&store, name, rule, &mut tally, &mut report.rows),
            Err(e) => {
                warn!(shard = name, error = %e, "skipping shard");
                tally.failure = Some(e.to_string());
            }
        }

        report.total_rows += tally.records;
        report.hit_rows += tally.hits;
        report.unreadable += tally.unreadable;
        on_shard(&tally);
        report.shards.push(tally);
    }

    report.rows.sort_by(|a, b| {
        b.result
            .is_match
            .cmp(&a.result.is_match)
            .then_with(|| a.shard.cmp(&b.shard))
            .then_with(|| a.row_id.cmp(&b.row_id))
    });

    Ok(report)
}

fn scan_shard<S: RecordStore>(
    store: &S,
    name: &str,
    rule: &RuleConfig,
    tally: &mut ShardScan,
    rows: &mut Vec<ScanRow>,
) {
    match store.len() {
        Ok(records) => info!(shard = name, records, "scanning shard"),
        Err(e) => warn!(shard = name, error = %e, "cannot count records"),
    }

    let outcome = store.for_each_record(&mut |stored| match stored.structure {
        Ok(structure) => {
            let record = ChemicalRecord::new(name, stored.row_id, stored.index, structure);
            let row = ScanRow::classify(&record, rule);
            tally.records += 1;
            if row.result.is_match {
                tally.hits += 1;
            }
            rows.push(row);
        }
        Err(e) => {
            warn!(shard = name, row_id = stored.row_id, error = %e, "unreadable record");
            tally.unreadable += 1;
        }
    });

    if let Err(e) = outcome {
        warn!(shard = name, error = %e, "shard scan stopped early");
        tally.failure = Some(e.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::Element::*;
    use crate::store::AseOpener;
    use crate::store::fixtures::{chain, write_lmdb_shard_with_ids, write_shard, write_shard_with_ids};
    use std::fs;
    use tempfile::TempDir;

    fn rule() -> RuleConfig {
        RuleConfig::default()
    }

    #[test]
    fn empty_catalog_is_fatal() {
        let dir = TempDir::new().unwrap();
        let catalog = ShardCatalog::discover(dir.path(), "db_*.db").unwrap();
        let err = scan_catalog(&catalog, &AseOpener, &rule(), |_| {}).unwrap_err();
        assert!(matches!(err, Error::NoShardsFound { .. }));
    }

    #[test]
    fn every_record_becomes_a_row_and_matches_sort_first() {
        let dir = TempDir::new().unwrap();
        write_shard_with_ids(
            &dir.path().join("db_2.db"),
            &[
                (1, chain(&[Ti, Ti, C, O, O])),
                (4, chain(&[Al, Si])),
            ],
        );
        write_shard_with_ids(
            &dir.path().join("db_1.db"),
            &[
                (3, chain(&[Nb, C, O])),
                (7, chain(&[V, V, C, F, F])),
                (2, chain(&[Ti, Ti, C, O, O])),
            ],
        );

        let catalog = ShardCatalog::discover(dir.path(), "db_*.db").unwrap();
        let mut seen = Vec::new();
        let report = scan_catalog(&catalog, &AseOpener, &rule(), |s| {
            seen.push(s.name.clone())
        })
        .unwrap();

        assert_eq!(seen, vec!["db_1.db", "db_2.db"]);
        assert_eq!(report.total_rows, 5);
        assert_eq!(report.rows.len(), report.total_rows);
        assert_eq!(report.hit_rows, 3);
        assert!(report.hit_rows <= report.total_rows);

        let order: Vec<_> = report
            .rows
            .iter()
            .map(|r| (r.result.is_match, r.shard.as_str(), r.row_id))
            .collect();
        assert_eq!(
            order,
            vec![
                (true, "db_1.db", 2),
                (true, "db_1.db", 7),
                (true, "db_2.db", 1),
                (false, "db_1.db", 3),
                (false, "db_2.db", 4),
            ]
        );

        let ti2co2 = &report.rows[0];
        assert_eq!(ti2co2.formula, "CO2Ti2");
        assert_eq!(ti2co2.elements, vec!["C", "O", "Ti"]);
        assert_eq!(ti2co2.result.best_n, Some(1));
    }

    #[test]
    fn unopenable_shards_are_skipped_and_counted() {
        let dir = TempDir::new().unwrap();
        write_shard(&dir.path().join("db_1.db"), &[chain(&[Ti, Ti, C, O])]);
        fs::write(dir.path().join("db_2.db"), b"not a database").unwrap();

        let catalog = ShardCatalog::discover(dir.path(), "db_*.db").unwrap();
        let report = scan_catalog(&catalog, &AseOpener, &rule(), |_| {}).unwrap();

        assert_eq!(report.shards_scanned(), 1);
        assert_eq!(report.failed_shards(), 1);
        assert_eq!(report.total_rows, 1);
        assert!(report.shards[1].failure.is_some());
    }

    #[test]
    fn undecodable_records_are_unreadable_not_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db_1.db");
        write_shard(&path, &[chain(&[Ti, Ti, C, O]), chain(&[Nb, Nb, N, F])]);
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute(
            "UPDATE systems SET positions = x'0000' WHERE id = 2",
            [],
        )
        .unwrap();
        drop(conn);

        let catalog = ShardCatalog::discover(dir.path(), "db_*.db").unwrap();
        let report = scan_catalog(&catalog, &AseOpener, &rule(), |_| {}).unwrap();

        assert_eq!(report.unreadable, 1);
        assert_eq!(report.total_rows, 1);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.shards[0].unreadable, 1);
    }
    #[test]
    fn mistyped_cell_is_unreadable_and_later_records_are_still_scanned() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db_1.db");
        write_shard(
            &path,
            &[
                chain(&[Ti, Ti, C, O]),
                chain(&[Ti, Ti, C, O]),
                chain(&[V, V, C, F]),
                chain(&[Nb, Nb, N, O]),
                chain(&[Al, Si]),
            ],
        );
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute("UPDATE systems SET numbers = 'oops' WHERE id = 2", [])
            .unwrap();

        let catalog = ShardCatalog::discover(dir.path(), "db_*.db").unwrap();
        let report = scan_catalog(&catalog, &AseOpener, &rule(), |_| {}).unwrap();

        assert_eq!(report.total_rows, 4);
        assert_eq!(report.unreadable, 1);
        assert_eq!(report.hit_rows, 3);
        assert!(report.shards[0].failure.is_none());
        let mut ids: Vec<i64> = report.rows.iter().map(|r| r.row_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 3, 4, 5]);
    }

    #[test]
    fn lmdb_and_sqlite_shards_scan_together() {
        let dir = TempDir::new().unwrap();
        let lmdb = dir.path().join("db_1.aselmdb");
        let sqlite = dir.path().join("db_2.db");
        write_lmdb_shard_with_ids(
            &lmdb,
            &[(1, chain(&[Ti, Ti, C, O, O])), (3, chain(&[Al, Si]))],
            &[2],
        );
        write_shard(&sqlite, &[chain(&[V, V, C, F])]);

        let catalog = ShardCatalog::from_paths(dir.path(), "db_*", [lmdb, sqlite]);
        let report = scan_catalog(&catalog, &AseOpener, &rule(), |_| {}).unwrap();

        assert_eq!(report.shards_scanned(), 2);
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.hit_rows, 2);
        let keys: Vec<_> = report
            .rows
            .iter()
            .map(|r| (r.shard.as_str(), r.row_id))
            .collect();
        assert_eq!(keys, vec![("db_1.aselmdb", 1), ("db_2.db", 1), ("db_1.aselmdb", 3)]);
    }
}
