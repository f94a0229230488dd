use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::columns::{ColumnOverrides, ColumnSpec, detect_columns};
use super::key::{SelectionKey, parse_columns, parse_combined};
use super::Error;
use crate::store::ShardCatalog;

/// Per-shard record indices requested for extraction, iterated in
/// ascending shard name then ascending index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WantedSet {
    shards: BTreeMap<String, BTreeSet<usize>>,
}

impl WantedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the pair was already present.
    pub fn insert(&mut self, shard: impl Into<String>, index: usize) -> bool {
        self.shards.entry(shard.into()).or_default().insert(index)
    }

    pub fn get(&self, shard: &str) -> Option<&BTreeSet<usize>> {
        self.shards.get(shard)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<usize>)> {
        self.shards.iter().map(|(name, indices)| (name.as_str(), indices))
    }

    /// Number of distinct shards referenced.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Number of distinct (shard, index) pairs.
    pub fn total(&self) -> usize {
        self.shards.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }
}

/// Selection keys before the shard catalog is known.
///
/// Keys without a shard name are held apart until [`bind`](Self::bind)
/// can decide whether the single-shard shorthand applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingSelection {
    qualified: WantedSet,
    unqualified: BTreeSet<usize>,
}

impl PendingSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: SelectionKey) {
        match key.shard {
            Some(shard) => {
                self.qualified.insert(shard, key.index);
            }
            None => {
                self.unqualified.insert(key.index);
            }
        }
    }

    pub fn qualified(&self) -> &WantedSet {
        &self.qualified
    }

    pub fn unqualified(&self) -> &BTreeSet<usize> {
        &self.unqualified
    }

    pub fn is_empty(&self) -> bool {
        self.qualified.is_empty() && self.unqualified.is_empty()
    }

    /// Resolves shard-less keys against the catalog.
    ///
    /// They merge into the catalog's only shard; with zero or several
    /// shards any shard-less key is an error.
    pub fn bind(self, catalog: &ShardCatalog) -> Result<WantedSet, Error> {
        let Self {
            mut qualified,
            unqualified,
        } = self;

        if unqualified.is_empty() {
            return Ok(qualified);
        }

        let Some((name, _)) = catalog.sole() else {
            return Err(Error::AmbiguousShorthand {
                keys: unqualified.len(),
                shard_count: catalog.len(),
            });
        };

        debug!(shard = name, keys = unqualified.len(), "binding shard-less keys");
        for index in unqualified {
            qualified.insert(name, index);
        }
        Ok(qualified)
    }
}

impl FromIterator<SelectionKey> for PendingSelection {
    fn from_iter<T: IntoIterator<Item = SelectionKey>>(iter: T) -> Self {
        let mut pending = Self::new();
        for key in iter {
            pending.push(key);
        }
        pending
    }
}

/// Reads every data row of a selection table into a [`PendingSelection`].
///
/// Missing trailing cells read as empty. Row numbers in errors count data
/// rows from 1. The first malformed key aborts resolution.
pub fn resolve<R: AsRef<[String]>>(
    headers: &[String],
    rows: &[R],
    overrides: &ColumnOverrides,
    one_based: bool,
) -> Result<PendingSelection, Error> {
    let layout = detect_columns(headers, overrides)?;
    let mut pending = PendingSelection::new();

    for (i, row) in rows.iter().enumerate() {
        let row = row.as_ref();
        let cell = |column: usize| row.get(column).map(String::as_str).unwrap_or("");
        let key = match layout {
            ColumnSpec::CombinedId { column } => parse_combined(cell(column), one_based, i + 1)?,
            ColumnSpec::ShardAndIndex { shard, index } => {
                parse_columns(cell(shard), cell(index), one_based, i + 1)?
            }
        };
        pending.push(key);
    }

    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn catalog(names: &[&str]) -> ShardCatalog {
        ShardCatalog::from_paths(
            "/data",
            "*.db",
            names.iter().map(|n| PathBuf::from("/data").join(n)),
        )
    }

    #[test]
    fn combined_ids_group_by_shard_and_deduplicate() {
        let headers = strings(&["id"]);
        let rows = vec![
            strings(&["db_2.db:5"]),
            strings(&["db_1.db#3"]),
            strings(&["db_2.db:5"]),
            strings(&["db_2.db,1"]),
        ];
        let overrides = ColumnOverrides {
            id: Some("id".into()),
            ..Default::default()
        };
        let wanted = resolve(&headers, &rows, &overrides, false)
            .unwrap()
            .bind(&catalog(&["db_1.db", "db_2.db"]))
            .unwrap();

        let collected: Vec<_> = wanted
            .iter()
            .map(|(name, idx)| (name.to_string(), idx.iter().copied().collect::<Vec<_>>()))
            .collect();
        assert_eq!(
            collected,
            vec![
                ("db_1.db".to_string(), vec![3]),
                ("db_2.db".to_string(), vec![1, 5]),
            ]
        );
        assert_eq!(wanted.total(), 3);
    }

    #[test]
    fn separate_columns_with_ragged_rows() {
        let headers = strings(&["db_file", "idx", "note"]);
        let rows = vec![strings(&["db_1.db", "4", "x"]), strings(&["db_1.db", "2"])];
        let pending = resolve(&headers, &rows, &ColumnOverrides::default(), true).unwrap();
        let indices: Vec<_> = pending.qualified().get("db_1.db").unwrap().iter().copied().collect();
        assert_eq!(indices, vec![1, 3]);
    }

    #[test]
    fn missing_index_cell_aborts_with_row_number() {
        let headers = strings(&["db_file", "idx"]);
        let rows = vec![strings(&["db_1.db", "0"]), strings(&["db_1.db"])];
        match resolve(&headers, &rows, &ColumnOverrides::default(), false) {
            Err(Error::MalformedIdentifier { row, .. }) => assert_eq!(row, 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn shorthand_merges_into_the_only_shard() {
        let pending: PendingSelection = [
            SelectionKey::new(None, 7),
            SelectionKey::new(Some("db_9.db".into()), 1),
            SelectionKey::new(None, 2),
        ]
        .into_iter()
        .collect();
        let wanted = pending.bind(&catalog(&["db_9.db"])).unwrap();
        let indices: Vec<_> = wanted.get("db_9.db").unwrap().iter().copied().collect();
        assert_eq!(indices, vec![1, 2, 7]);
        assert_eq!(wanted.shard_count(), 1);
    }

    #[test]
    fn shorthand_with_several_shards_is_rejected() {
        let pending: PendingSelection = [SelectionKey::new(None, 0)].into_iter().collect();
        match pending.bind(&catalog(&["db_1.db", "db_2.db"])) {
            Err(Error::AmbiguousShorthand { keys, shard_count }) => {
                assert_eq!(keys, 1);
                assert_eq!(shard_count, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn shorthand_with_no_shards_is_rejected() {
        let pending: PendingSelection = [SelectionKey::new(None, 0)].into_iter().collect();
        assert!(matches!(
            pending.bind(&catalog(&[])),
            Err(Error::AmbiguousShorthand { shard_count: 0, .. })
        ));
    }

    #[test]
    fn qualified_keys_bind_without_a_catalog_match() {
        let pending: PendingSelection =
            [SelectionKey::new(Some("elsewhere.db".into()), 0)].into_iter().collect();
        let wanted = pending.bind(&catalog(&[])).unwrap();
        assert!(wanted.get("elsewhere.db").is_some());
    }
}
