use super::Error;

/// Lower-cased header names that identify the shard column.
pub const SHARD_CANDIDATES: [&str; 6] = ["db", "db_file", "file", "aselmdb", "source", "path"];
/// Lower-cased header names that identify the index column.
pub const INDEX_CANDIDATES: [&str; 6] = ["idx", "index", "row", "id", "entry", "image_id"];

/// Column names supplied explicitly by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnOverrides {
    pub id: Option<String>,
    pub shard: Option<String>,
    pub index: Option<String>,
}

/// Where the selection keys live in a table, as zero-based column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSpec {
    CombinedId { column: usize },
    ShardAndIndex { shard: usize, index: usize },
}

/// Decides which columns carry the selection keys.
///
/// An explicit id column wins outright. Otherwise the shard and index
/// columns come from the overrides when given, or from the first header
/// (in table order) whose lower-cased name is a known candidate.
pub fn detect_columns(headers: &[String], overrides: &ColumnOverrides) -> Result<ColumnSpec, Error> {
    if let Some(name) = &overrides.id {
        let column = find_named(headers, name)?;
        return Ok(ColumnSpec::CombinedId { column });
    }

    let shard = match &overrides.shard {
        Some(name) => Some(find_named(headers, name)?),
        None => find_candidate(headers, &SHARD_CANDIDATES),
    };
    let index = match &overrides.index {
        Some(name) => Some(find_named(headers, name)?),
        None => find_candidate(headers, &INDEX_CANDIDATES),
    };

    match (shard, index) {
        (Some(shard), Some(index)) => Ok(ColumnSpec::ShardAndIndex { shard, index }),
        _ => Err(Error::AmbiguousColumns {
            headers: headers.to_vec(),
        }),
    }
}

fn find_named(headers: &[String], name: &str) -> Result<usize, Error> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .or_else(|| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name)))
        .ok_or_else(|| Error::MissingColumn {
            name: name.to_string(),
            headers: headers.to_vec(),
        })
}

fn find_candidate(headers: &[String], candidates: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| candidates.contains(&h.trim().to_lowercase().as_str()))
}
