use super::Error;

/// Separators recognised inside a combined identifier, in priority order.
pub const SEPARATORS: [char; 3] = [':', '#', ','];

/// A resolved selection: an optional shard name plus a zero-based index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectionKey {
    pub shard: Option<String>,
    pub index: usize,
}

impl SelectionKey {
    pub fn new(shard: Option<String>, index: usize) -> Self {
        Self { shard, index }
    }
}

/// Splits a combined identifier such as `db_1.db:42` into its halves.
///
/// The first separator from [`SEPARATORS`] that occurs anywhere in the value
/// is used, and the value is split at its last occurrence, so shard names
/// may themselves contain that character (`C:\data\db_1.db:7`).
pub fn split_combined(raw: &str) -> (Option<&str>, &str) {
    let value = raw.trim();
    let Some(sep) = SEPARATORS.into_iter().find(|sep| value.contains(*sep)) else {
        return (None, value);
    };
    match value.rsplit_once(sep) {
        Some((shard, index)) => (non_empty(shard), index.trim()),
        None => (None, value),
    }
}

/// Parses a combined identifier cell from data row `row`.
pub fn parse_combined(raw: &str, one_based: bool, row: usize) -> Result<SelectionKey, Error> {
    let (shard, index) = split_combined(raw);
    let index = parse_index(index, one_based).map_err(|detail| Error::malformed(row, raw, detail))?;
    Ok(SelectionKey::new(shard.map(str::to_string), index))
}

/// Parses a shard cell and an index cell from data row `row`.
pub fn parse_columns(
    shard: &str,
    index: &str,
    one_based: bool,
    row: usize,
) -> Result<SelectionKey, Error> {
    let parsed = parse_index(index.trim(), one_based)
        .map_err(|detail| Error::malformed(row, index, detail))?;
    Ok(SelectionKey::new(non_empty(shard).map(str::to_string), parsed))
}

fn parse_index(raw: &str, one_based: bool) -> Result<usize, String> {
    if raw.is_empty() {
        return Err("missing index".to_string());
    }
    let value: i64 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not an integer index"))?;
    if value < 0 {
        return Err(format!("index {value} is negative"));
    }
    let adjusted = if one_based { value - 1 } else { value };
    if adjusted < 0 {
        return Err(format!("one-based index {value} is below 1"));
    }
    usize::try_from(adjusted).map_err(|_| format!("index {value} is out of range"))
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}
