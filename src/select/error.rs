use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("row {row}: malformed identifier '{value}': {detail}")]
    MalformedIdentifier {
        row: usize,
        value: String,
        detail: String,
    },

    #[error(
        "cannot determine identifier columns from headers [{}]; name them explicitly",
        .headers.join(", ")
    )]
    AmbiguousColumns { headers: Vec<String> },

    #[error("column '{name}' not found (available: {})", .headers.join(", "))]
    MissingColumn { name: String, headers: Vec<String> },

    #[error(
        "{keys} selection key(s) carry no shard name, but {shard_count} shards were discovered"
    )]
    AmbiguousShorthand { keys: usize, shard_count: usize },
}

impl Error {
    pub(crate) fn malformed(row: usize, value: &str, detail: impl Into<String>) -> Self {
        Self::MalformedIdentifier {
            row,
            value: value.to_string(),
            detail: detail.into(),
        }
    }
}
