use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("record store query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("lmdb shard read failed: {0}")]
    Lmdb(#[from] lmdb::Error),

    #[error("failed to open shard '{}': {detail}", .path.display())]
    ShardOpen { path: PathBuf, detail: String },

    #[error("no record at index {index}")]
    RecordNotFound { index: usize },

    #[error("record {row_id} is corrupt: {detail}")]
    CorruptRecord { row_id: i64, detail: String },

    #[error("record {row_id} has atomic number {number}, which is not a known element")]
    UnknownAtomicNumber { row_id: i64, number: i64 },

    #[error("invalid shard pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl Error {
    pub fn shard_open(path: impl Into<PathBuf>, detail: impl ToString) -> Self {
        Self::ShardOpen {
            path: path.into(),
            detail: detail.to_string(),
        }
    }

    pub fn corrupt(row_id: i64, detail: impl Into<String>) -> Self {
        Self::CorruptRecord {
            row_id,
            detail: detail.into(),
        }
    }

    /// `true` for failures that concern one record rather than the whole shard.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            Error::RecordNotFound { .. }
                | Error::CorruptRecord { .. }
                | Error::UnknownAtomicNumber { .. }
        )
    }
}
