use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no shards match '{pattern}' under '{}'", .root.display())]
    NoShardsFound { root: PathBuf, pattern: String },

    #[error(transparent)]
    Store(#[from] crate::store::Error),

    #[error(transparent)]
    Output(#[from] crate::io::error::Error),
}
