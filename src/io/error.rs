use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("cannot write '{}': {source}", .path.display())]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("the table has no header row")]
    MissingHeader,

    #[error(
        "cannot infer a structure format from '{}' (expected a .xyz or .extxyz extension)",
        .0.display()
    )]
    UnknownExtension(PathBuf),

    #[error("unknown structure format '{0}' (expected 'xyz' or 'extxyz')")]
    UnknownFormat(String),
}

impl Error {
    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }
}
