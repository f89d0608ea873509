use std::path::PathBuf;
use thiserror::Error;

/// Convenience result type for flattening operations.
pub type Result<T> = std::result::Result<T, FlattenError>;

/// Error type shared by discovery, conversion and the batch driver.
#[derive(Debug, Error)]
pub enum FlattenError {
    /// Opening, reading or renaming a dataset file failed.
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading from an in-memory or stdin stream failed.
    #[error("io error: {0}")]
    Stream(#[from] std::io::Error),

    /// A line could not be parsed as JSON.
    #[error("malformed record on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A line parsed, but not to a JSON object.
    #[error("line {line} is not a JSON object")]
    NotAnObject { line: usize },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A caller-supplied header lists the same column twice.
    #[error("duplicate column '{0}' in header schema")]
    DuplicateHeader(String),

    #[error("invalid delimiter token {token:?}: {reason}")]
    InvalidDelimiter { token: String, reason: String },

    /// The same key name is reachable through two different paths.
    #[error("key '{key}' found at both '{first}' and '{second}'")]
    KeyCollision {
        key: String,
        first: String,
        second: String,
    },

    #[error("invalid manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },
}

impl FlattenError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FlattenError::Io {
            path: path.into(),
            source,
        }
    }
}
