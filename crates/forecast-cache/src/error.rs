//! Error types for the forecast cache.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed forecast index {}: {source}", path.display())]
    IndexFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid run time '{0}', expected YYYY-MM-DD-HH")]
    InvalidRunTime(String),

    #[error("Invalid station id '{0}', must be a single path component")]
    InvalidStation(String),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}
