use crate::cursor::CursorError;
use crate::discovery::{DiscoveryError, FileAccessError};
use crate::error::ErrorCategory;
use crate::index::IndexError;
use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error(transparent)]
    Access(#[from] FileAccessError),

    #[error(
        "{path} is compressed and cannot be indexed incrementally from offset {position}; request a full rebuild"
    )]
    IncrementalOnCompressed { path: String, position: u64 },

    #[error("{path} uses a compression format other than gzip")]
    UnsupportedCompression { path: String },

    #[error("failed to commit index batch for {path}: {source}")]
    BatchCommit {
        path: String,
        #[source]
        source: IndexError,
    },

    #[error("failed reading {path}: {source}")]
    Scan {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("indexing of {path} was cancelled")]
    Cancelled { path: String },

    #[error("index task queue is full")]
    QueueFull,

    #[error("timed out after {0:?} waiting on the index task queue")]
    Timeout(Duration),

    #[error("indexer is shutting down")]
    ShuttingDown,
}

impl IndexerError {
    pub fn scan(path: &str, source: io::Error) -> Self {
        Self::Scan {
            path: path.to_string(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            IndexerError::Access(_)
            | IndexerError::IncrementalOnCompressed { .. }
            | IndexerError::UnsupportedCompression { .. }
            | IndexerError::BatchCommit { .. }
            | IndexerError::Scan { .. }
            | IndexerError::Cursor(_) => ErrorCategory::File,
            IndexerError::Discovery(_)
            | IndexerError::Index(_)
            | IndexerError::Cancelled { .. }
            | IndexerError::QueueFull
            | IndexerError::Timeout(_)
            | IndexerError::ShuttingDown => ErrorCategory::Group,
        }
    }
}
