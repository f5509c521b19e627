use crate::error::ErrorCategory;
use std::io;
use std::path::PathBuf;
use tantivy::TantivyError;
use tantivy::directory::error::OpenDirectoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("index is closed")]
    Closed,

    #[error("index storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot open index directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: OpenDirectoryError,
    },

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("index engine error: {0}")]
    Engine(#[from] TantivyError),
}

impl IndexError {
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            IndexError::InvalidQuery(_) => ErrorCategory::Query,
            _ => ErrorCategory::Group,
        }
    }
}
