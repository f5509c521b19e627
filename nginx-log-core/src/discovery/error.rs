use crate::error::ErrorCategory;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("glob pattern error: {pattern}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to stat {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DiscoveryError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Group
    }
}

/// Reasons a log file may not be opened. All of them skip the file, never the group.
#[derive(Debug, Error)]
pub enum FileAccessError {
    #[error("access denied: {path}")]
    AccessDenied { path: PathBuf },

    #[error("symlink {path} escapes the whitelist (resolves to {target})")]
    SymlinkEscapesWhitelist { path: PathBuf, target: PathBuf },

    #[error("{path} is not under a whitelisted directory")]
    NotWhitelisted { path: PathBuf },

    #[error("{path} is {size} bytes, above the {limit} byte limit")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("{path} is not a regular file")]
    NotRegularFile { path: PathBuf },

    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileAccessError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::PermissionDenied => Self::AccessDenied { path },
            _ => Self::Io { path, source },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }

    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::File
    }
}
