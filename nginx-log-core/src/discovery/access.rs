use crate::discovery::error::FileAccessError;
use std::fs::{self, File, Metadata};
use std::path::{Path, PathBuf};

/// Gatekeeper for opening log files.
///
/// Every open resolves the real path first and checks containment against the
/// canonicalized whitelist roots. An empty whitelist allows any path.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    roots: Vec<Root>,
    max_file_size: u64,
}

#[derive(Debug, Clone)]
struct Root {
    declared: PathBuf,
    canonical: PathBuf,
}

impl AccessPolicy {
    pub fn new(whitelist: &[PathBuf], max_file_size: u64) -> Self {
        let roots = whitelist
            .iter()
            .map(|declared| Root {
                declared: declared.clone(),
                canonical: declared.canonicalize().unwrap_or_else(|_| declared.clone()),
            })
            .collect();

        Self {
            roots,
            max_file_size,
        }
    }

    pub fn allow_all(max_file_size: u64) -> Self {
        Self::new(&[], max_file_size)
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        self.roots.iter().map(|r| r.declared.clone()).collect()
    }

    /// Validate `path` and return its metadata without opening it.
    pub fn check(&self, path: &Path) -> Result<Metadata, FileAccessError> {
        let link_meta = fs::symlink_metadata(path).map_err(|e| FileAccessError::io(path, e))?;
        let target = path
            .canonicalize()
            .map_err(|e| FileAccessError::io(path, e))?;

        if !self.contains(&target) {
            if link_meta.file_type().is_symlink() && self.contains_declared(path) {
                return Err(FileAccessError::SymlinkEscapesWhitelist {
                    path: path.to_path_buf(),
                    target,
                });
            }
            return Err(FileAccessError::NotWhitelisted {
                path: path.to_path_buf(),
            });
        }

        let meta = fs::metadata(&target).map_err(|e| FileAccessError::io(path, e))?;
        if !meta.is_file() {
            return Err(FileAccessError::NotRegularFile {
                path: path.to_path_buf(),
            });
        }

        if meta.len() > self.max_file_size {
            return Err(FileAccessError::FileTooLarge {
                path: path.to_path_buf(),
                size: meta.len(),
                limit: self.max_file_size,
            });
        }

        Ok(meta)
    }

    /// Open a log file read-only after validating it.
    pub fn open(&self, path: &Path) -> Result<(File, Metadata), FileAccessError> {
        let meta = self.check(path)?;
        let file = File::open(path).map_err(|e| FileAccessError::io(path, e))?;
        Ok((file, meta))
    }

    fn contains(&self, canonical: &Path) -> bool {
        self.roots.is_empty() || self.roots.iter().any(|r| canonical.starts_with(&r.canonical))
    }

    fn contains_declared(&self, path: &Path) -> bool {
        self.roots
            .iter()
            .any(|r| path.starts_with(&r.declared) || path.starts_with(&r.canonical))
    }
}
