use crate::cursor::CursorStore;
use crate::cursor::error::CursorError;
use crate::cursor::types::{CursorStats, LogIndexCursor, cutoff_for, is_older_than};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Cursors kept in memory and mirrored to one JSON file.
///
/// Every mutation rewrites the file through a temporary sibling and an atomic
/// rename, so a crash leaves either the old or the new contents.
pub struct JsonCursorStore {
    path: PathBuf,
    rows: RwLock<BTreeMap<String, LogIndexCursor>>,
}

impl JsonCursorStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CursorError> {
        let path = path.into();
        let rows = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => {
                let cursors: Vec<LogIndexCursor> =
                    serde_json::from_str(&text).map_err(|source| CursorError::Serialization {
                        path: path.clone(),
                        source,
                    })?;
                cursors.into_iter().map(|c| (c.path.clone(), c)).collect()
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(CursorError::io(&path, e)),
        };

        tracing::debug!(path = %path.display(), cursors = rows.len(), "opened cursor store");
        Ok(Self {
            path,
            rows: RwLock::new(rows),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, rows: &BTreeMap<String, LogIndexCursor>) -> Result<(), CursorError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| CursorError::io(dir, e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CursorError::io(dir, e))?;
        let cursors: Vec<&LogIndexCursor> = rows.values().collect();
        serde_json::to_writer_pretty(&mut tmp, &cursors).map_err(|source| {
            CursorError::Serialization {
                path: self.path.clone(),
                source,
            }
        })?;
        tmp.flush().map_err(|e| CursorError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| CursorError::io(&self.path, e.error))?;
        Ok(())
    }

    /// Apply `f` under the write lock and persist the result.
    ///
    /// The in-memory rows change only once the file was written.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, LogIndexCursor>) -> T,
    ) -> Result<T, CursorError> {
        let mut rows = self.rows.write();
        let mut next = rows.clone();
        let out = f(&mut next);
        self.persist(&next)?;
        *rows = next;
        Ok(out)
    }
}

impl CursorStore for JsonCursorStore {
    fn find(&self, path: &str) -> Result<Option<LogIndexCursor>, CursorError> {
        Ok(self.rows.read().get(path).cloned())
    }

    fn save(&self, cursor: &LogIndexCursor) -> Result<(), CursorError> {
        self.mutate(|rows| {
            rows.insert(cursor.path.clone(), cursor.clone());
        })
    }

    fn get_all(&self) -> Result<Vec<LogIndexCursor>, CursorError> {
        Ok(self.rows.read().values().filter(|c| c.enabled).cloned().collect())
    }

    fn delete(&self, path: &str) -> Result<(), CursorError> {
        self.mutate(|rows| {
            rows.remove(path);
        })
    }

    fn delete_all(&self) -> Result<(), CursorError> {
        self.mutate(BTreeMap::clear)
    }

    fn cleanup_old(&self, max_age: Duration) -> Result<usize, CursorError> {
        let cutoff = cutoff_for(max_age);
        self.mutate(|rows| {
            let before = rows.len();
            rows.retain(|_, c| !is_older_than(c, cutoff));
            before - rows.len()
        })
    }

    fn stats(&self) -> Result<CursorStats, CursorError> {
        Ok(CursorStats::from_cursors(self.rows.read().values()))
    }
}
