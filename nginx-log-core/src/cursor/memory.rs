use crate::cursor::CursorStore;
use crate::cursor::error::CursorError;
use crate::cursor::types::{CursorStats, LogIndexCursor, cutoff_for, is_older_than};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Default)]
pub struct MemoryCursorStore {
    rows: RwLock<BTreeMap<String, LogIndexCursor>>,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CursorStore for MemoryCursorStore {
    fn find(&self, path: &str) -> Result<Option<LogIndexCursor>, CursorError> {
        Ok(self.rows.read().get(path).cloned())
    }

    fn save(&self, cursor: &LogIndexCursor) -> Result<(), CursorError> {
        self.rows.write().insert(cursor.path.clone(), cursor.clone());
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<LogIndexCursor>, CursorError> {
        Ok(self.rows.read().values().filter(|c| c.enabled).cloned().collect())
    }

    fn delete(&self, path: &str) -> Result<(), CursorError> {
        self.rows.write().remove(path);
        Ok(())
    }

    fn delete_all(&self) -> Result<(), CursorError> {
        self.rows.write().clear();
        Ok(())
    }

    fn cleanup_old(&self, max_age: Duration) -> Result<usize, CursorError> {
        let cutoff = cutoff_for(max_age);
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|_, c| !is_older_than(c, cutoff));
        Ok(before - rows.len())
    }

    fn stats(&self) -> Result<CursorStats, CursorError> {
        Ok(CursorStats::from_cursors(self.rows.read().values()))
    }
}
