use crate::discovery::main_log_path;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogIndexCursor {
    pub path: String,
    pub main_log_path: String,
    pub enabled: bool,
    /// Group size in bytes at the last scan.
    pub last_size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    /// Byte offset indexing resumes from.
    pub last_position: u64,
    pub document_count: u64,
    pub time_range_start: Option<i64>,
    pub time_range_end: Option<i64>,
    pub last_indexed_at: Option<DateTime<Utc>>,
    pub last_index_started_at: Option<DateTime<Utc>>,
    pub last_index_duration_ms: u64,
}

impl LogIndexCursor {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            main_log_path: main_log_path(path),
            enabled: true,
            last_size: 0,
            last_modified: None,
            last_position: 0,
            document_count: 0,
            time_range_start: None,
            time_range_end: None,
            last_indexed_at: None,
            last_index_started_at: None,
            last_index_duration_ms: 0,
        }
    }

    pub fn expand_time_range(&mut self, min: i64, max: i64) {
        self.time_range_start = Some(self.time_range_start.map_or(min, |s| s.min(min)));
        self.time_range_end = Some(self.time_range_end.map_or(max, |e| e.max(max)));
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CursorStats {
    pub total_files: usize,
    pub enabled_files: usize,
    pub total_documents: u64,
}

impl CursorStats {
    pub(crate) fn from_cursors<'a>(cursors: impl Iterator<Item = &'a LogIndexCursor>) -> Self {
        cursors.fold(Self::default(), |mut stats, c| {
            stats.total_files += 1;
            if c.enabled {
                stats.enabled_files += 1;
            }
            stats.total_documents += c.document_count;
            stats
        })
    }
}

/// True when the cursor has not been indexed since `cutoff`.
pub(crate) fn is_older_than(cursor: &LogIndexCursor, cutoff: DateTime<Utc>) -> bool {
    cursor.last_indexed_at.is_some_and(|at| at < cutoff)
}

pub(crate) fn cutoff_for(max_age: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(max_age)
        .ok()
        .and_then(|age| Utc::now().checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
