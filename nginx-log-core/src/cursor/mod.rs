//! Per-file indexing cursors.
//!
//! A cursor records how far a file has been indexed and what that run
//! observed. Cursors are keyed by absolute file path and grouped by main log
//! path.

mod error;
mod json;
mod memory;
mod types;

#[cfg(test)]
mod tests;

pub use error::CursorError;
pub use json::JsonCursorStore;
pub use memory::MemoryCursorStore;
pub use types::{CursorStats, LogIndexCursor};

use std::time::Duration;

pub trait CursorStore: Send + Sync {
    /// Stored cursor, or a fresh enabled one seeded with the file's main log path.
    fn get(&self, path: &str) -> Result<LogIndexCursor, CursorError> {
        Ok(self
            .find(path)?
            .unwrap_or_else(|| LogIndexCursor::new(path)))
    }

    fn find(&self, path: &str) -> Result<Option<LogIndexCursor>, CursorError>;

    /// Insert or replace.
    fn save(&self, cursor: &LogIndexCursor) -> Result<(), CursorError>;

    /// Enabled cursors, ordered by path.
    fn get_all(&self) -> Result<Vec<LogIndexCursor>, CursorError>;

    fn delete(&self, path: &str) -> Result<(), CursorError>;

    fn delete_all(&self) -> Result<(), CursorError>;

    /// Delete cursors last indexed before `now - max_age`. Returns how many went.
    fn cleanup_old(&self, max_age: Duration) -> Result<usize, CursorError>;

    fn stats(&self) -> Result<CursorStats, CursorError>;
}
