//! Streaming indexer: per-file scans, group rebuilds, deletion, and the task queue.

mod document;
mod error;
mod file_locks;
mod log_indexer;
mod queue;
mod status;
mod streaming;

#[cfg(test)]
mod tests;

pub use document::{
    FIELD_FILE_PATH, FIELD_MAIN_LOG_PATH, FIELD_SOURCE_FILE, document_id, log_document,
    record_from_document,
};
pub use error::IndexerError;
pub use file_locks::FileLocks;
pub use log_indexer::{
    CacheScope, CleanupReport, GroupOutcome, Indexer, IndexerSettings, InvalidationHook,
    RebuildPlan,
};
pub use queue::{IndexQueue, TaskKind, TaskOutput, TaskResult};
pub use status::{IndexingFlag, IndexingStatus};
pub use streaming::FileOutcome;
