use crate::conf::EngineConfig;
use crate::cursor::{CursorStore, LogIndexCursor};
use crate::discovery::{
    AccessPolicy, discover_group_files, discover_main_logs, group_size, is_gzip, main_log_path,
};
use crate::index::{Batch, IndexHandle, Query, SearchIndex, SearchRequest};
use crate::indexer::document::{FIELD_FILE_PATH, FIELD_SOURCE_FILE};
use crate::indexer::error::IndexerError;
use crate::indexer::file_locks::FileLocks;
use crate::indexer::status::IndexingStatus;
use crate::indexer::streaming::{FileOutcome, ScanContext};
use crate::parser::LogParser;
use crate::progress::{ProgressRegistry, ProgressTracker};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Which search cache tier an index mutation makes stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheScope {
    Summary,
    All,
}

pub type InvalidationHook = Arc<dyn Fn(CacheScope) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct IndexerSettings {
    pub batch_size: usize,
    pub scan_buffer_lines: usize,
    pub progress_every_lines: u64,
    pub page_size: usize,
}

impl IndexerSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            batch_size: config.index.batch_size.max(1),
            scan_buffer_lines: config.index.scan_buffer_lines.max(1),
            progress_every_lines: config.index.progress_every_lines.max(1),
            page_size: config.search.page_size.max(1),
        }
    }
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Result of rebuilding one log group.
#[derive(Debug, Clone, Default)]
pub struct GroupOutcome {
    pub main_log_path: String,
    pub files: Vec<FileOutcome>,
    /// `(path, error)` for files that were skipped.
    pub failed_files: Vec<(String, String)>,
    pub total_lines: u64,
    pub documents: u64,
    pub duration: Duration,
}

/// Groups and files the orphan sweep removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupReport {
    pub removed_files: Vec<String>,
    pub removed_groups: Vec<String>,
    pub deleted_documents: u64,
}

/// Everything a queued full rebuild needs after the index was reset.
#[derive(Debug, Clone, Default)]
pub struct RebuildPlan {
    pub groups: Vec<String>,
}

/// Blocking indexing operations over the shared index and cursor store.
///
/// Every method here does filesystem and index work on the calling thread;
/// async callers go through the task queue.
pub struct Indexer {
    pub(crate) index: Arc<IndexHandle>,
    pub(crate) cursors: Arc<dyn CursorStore>,
    pub(crate) parser: Arc<LogParser>,
    pub(crate) settings: IndexerSettings,
    policy: AccessPolicy,
    progress: Arc<ProgressRegistry>,
    status: Arc<IndexingStatus>,
    locks: FileLocks,
    hook: Option<InvalidationHook>,
}

impl Indexer {
    pub fn new(
        index: Arc<IndexHandle>,
        cursors: Arc<dyn CursorStore>,
        parser: Arc<LogParser>,
        policy: AccessPolicy,
        progress: Arc<ProgressRegistry>,
        status: Arc<IndexingStatus>,
        settings: IndexerSettings,
    ) -> Self {
        Self {
            index,
            cursors,
            parser,
            settings,
            policy,
            progress,
            status,
            locks: FileLocks::new(),
            hook: None,
        }
    }

    pub fn with_invalidation_hook(mut self, hook: InvalidationHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn status(&self) -> &Arc<IndexingStatus> {
        &self.status
    }

    pub fn progress(&self) -> &Arc<ProgressRegistry> {
        &self.progress
    }

    pub(crate) fn invalidate(&self, scope: CacheScope) {
        if let Some(hook) = &self.hook {
            hook(scope);
        }
    }

    /// Index whatever was appended to `path` since its cursor position.
    pub fn index_log_file(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<FileOutcome, IndexerError> {
        let main = main_log_path(path);
        self.index_file(path, &main, None, cancel, false)
    }

    /// Rebuild the group of `main_log_path` from scratch.
    ///
    /// Existing documents of the group are deleted and cursors reset before
    /// every sibling is scanned in parallel. Exactly one completion event is
    /// published for the rebuild, including when it fails early.
    pub fn index_log_file_full(
        &self,
        main_log_path: &str,
        cancel: &CancellationToken,
    ) -> Result<GroupOutcome, IndexerError> {
        let started = Instant::now();
        let tracker = self.progress.begin(main_log_path);
        let mut group_flag = self.status.begin_group(main_log_path);

        let files = match self.prepare_group(main_log_path) {
            Ok(files) => files,
            Err(e) => {
                tracing::error!(main_log_path, error = %e, "group rebuild failed before scanning");
                tracker.complete_empty();
                return Err(e);
            }
        };

        for file in &files {
            let size = fs::metadata(file).map(|m| m.len()).unwrap_or(0);
            tracker.add_file(file, size, is_gzip(file));
        }

        if files.is_empty() {
            tracing::info!(main_log_path, "no files found for log group");
            tracker.complete_empty();
            return Ok(GroupOutcome {
                main_log_path: main_log_path.to_string(),
                duration: started.elapsed(),
                ..Default::default()
            });
        }

        tracing::info!(main_log_path, files = files.len(), "rebuilding log group");

        let results: Vec<(String, Result<FileOutcome, IndexerError>)> = files
            .par_iter()
            .map(|file| {
                let result = self.index_group_member(file, main_log_path, &tracker, cancel);
                (file.clone(), result)
            })
            .collect();

        let mut outcome = GroupOutcome {
            main_log_path: main_log_path.to_string(),
            ..Default::default()
        };
        for (file, result) in results {
            match result {
                Ok(file_outcome) => {
                    outcome.total_lines += file_outcome.lines;
                    outcome.documents += file_outcome.documents;
                    outcome.files.push(file_outcome);
                }
                Err(e) => outcome.failed_files.push((file, e.to_string())),
            }
        }
        outcome.duration = started.elapsed();

        if outcome.documents > 0 {
            group_flag.succeeded();
        }

        tracing::info!(
            main_log_path,
            files = outcome.files.len(),
            failed = outcome.failed_files.len(),
            lines = outcome.total_lines,
            documents = outcome.documents,
            duration_ms = outcome.duration.as_millis() as u64,
            "log group rebuilt"
        );

        if cancel.is_cancelled() {
            return Err(IndexerError::Cancelled {
                path: main_log_path.to_string(),
            });
        }
        Ok(outcome)
    }

    fn prepare_group(&self, main_log_path: &str) -> Result<Vec<String>, IndexerError> {
        let files = discover_group_files(main_log_path)?;
        self.delete_log_group_from_index(main_log_path)?;

        let stale: BTreeSet<String> = self
            .cursors
            .get_all()?
            .into_iter()
            .filter(|c| c.main_log_path == main_log_path)
            .map(|c| c.path)
            .chain(files.iter().cloned())
            .collect();
        for path in &stale {
            self.cursors.delete(path)?;
        }

        Ok(files)
    }

    fn index_group_member(
        &self,
        file: &str,
        main_log_path: &str,
        tracker: &ProgressTracker,
        cancel: &CancellationToken,
    ) -> Result<FileOutcome, IndexerError> {
        tracker.start_file(file);
        match self.index_file(file, main_log_path, Some(tracker), cancel, true) {
            Ok(outcome) => {
                tracker.complete_file(file, outcome.lines);
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(path = file, error = %e, "skipping file in group rebuild");
                tracker.fail_file(file, &e.to_string());
                Err(e)
            }
        }
    }

    /// Per-file algorithm shared by incremental and full scans.
    fn index_file(
        &self,
        path: &str,
        main_log_path: &str,
        tracker: Option<&ProgressTracker>,
        cancel: &CancellationToken,
        full: bool,
    ) -> Result<FileOutcome, IndexerError> {
        self.locks.with_lock(path, || -> Result<FileOutcome, IndexerError> {
            let mut flag = self.status.begin_file(path, main_log_path);
            let started = Instant::now();

            let mut cursor = if full {
                LogIndexCursor::new(path)
            } else {
                self.cursors.get(path)?
            };
            cursor.main_log_path = main_log_path.to_string();
            cursor.last_index_started_at = Some(Utc::now());

            let (file, meta) = self.policy.open(Path::new(path))?;
            let size = meta.len();
            let compressed = is_gzip(path);

            let mut start = cursor.last_position;
            if start > size {
                // Truncated in place: the old documents no longer match the file.
                let removed = self.delete_by_term(FIELD_SOURCE_FILE, path)?;
                tracing::info!(
                    path,
                    previous = start,
                    size,
                    removed,
                    "file shrank, rescanning from the start"
                );
                start = 0;
                cursor.document_count = 0;
                cursor.time_range_start = None;
                cursor.time_range_end = None;
            }

            if start > 0 && start == size {
                tracing::debug!(path, position = start, "file already up to date");
                return Ok(FileOutcome {
                    path: path.to_string(),
                    start_position: start,
                    end_position: start,
                    up_to_date: true,
                    ..Default::default()
                });
            }

            let ctx = ScanContext {
                path,
                main_log_path,
                start_position: start,
                tracker,
                cancel,
            };
            let (outcome, cancelled) = self.scan_file(file, &ctx)?;

            cursor.last_modified = meta.modified().ok().map(DateTime::<Utc>::from);
            cursor.last_size = self.group_size_or(main_log_path, size);
            if !(compressed && cancelled) {
                cursor.last_position = if compressed { size } else { outcome.end_position };
                cursor.document_count += outcome.documents;
            }
            if let (Some(min), Some(max)) = (outcome.min_timestamp, outcome.max_timestamp) {
                cursor.expand_time_range(min, max);
            }
            cursor.last_indexed_at = Some(Utc::now());
            cursor.last_index_duration_ms = started.elapsed().as_millis() as u64;

            if let Err(e) = self.cursors.save(&cursor) {
                tracing::warn!(path, error = %e, "failed to persist index cursor");
            }

            if outcome.documents > 0 {
                flag.succeeded();
            }

            tracing::info!(
                path,
                lines = outcome.lines,
                documents = outcome.documents,
                failed = outcome.failed_lines,
                position = cursor.last_position,
                duration_ms = cursor.last_index_duration_ms,
                "indexed log file"
            );

            if cancelled {
                return Err(IndexerError::Cancelled {
                    path: path.to_string(),
                });
            }
            Ok(outcome)
        })
    }

    fn group_size_or(&self, main_log_path: &str, fallback: u64) -> u64 {
        discover_group_files(main_log_path)
            .map_err(|e| e.to_string())
            .and_then(|files| group_size(&files).map_err(|e| e.to_string()))
            .unwrap_or_else(|error| {
                tracing::debug!(main_log_path, error = %error, "group size unavailable");
                fallback
            })
    }

    /// Delete every document of the group. Returns how many were removed.
    pub fn delete_log_group_from_index(&self, main_log_path: &str) -> Result<u64, IndexerError> {
        let deleted = self.delete_by_term(FIELD_FILE_PATH, main_log_path)?;
        tracing::info!(main_log_path, deleted, "deleted log group from index");
        Ok(deleted)
    }

    /// Delete the documents read from one file, and its cursor.
    pub fn delete_file_index(&self, path: &str) -> Result<u64, IndexerError> {
        let deleted = self.delete_by_term(FIELD_SOURCE_FILE, path)?;
        self.cursors.delete(path)?;
        tracing::info!(path, deleted, "deleted file from index");
        Ok(deleted)
    }

    fn delete_by_term(&self, field: &str, value: &str) -> Result<u64, IndexerError> {
        let mut deleted = 0u64;
        let mut previous_total = u64::MAX;

        loop {
            let request = SearchRequest::new(Query::term(field, value))
                .size(self.settings.page_size)
                .fields(&["timestamp"]);
            let page = self.index.search(&request)?;
            if page.hits.is_empty() {
                break;
            }
            if page.total >= previous_total {
                tracing::warn!(field, value, remaining = page.total, "delete made no progress");
                break;
            }
            previous_total = page.total;

            let mut batch = Batch::with_capacity(page.hits.len());
            for hit in page.hits {
                batch.delete(hit.id);
            }
            deleted += batch.size() as u64;
            self.index.execute(batch)?;
        }

        if deleted > 0 {
            self.invalidate(CacheScope::All);
        }
        Ok(deleted)
    }

    /// Drop the index storage, every cursor, and all cached results.
    pub fn delete_all_indexes(&self) -> Result<(), IndexerError> {
        self.index.recreate()?;
        self.cursors.delete_all()?;
        self.progress.clear();
        self.invalidate(CacheScope::All);
        tracing::info!("deleted all indexes");
        Ok(())
    }

    /// Reset everything ahead of a full rebuild and return the groups to rebuild.
    ///
    /// Groups are the union of every cursor's main path and the main log
    /// files found under the whitelist roots.
    pub fn prepare_rebuild(&self) -> Result<RebuildPlan, IndexerError> {
        let mut groups: BTreeSet<String> = self
            .cursors
            .get_all()?
            .into_iter()
            .map(|c| c.main_log_path)
            .collect();

        for path in discover_main_logs(&self.policy.roots())? {
            groups.insert(main_log_path(&path));
        }

        self.delete_all_indexes()?;

        tracing::info!(groups = groups.len(), "prepared full index rebuild");
        Ok(RebuildPlan {
            groups: groups.into_iter().collect(),
        })
    }

    /// Remove documents and cursors of files that no longer exist.
    pub fn cleanup_orphaned_indexes(&self) -> Result<CleanupReport, IndexerError> {
        let mut report = CleanupReport::default();
        let cursors = self.cursors.get_all()?;

        let mut groups: BTreeSet<String> = BTreeSet::new();
        for cursor in &cursors {
            groups.insert(cursor.main_log_path.clone());
            if Path::new(&cursor.path).exists() {
                continue;
            }
            report.deleted_documents += self.delete_file_index(&cursor.path)?;
            report.removed_files.push(cursor.path.clone());
        }

        for group in groups {
            let remaining = discover_group_files(&group)?;
            if !remaining.is_empty() {
                continue;
            }
            report.deleted_documents += self.delete_log_group_from_index(&group)?;
            report.removed_groups.push(group);
        }

        tracing::info!(
            files = report.removed_files.len(),
            groups = report.removed_groups.len(),
            documents = report.deleted_documents,
            "cleaned up orphaned indexes"
        );
        Ok(report)
    }
}
