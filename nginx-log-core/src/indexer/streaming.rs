use crate::discovery::{is_gzip, is_unsupported_compression};
use crate::index::{Batch, SearchIndex};
use crate::indexer::document::{document_id, log_document};
use crate::indexer::error::IndexerError;
use crate::indexer::{CacheScope, Indexer};
use crate::progress::{ProgressTracker, SAMPLE_EVERY_LINES};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use tokio_util::sync::CancellationToken;

/// 1 MiB scanner buffer.
const SCAN_BUFFER_BYTES: usize = 1024 * 1024;

/// What one scan of one file produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileOutcome {
    pub path: String,
    pub start_position: u64,
    /// Byte offset the next incremental scan starts from.
    pub end_position: u64,
    pub lines: u64,
    pub documents: u64,
    pub failed_lines: u64,
    pub min_timestamp: Option<i64>,
    pub max_timestamp: Option<i64>,
    /// Nothing changed since the last scan.
    pub up_to_date: bool,
}

/// Scan state threaded through the batch flushes of one file.
pub(crate) struct ScanContext<'a> {
    pub path: &'a str,
    pub main_log_path: &'a str,
    pub start_position: u64,
    pub tracker: Option<&'a ProgressTracker>,
    pub cancel: &'a CancellationToken,
}

impl Indexer {
    /// Read `ctx.path` from `ctx.start_position` to EOF and index every parsable line.
    ///
    /// Blocking. The caller holds the file lock and owns cursor bookkeeping.
    pub(crate) fn scan_file(
        &self,
        file: File,
        ctx: &ScanContext<'_>,
    ) -> Result<(FileOutcome, bool), IndexerError> {
        let mut outcome = FileOutcome {
            path: ctx.path.to_string(),
            start_position: ctx.start_position,
            end_position: ctx.start_position,
            ..Default::default()
        };

        let (mut reader, mut skip_first) = open_reader(file, ctx)?;
        let mut position = ctx.start_position;

        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        let mut lines: Vec<String> = Vec::with_capacity(self.settings.scan_buffer_lines);
        let mut cancelled = false;

        loop {
            if ctx.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| IndexerError::scan(ctx.path, e))?;
            if n == 0 {
                break;
            }
            position += n as u64;

            // Resuming mid-line: the remainder of a line indexed earlier.
            if skip_first {
                skip_first = false;
                continue;
            }

            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                continue;
            }
            lines.push(line.to_string());
            outcome.lines += 1;

            if lines.len() >= self.settings.scan_buffer_lines {
                self.process_batch(&mut lines, ctx, &mut outcome)?;
            }

            if let Some(tracker) = ctx.tracker {
                if outcome.lines % SAMPLE_EVERY_LINES == 0 {
                    tracker.update_file_position(ctx.path, position, outcome.lines);
                }
                if outcome.lines % self.settings.progress_every_lines == 0 {
                    tracker.update_file_progress(ctx.path, outcome.lines);
                }
            }
        }

        // Already-parsed lines are durable even when cancelled.
        self.process_batch(&mut lines, ctx, &mut outcome)?;
        outcome.end_position = position;

        if let Some(tracker) = ctx.tracker {
            tracker.update_file_position(ctx.path, position, outcome.lines);
        }

        Ok((outcome, cancelled))
    }

    /// Parse the buffered lines, index them in `batch_size` chunks, and clear the buffer.
    fn process_batch(
        &self,
        lines: &mut Vec<String>,
        ctx: &ScanContext<'_>,
        outcome: &mut FileOutcome,
    ) -> Result<(), IndexerError> {
        if lines.is_empty() {
            return Ok(());
        }

        let parsed = self.parser.parse_lines(lines.as_slice());
        lines.clear();
        outcome.failed_lines += parsed.failed as u64;

        let mut batch = Batch::with_capacity(self.settings.batch_size);
        for record in parsed.records {
            let id = document_id(ctx.path, ctx.start_position, outcome.documents);
            batch.index(id, log_document(&record, ctx.main_log_path, ctx.path));
            outcome.documents += 1;

            outcome.min_timestamp = Some(
                outcome
                    .min_timestamp
                    .map_or(record.timestamp, |t| t.min(record.timestamp)),
            );
            outcome.max_timestamp = Some(
                outcome
                    .max_timestamp
                    .map_or(record.timestamp, |t| t.max(record.timestamp)),
            );

            if batch.size() >= self.settings.batch_size {
                let full = std::mem::replace(
                    &mut batch,
                    Batch::with_capacity(self.settings.batch_size),
                );
                self.commit(full, ctx)?;
            }
        }

        self.commit(batch, ctx)
    }

    fn commit(&self, batch: Batch, ctx: &ScanContext<'_>) -> Result<(), IndexerError> {
        if batch.is_empty() {
            return Ok(());
        }
        let size = batch.size() as u64;

        self.index
            .execute(batch)
            .map_err(|source| IndexerError::BatchCommit {
                path: ctx.path.to_string(),
                source,
            })?;

        if let Some(tracker) = ctx.tracker {
            tracker.add_indexed_documents(size);
        }
        self.invalidate(CacheScope::Summary);
        tracing::trace!(path = ctx.path, documents = size, "committed index batch");
        Ok(())
    }
}

/// Position a reader at `ctx.start_position`.
///
/// The flag is true when the offset falls mid-line, so the first line read
/// is a tail already indexed by an earlier scan.
fn open_reader(
    mut file: File,
    ctx: &ScanContext<'_>,
) -> Result<(Box<dyn BufRead>, bool), IndexerError> {
    if is_unsupported_compression(ctx.path) {
        return Err(IndexerError::UnsupportedCompression {
            path: ctx.path.to_string(),
        });
    }
    if is_gzip(ctx.path) {
        if ctx.start_position > 0 {
            return Err(IndexerError::IncrementalOnCompressed {
                path: ctx.path.to_string(),
                position: ctx.start_position,
            });
        }
        let reader = BufReader::with_capacity(SCAN_BUFFER_BYTES, MultiGzDecoder::new(file));
        return Ok((Box::new(reader), false));
    }

    let mid_line = if ctx.start_position > 0 {
        file.seek(SeekFrom::Start(ctx.start_position - 1))
            .map_err(|e| IndexerError::scan(ctx.path, e))?;
        let mut previous = [0u8; 1];
        file.read_exact(&mut previous)
            .map_err(|e| IndexerError::scan(ctx.path, e))?;
        previous[0] != b'\n'
    } else {
        false
    };

    file.seek(SeekFrom::Start(ctx.start_position))
        .map_err(|e| IndexerError::scan(ctx.path, e))?;
    Ok((
        Box::new(BufReader::with_capacity(SCAN_BUFFER_BYTES, file)),
        mid_line,
    ))
}
