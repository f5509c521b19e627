use crate::events::{CompleteEvent, EngineEvent, EventBus, ProgressEvent};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Minimum spacing between two progress events of one tracker.
pub const PROGRESS_THROTTLE: Duration = Duration::from_secs(2);

const PLAIN_BYTES_PER_LINE: u64 = 100;
const GZIP_RATIO: u64 = 3;
const FALLBACK_BYTES_PER_LINE: u64 = 150;

const SEED_AVG_LINE_SIZE: f64 = 120.0;
const MIN_AVG_LINE_SIZE: f64 = 50.0;
const MAX_AVG_LINE_SIZE: f64 = 5000.0;
const AVG_SMOOTHING: f64 = 0.2;
/// Line-size sampling cadence of compressed files.
pub const SAMPLE_EVERY_LINES: u64 = 100;
/// Most recent line-size samples kept per file.
const LINE_SIZE_WINDOW: usize = 1000;

/// Running percentage is held below this until the group completes.
const MAX_RUNNING_PERCENTAGE: f64 = 99.9;

/// Seed line estimate from a file size. Gzip is assumed to compress 3:1.
pub fn estimate_file_lines(size: u64, compressed: bool) -> u64 {
    if compressed {
        size * GZIP_RATIO / PLAIN_BYTES_PER_LINE
    } else {
        size / PLAIN_BYTES_PER_LINE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    Pending,
    Processing,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileProgress {
    pub path: String,
    pub state: FileState,
    pub compressed: bool,
    pub file_size: u64,
    pub estimated_lines: u64,
    pub processed_lines: u64,
    /// Byte offset reached; plain files only.
    pub current_position: u64,
    /// Running estimate of uncompressed bytes per line; compressed files only.
    pub avg_line_size: f64,
    #[serde(skip)]
    samples: VecDeque<f64>,
    #[serde(skip)]
    samples_sum: f64,
    #[serde(skip)]
    last_sample_lines: u64,
}

impl FileProgress {
    fn new(path: &str, file_size: u64, compressed: bool) -> Self {
        Self {
            path: path.to_string(),
            state: FileState::Pending,
            compressed,
            file_size,
            estimated_lines: estimate_file_lines(file_size, compressed),
            processed_lines: 0,
            current_position: 0,
            avg_line_size: SEED_AVG_LINE_SIZE,
            samples: VecDeque::new(),
            samples_sum: 0.0,
            last_sample_lines: 0,
        }
    }

    fn effective_estimate(&self) -> u64 {
        match self.state {
            FileState::Completed => self.processed_lines,
            _ => self.estimated_lines.max(self.processed_lines),
        }
    }

    fn estimated_bytes(&self) -> u64 {
        if self.compressed {
            (self.processed_lines as f64 * self.avg_line_size) as u64
        } else if self.current_position > 0 {
            self.current_position
        } else {
            self.processed_lines * FALLBACK_BYTES_PER_LINE
        }
    }

    /// Number of line-size samples currently held.
    pub(crate) fn line_size_samples(&self) -> usize {
        self.samples.len()
    }

    /// Sample every `SAMPLE_EVERY_LINES` lines and move the estimate towards
    /// the mean of the recent window.
    fn sample_line_size(&mut self, processed_lines: u64) {
        if processed_lines == 0 || processed_lines < self.last_sample_lines + SAMPLE_EVERY_LINES {
            return;
        }
        self.last_sample_lines = processed_lines;

        let candidate = (self.file_size * GZIP_RATIO) as f64 / processed_lines as f64;
        if candidate <= MIN_AVG_LINE_SIZE || candidate >= MAX_AVG_LINE_SIZE {
            return;
        }

        if self.samples.len() == LINE_SIZE_WINDOW {
            if let Some(oldest) = self.samples.pop_front() {
                self.samples_sum -= oldest;
            }
        }
        self.samples.push_back(candidate);
        self.samples_sum += candidate;

        let window_mean = self.samples_sum / self.samples.len() as f64;
        self.avg_line_size =
            AVG_SMOOTHING * window_mean + (1.0 - AVG_SMOOTHING) * self.avg_line_size;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    pub log_path: String,
    pub percentage: f64,
    pub total_estimated_lines: u64,
    pub total_processed_lines: u64,
    pub completed_files: usize,
    pub total_files: usize,
    pub elapsed_ms: u64,
    pub is_completed: bool,
    pub files: Vec<FileProgress>,
}

struct TrackerState {
    files: Vec<FileProgress>,
    last_percentage: f64,
    last_progress_at: Option<Instant>,
    is_completed: bool,
    completion_notified: bool,
    error: Option<String>,
}

impl TrackerState {
    fn file_mut(&mut self, path: &str) -> Option<&mut FileProgress> {
        self.files.iter_mut().find(|f| f.path == path)
    }

    fn raw_percentage(&self) -> f64 {
        let estimate: u64 = self.files.iter().map(FileProgress::effective_estimate).sum();
        let actual: u64 = self.files.iter().map(|f| f.processed_lines).sum();

        if estimate > 0 {
            (actual as f64 / estimate as f64 * 100.0).min(100.0)
        } else if !self.files.is_empty() {
            self.completed_files() as f64 / self.files.len() as f64 * 100.0
        } else {
            0.0
        }
    }

    fn completed_files(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.state == FileState::Completed)
            .count()
    }

    fn all_completed(&self) -> bool {
        self.files.iter().all(|f| f.state == FileState::Completed)
    }

    /// Never decreases; 100 is reserved for completion.
    fn advance_percentage(&mut self) -> f64 {
        let next = if self.is_completed {
            100.0
        } else {
            self.raw_percentage().min(MAX_RUNNING_PERCENTAGE)
        };
        self.last_percentage = self.last_percentage.max(next);
        self.last_percentage
    }
}

/// Progress of one log-group rebuild.
///
/// All mutation happens under one write lock. The completion flag is tested
/// and set under that lock, so however many threads race to finish the last
/// file, only one of them publishes the completion event.
pub struct ProgressTracker {
    log_path: String,
    bus: EventBus,
    throttle: Duration,
    started: Instant,
    indexed_documents: AtomicU64,
    state: RwLock<TrackerState>,
}

impl ProgressTracker {
    pub fn new(log_path: impl Into<String>, bus: EventBus) -> Self {
        Self::with_throttle(log_path, bus, PROGRESS_THROTTLE)
    }

    pub fn with_throttle(log_path: impl Into<String>, bus: EventBus, throttle: Duration) -> Self {
        Self {
            log_path: log_path.into(),
            bus,
            throttle,
            started: Instant::now(),
            indexed_documents: AtomicU64::new(0),
            state: RwLock::new(TrackerState {
                files: Vec::new(),
                last_percentage: 0.0,
                last_progress_at: None,
                is_completed: false,
                completion_notified: false,
                error: None,
            }),
        }
    }

    pub fn log_path(&self) -> &str {
        &self.log_path
    }

    /// Register a file. Adding the same path twice keeps the first entry.
    pub fn add_file(&self, path: &str, file_size: u64, compressed: bool) {
        let mut state = self.state.write();
        if state.files.iter().any(|f| f.path == path) {
            return;
        }
        state.files.push(FileProgress::new(path, file_size, compressed));
    }

    pub fn start_file(&self, path: &str) {
        let mut state = self.state.write();
        if let Some(file) = state.file_mut(path) {
            if file.state == FileState::Pending {
                file.state = FileState::Processing;
            }
        }
    }

    pub fn update_file_progress(&self, path: &str, processed_lines: u64) {
        let event = {
            let mut state = self.state.write();
            match state.file_mut(path) {
                Some(file) if file.state != FileState::Completed => {
                    file.state = FileState::Processing;
                    file.processed_lines = file.processed_lines.max(processed_lines);
                }
                _ => return,
            }
            self.progress_event(&mut state)
        };

        if let Some(event) = event {
            self.bus.publish(event);
        }
    }

    /// Byte position for plain files; compressed files refine their line-size estimate.
    pub fn update_file_position(&self, path: &str, position: u64, processed_lines: u64) {
        let mut state = self.state.write();
        let Some(file) = state.file_mut(path) else {
            return;
        };
        if file.state == FileState::Completed {
            return;
        }

        if file.compressed {
            file.sample_line_size(processed_lines);
            file.estimated_lines =
                ((file.file_size * GZIP_RATIO) as f64 / file.avg_line_size) as u64;
        } else {
            file.current_position = file.current_position.max(position);
        }
    }

    pub fn add_indexed_documents(&self, count: u64) {
        self.indexed_documents.fetch_add(count, Ordering::Relaxed);
    }

    pub fn indexed_documents(&self) -> u64 {
        self.indexed_documents.load(Ordering::Relaxed)
    }

    /// Mark a file finished. Repeated calls are no-ops.
    pub fn complete_file(&self, path: &str, processed_lines: u64) {
        let event = {
            let mut state = self.state.write();
            match state.file_mut(path) {
                Some(file) if file.state != FileState::Completed => {
                    file.processed_lines = file.processed_lines.max(processed_lines);
                    file.state = FileState::Completed;
                }
                _ => return,
            }
            self.completion_event(&mut state)
        };

        if let Some(event) = event {
            self.bus.publish(event);
        }
    }

    /// Finish a file that could not be indexed so the group can still complete.
    pub fn fail_file(&self, path: &str, error: &str) {
        {
            let mut state = self.state.write();
            if state.error.is_none() {
                state.error = Some(format!("{path}: {error}"));
            }
        }
        self.complete_file(path, 0);
    }

    /// Complete a group that turned out to have no files.
    pub fn complete_empty(&self) {
        let event = {
            let mut state = self.state.write();
            if !state.files.is_empty() {
                return;
            }
            self.completion_event(&mut state)
        };

        if let Some(event) = event {
            self.bus.publish(event);
        }
    }

    pub fn percentage(&self) -> f64 {
        self.state.read().last_percentage
    }

    pub fn is_completed(&self) -> bool {
        self.state.read().is_completed
    }

    pub fn completion_notified(&self) -> bool {
        self.state.read().completion_notified
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let state = self.state.read();
        ProgressSnapshot {
            log_path: self.log_path.clone(),
            percentage: state.last_percentage,
            total_estimated_lines: state.files.iter().map(FileProgress::effective_estimate).sum(),
            total_processed_lines: state.files.iter().map(|f| f.processed_lines).sum(),
            completed_files: state.completed_files(),
            total_files: state.files.len(),
            elapsed_ms: self.elapsed_ms(),
            is_completed: state.is_completed,
            files: state.files.clone(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn progress_event(&self, state: &mut TrackerState) -> Option<EngineEvent> {
        let percentage = state.advance_percentage();

        let now = Instant::now();
        if let Some(last) = state.last_progress_at {
            if now.duration_since(last) < self.throttle {
                return None;
            }
        }
        state.last_progress_at = Some(now);

        let elapsed_ms = self.elapsed_ms();
        let estimated_remaining_ms = if percentage > 0.0 && percentage < 100.0 {
            (elapsed_ms as f64 * (100.0 - percentage) / percentage) as u64
        } else {
            0
        };

        Some(EngineEvent::Progress(ProgressEvent {
            log_path: self.log_path.clone(),
            progress: percentage,
            stage: "indexing".to_string(),
            status: "running".to_string(),
            elapsed_ms,
            estimated_remaining_ms,
        }))
    }

    fn completion_event(&self, state: &mut TrackerState) -> Option<EngineEvent> {
        if !state.all_completed() || state.completion_notified {
            state.advance_percentage();
            return None;
        }

        state.completion_notified = true;
        state.is_completed = true;
        state.advance_percentage();

        let total_lines: u64 = state.files.iter().map(|f| f.processed_lines).sum();
        let indexed_size_bytes: u64 = state.files.iter().map(FileProgress::estimated_bytes).sum();
        let indexed = self.indexed_documents();

        tracing::info!(
            log_path = %self.log_path,
            files = state.files.len(),
            total_lines,
            indexed,
            "log group indexing completed"
        );

        Some(EngineEvent::Complete(CompleteEvent {
            log_path: self.log_path.clone(),
            success: indexed > 0,
            duration_ms: self.elapsed_ms(),
            total_lines,
            indexed_size_bytes,
            error: state.error.clone(),
        }))
    }
}
