//! Per-group indexing progress with exactly-once completion.

mod registry;
mod tracker;

#[cfg(test)]
mod tests;

pub use registry::ProgressRegistry;
pub use tracker::{
    FileProgress, FileState, PROGRESS_THROTTLE, ProgressSnapshot, ProgressTracker,
    SAMPLE_EVERY_LINES, estimate_file_lines,
};
