use crate::events::{EngineEvent, EventBus};
use crate::progress::{FileState, ProgressTracker, estimate_file_lines};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;

fn drain(rx: &mut Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

fn completions(events: &[EngineEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, EngineEvent::Complete(_)))
        .count()
}

#[test]
fn estimates_lines_from_size() {
    assert_eq!(estimate_file_lines(10_000, false), 100);
    assert_eq!(estimate_file_lines(10_000, true), 300);
    assert_eq!(estimate_file_lines(0, false), 0);
}

#[test]
fn concurrent_completion_publishes_exactly_once() {
    // Arrange
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let tracker = Arc::new(ProgressTracker::new("/var/log/nginx/access.log", bus));
    let files: Vec<String> = (0..5).map(|i| format!("/var/log/nginx/access.log.{i}")).collect();
    for file in &files {
        tracker.add_file(file, 1_000, false);
    }
    tracker.add_indexed_documents(10);

    // Act
    let handles: Vec<_> = files
        .iter()
        .cloned()
        .map(|file| {
            let tracker = tracker.clone();
            thread::spawn(move || {
                for _ in 0..3 {
                    tracker.complete_file(&file, 10);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Assert
    let events = drain(&mut rx);
    assert_eq!(completions(&events), 1);
    assert!(tracker.completion_notified());
    assert_eq!(tracker.percentage(), 100.0);
}

#[test]
fn completion_payload_reports_lines_and_bytes() {
    // Arrange
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let tracker = ProgressTracker::new("/logs/app.log", bus);
    tracker.add_file("/logs/app.log", 4_000, false);
    tracker.add_file("/logs/app.log.1.gz", 1_000, true);
    tracker.add_indexed_documents(30);

    // Act
    tracker.update_file_position("/logs/app.log", 2_500, 20);
    tracker.complete_file("/logs/app.log", 20);
    tracker.complete_file("/logs/app.log.1.gz", 10);

    // Assert
    let events = drain(&mut rx);
    let complete = events
        .iter()
        .find_map(|e| match e {
            EngineEvent::Complete(c) => Some(c.clone()),
            _ => None,
        })
        .unwrap();
    assert!(complete.success);
    assert_eq!(complete.total_lines, 30);
    // 2 500 bytes read from the plain file plus 10 lines at the seeded 120-byte average.
    assert_eq!(complete.indexed_size_bytes, 2_500 + 1_200);
    assert_eq!(complete.error, None);
}

#[test]
fn percentage_is_monotonic_and_capped_until_completion() {
    // Arrange
    let tracker = ProgressTracker::with_throttle("/a.log", EventBus::new(), Duration::ZERO);
    tracker.add_file("/a.log", 10_000, false); // ~100 lines
    tracker.add_file("/a.log.1", 10_000, false);

    // Act / Assert
    tracker.update_file_progress("/a.log", 50);
    let first = tracker.percentage();
    assert!((first - 25.0).abs() < 0.01);

    // A regressed report must not move the percentage backwards.
    tracker.update_file_progress("/a.log", 10);
    assert_eq!(tracker.percentage(), first);

    // More lines than estimated never reports 100 before completion.
    tracker.update_file_progress("/a.log", 500);
    tracker.update_file_progress("/a.log.1", 500);
    assert!(tracker.percentage() <= 99.9);

    tracker.complete_file("/a.log", 500);
    assert!(!tracker.is_completed());
    tracker.complete_file("/a.log.1", 500);
    assert_eq!(tracker.percentage(), 100.0);
    assert!(tracker.is_completed());
}

#[test]
fn progress_events_are_throttled() {
    // Arrange
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let tracker = ProgressTracker::with_throttle("/a.log", bus, Duration::from_secs(60));
    tracker.add_file("/a.log", 100_000, false);

    // Act
    tracker.update_file_progress("/a.log", 10);
    tracker.update_file_progress("/a.log", 20);
    tracker.update_file_progress("/a.log", 30);

    // Assert
    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    match &events[0] {
        EngineEvent::Progress(p) => {
            assert_eq!(p.stage, "indexing");
            assert_eq!(p.status, "running");
            assert!(p.progress > 0.0);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn failed_files_still_let_the_group_finish() {
    // Arrange
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let tracker = ProgressTracker::new("/a.log", bus);
    tracker.add_file("/a.log", 100, false);
    tracker.add_file("/a.log.1", 100, false);

    // Act
    tracker.fail_file("/a.log.1", "access denied");
    tracker.complete_file("/a.log", 0);

    // Assert
    let events = drain(&mut rx);
    assert_eq!(completions(&events), 1);
    match events.last().unwrap() {
        EngineEvent::Complete(c) => {
            assert!(!c.success);
            assert!(c.error.as_deref().unwrap().contains("access denied"));
        }
        other => panic!("unexpected event {other:?}"),
    }
    let snapshot = tracker.snapshot();
    assert!(snapshot.files.iter().all(|f| f.state == FileState::Completed));
}

#[test]
fn completing_unknown_files_does_nothing() {
    let tracker = ProgressTracker::new("/a.log", EventBus::new());
    tracker.add_file("/a.log", 100, false);

    tracker.complete_file("/other.log", 5);

    assert!(!tracker.is_completed());
}

#[test]
fn empty_groups_complete_once() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let tracker = ProgressTracker::new("/a.log", bus);

    tracker.complete_empty();
    tracker.complete_empty();

    assert_eq!(completions(&drain(&mut rx)), 1);
}

#[test]
fn compressed_files_learn_average_line_size() {
    // Arrange
    let tracker = ProgressTracker::new("/a.log", EventBus::new());
    tracker.add_file("/a.log.1.gz", 100_000, true);

    // Act: 300 000 uncompressed bytes over 1 000 lines suggests 300 bytes per line.
    tracker.update_file_position("/a.log.1.gz", 0, 1_000);

    // Assert
    let file = tracker.snapshot().files.remove(0);
    let expected = 0.2 * 300.0 + 0.8 * 120.0;
    assert!((file.avg_line_size - expected).abs() < 1e-9);
    assert_eq!(file.estimated_lines, (300_000.0 / expected) as u64);
}

#[test]
fn implausible_line_sizes_are_ignored() {
    let tracker = ProgressTracker::new("/a.log", EventBus::new());
    tracker.add_file("/a.log.1.gz", 100, true);

    // 300 bytes over 100 lines is 3 bytes per line, below the lower bound.
    tracker.update_file_position("/a.log.1.gz", 0, 100);

    let file = tracker.snapshot().files.remove(0);
    assert_eq!(file.avg_line_size, 120.0);
}

#[test]
fn line_size_keeps_sampling_every_hundred_lines_with_a_bounded_window() {
    // Arrange: 30 MB uncompressed keeps every sample between 6 100 and 156 100 lines plausible.
    let tracker = ProgressTracker::new("/a.log", EventBus::new());
    tracker.add_file("/a.log.1.gz", 10_000_000, true);
    for lines in (6_100..=156_000).step_by(100) {
        tracker.update_file_position("/a.log.1.gz", 0, lines);
    }
    let before = tracker.snapshot().files.remove(0).avg_line_size;

    // Act
    tracker.update_file_position("/a.log.1.gz", 0, 156_100);

    // Assert
    let file = tracker.snapshot().files.remove(0);
    assert!(file.avg_line_size != before);
    assert_eq!(file.line_size_samples(), 1_000);
}
