use super::drain;
use crate::events::{EngineEvent, EventBus, ReadyEvent};
use crate::indexer::{FileLocks, IndexingStatus};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

const MAIN: &str = "/var/log/nginx/access.log";

#[test]
fn ready_fires_when_the_last_file_of_a_group_finishes() {
    // Arrange
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let status = IndexingStatus::new(bus);

    // Act
    let mut first = status.begin_file(MAIN, MAIN);
    let second = status.begin_file("/var/log/nginx/access.log.1", MAIN);
    let mid_flight = (status.any_indexing(), status.indexing_files().len());
    first.succeeded();
    drop(first);
    let after_first = drain(&mut rx);
    drop(second);

    // Assert
    assert_eq!(mid_flight, (true, 2));
    assert!(after_first.is_empty());
    assert_eq!(
        drain(&mut rx),
        vec![EngineEvent::Ready(ReadyEvent {
            log_path: MAIN.to_string(),
            success: true,
        })]
    );
    assert!(!status.any_indexing());
    assert!(!status.is_indexing(MAIN));
}

#[test]
fn racing_holders_leave_the_group_idle_with_ready_last() {
    // Arrange
    let bus = EventBus::with_capacity(16_384);
    let mut rx = bus.subscribe();
    let status = Arc::new(IndexingStatus::new(bus));

    // Act
    let workers: Vec<_> = (0..8)
        .map(|n| {
            let status = status.clone();
            thread::spawn(move || {
                let file = format!("{MAIN}.{n}");
                for _ in 0..200 {
                    let mut flag = status.begin_file(&file, MAIN);
                    flag.succeeded();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    // Assert
    let events = drain(&mut rx);
    assert!(!events.is_empty());
    assert!(events.len() <= 8 * 200);
    assert!(events.iter().all(|e| matches!(e, EngineEvent::Ready(r) if r.success)));
    assert!(!status.any_indexing());
    assert_eq!(*status.subscribe().borrow(), 0);
}

#[test]
fn set_indexing_toggles_a_file() {
    let status = IndexingStatus::new(EventBus::new());

    status.set_indexing("/logs/a.log", "/logs/a.log", true);
    let during = status.is_indexing("/logs/a.log");
    status.set_indexing("/logs/a.log", "/logs/a.log", false);

    assert!(during);
    assert!(!status.is_indexing("/logs/a.log"));
}

#[test]
fn watch_channel_tracks_active_groups() {
    let status = IndexingStatus::new(EventBus::new());
    let rx = status.subscribe();

    let flag = status.begin_group(MAIN);
    let during = *rx.borrow();
    drop(flag);

    assert_eq!(during, 1);
    assert_eq!(*rx.borrow(), 0);
}

#[test]
fn file_lock_serializes_work_on_one_path() {
    // Arrange
    let locks = Arc::new(FileLocks::new());
    let inside = Arc::new(AtomicUsize::new(0));
    let max_inside = Arc::new(AtomicUsize::new(0));

    // Act
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_inside = max_inside.clone();
            thread::spawn(move || {
                locks.with_lock(MAIN, || {
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::yield_now();
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Assert
    assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    assert!(!locks.is_locked(MAIN));
}
