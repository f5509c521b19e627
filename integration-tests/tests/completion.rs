use integration_tests::harness::{DAY1, LogDir, access_line, completions, test_config};
use nginx_log_core::events::EventBus;
use nginx_log_core::progress::ProgressRegistry;
use nginx_log_core::{Collaborators, Engine};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reporters_complete_a_group_exactly_once() {
    // Arrange
    let bus = EventBus::new();
    let mut events = bus.subscribe();
    let registry = Arc::new(ProgressRegistry::new(bus));
    let tracker = registry.begin("/var/log/nginx/access.log");
    let files: Vec<String> = (0..5)
        .map(|i| format!("/var/log/nginx/access.log.{i}"))
        .collect();
    for file in &files {
        tracker.add_file(file, 4_096, false);
    }

    // Act
    let reporters: Vec<_> = files
        .into_iter()
        .map(|file| {
            let registry = registry.clone();
            tokio::task::spawn_blocking(move || {
                let tracker = registry.get_or_create("/var/log/nginx/access.log");
                for _ in 0..3 {
                    tracker.complete_file(&file, 40);
                }
            })
        })
        .collect();
    for reporter in reporters {
        reporter.await.unwrap();
    }

    // Assert
    let done = completions(&mut events);
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].total_lines, 200);
    assert!(tracker.completion_notified());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_rebuilds_of_one_group_each_complete_once() {
    // Arrange
    let dir = LogDir::new();
    let lines: Vec<String> = (0..20)
        .map(|n| access_line(DAY1 + n, "10.0.0.1", "/", 200))
        .collect();
    let log = dir.write("access.log", &lines);
    dir.write("access.log.1", &lines);
    let engine = Arc::new(Engine::init(test_config(dir.root()), Collaborators::default()).unwrap());
    let mut events = engine.subscribe();

    // Act
    let rebuilds: Vec<_> = (0..3)
        .map(|_| {
            let engine = engine.clone();
            let log = log.clone();
            tokio::spawn(async move { engine.force_reindex_file_group(&log).await })
        })
        .collect();
    for rebuild in rebuilds {
        rebuild.await.unwrap().unwrap();
    }

    // Assert
    let done = completions(&mut events);
    assert_eq!(done.len(), 3);
    assert!(done.iter().all(|c| c.success && c.total_lines == 40));
    assert_eq!(engine.index_stats().unwrap().doc_count, 40);

    let engine = Arc::into_inner(engine).unwrap();
    engine.shutdown().await.unwrap();
}
