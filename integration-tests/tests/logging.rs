use integration_tests::harness::{DAY1, LogDir, access_line, init_test_tracing, test_config};
use nginx_log_core::{Collaborators, Engine};
use pretty_assertions::assert_eq;
use tracing::Level;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn indexing_emits_structured_events() {
    // Arrange
    let events = init_test_tracing();
    let dir = LogDir::new();
    let lines: Vec<String> = (0..3)
        .map(|n| access_line(DAY1 + n, "10.0.0.1", "/", 200))
        .collect();
    let log = dir.write("access.log", &lines);
    let engine = Engine::init(test_config(dir.root()), Collaborators::default()).unwrap();

    // Act
    engine.index_log_file(&log).await.unwrap();
    engine.shutdown().await.unwrap();

    // Assert
    let events = events.lock().unwrap();
    let indexed = events
        .iter()
        .find(|e| e.message == "indexed log file" && e.field("path") == Some(log.as_str()))
        .expect("no indexing event captured");
    assert_eq!(indexed.level, Level::INFO);
    assert_eq!(indexed.field("documents"), Some("3"));
    assert!(indexed.target.starts_with("nginx_log_core"));

    assert!(events.iter().any(|e| e.message == "engine initialized"));
    assert!(events.iter().any(|e| e.message == "engine stopped"));
}
