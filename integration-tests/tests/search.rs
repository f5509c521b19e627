use integration_tests::harness::{DAY1, LogDir, access_line, test_config};
use nginx_log_core::search::QueryRequest;
use nginx_log_core::{Collaborators, Engine};
use pretty_assertions::assert_eq;

const STATUSES: [u16; 5] = [200, 301, 404, 500, 200];

async fn indexed_engine(dir: &LogDir) -> (Engine, String) {
    let lines: Vec<String> = STATUSES
        .iter()
        .enumerate()
        .map(|(i, status)| {
            access_line(DAY1 + i as i64 * 60, &format!("10.0.0.{}", i + 1), "/home", *status)
        })
        .collect();
    let log = dir.write("access.log", &lines);
    let engine = Engine::init(test_config(dir.root()), Collaborators::default()).unwrap();
    engine.index_log_file(&log).await.unwrap();
    (engine, log)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn status_filter_matches_any_listed_code_newest_first() {
    // Arrange
    let dir = LogDir::new();
    let (engine, log) = indexed_engine(&dir).await;

    // Act
    let found = engine
        .search_logs(QueryRequest {
            status: vec![200, 404],
            log_path: log,
            ..Default::default()
        })
        .await
        .unwrap();

    // Assert
    assert_eq!(found.total, 3);
    let timestamps: Vec<i64> = found.entries.iter().map(|r| r.timestamp).collect();
    assert_eq!(timestamps, vec![DAY1 + 240, DAY1 + 120, DAY1]);
    assert_eq!(found.summary.pv, 3);
    assert_eq!(found.summary.uv, 3);

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn repeated_search_is_served_from_the_result_cache() {
    // Arrange
    let dir = LogDir::new();
    let (engine, log) = indexed_engine(&dir).await;
    let request = QueryRequest {
        status: vec![500],
        log_path: log,
        ..Default::default()
    };

    // Act
    let first = engine.search_logs(request.clone()).await.unwrap();
    let second = engine.search_logs(request).await.unwrap();

    // Assert
    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(second.total, 1);
    assert_eq!(second.summary, first.summary);
    assert_eq!(engine.cache_stats().results.hits, 1);

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn summary_follows_newly_indexed_lines() {
    // Arrange
    let dir = LogDir::new();
    let (engine, log) = indexed_engine(&dir).await;
    let request = QueryRequest {
        log_path: log.clone(),
        limit: 1,
        ..Default::default()
    };
    let before = engine.search_logs(request.clone()).await.unwrap();

    // Act
    dir.append(&log, &[access_line(DAY1 + 600, "10.0.0.9", "/new", 200)]);
    engine.index_log_file(&log).await.unwrap();
    let after = engine.search_logs(request).await.unwrap();

    // Assert
    assert_eq!(before.summary.pv, 5);
    assert_eq!(after.summary.pv, 6);
    assert_eq!(after.summary.uv, 6);
    assert_eq!(after.summary.unique_pages, 2);

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cached_page_is_dropped_when_its_documents_are_deleted() {
    // Arrange
    let dir = LogDir::new();
    let (engine, log) = indexed_engine(&dir).await;
    let request = QueryRequest {
        log_path: log.clone(),
        ..Default::default()
    };
    let first = engine.search_logs(request.clone()).await.unwrap();
    let cached = engine.search_logs(request.clone()).await.unwrap();

    // Act
    engine.delete_log_group_from_index(&log).await.unwrap();
    let after = engine.search_logs(request).await.unwrap();

    // Assert
    assert_eq!(first.total, 5);
    assert!(cached.from_cache);
    assert!(!after.from_cache);
    assert_eq!(after.total, 0);
    assert!(after.entries.is_empty());

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn query_string_paths_match_exact_prefix_and_wildcard_filters() {
    // Arrange
    let dir = LogDir::new();
    let log = dir.write(
        "access.log",
        &[
            access_line(DAY1, "10.0.0.1", "/s?a=1&b=2", 200),
            access_line(DAY1 + 60, "10.0.0.2", "/s?a=3", 200),
        ],
    );
    let engine = Engine::init(test_config(dir.root()), Collaborators::default()).unwrap();
    engine.index_log_file(&log).await.unwrap();
    let search = |path: &str| QueryRequest {
        log_path: log.clone(),
        path: path.to_string(),
        skip_summary: true,
        ..Default::default()
    };

    // Act
    let exact = engine.search_logs(search("/s?a=1&b=2")).await.unwrap();
    let prefix = engine.search_logs(search("/s?a=1&b*")).await.unwrap();
    let wildcard = engine.search_logs(search("*&b=*")).await.unwrap();

    // Assert
    assert_eq!(exact.total, 1);
    assert_eq!(exact.entries[0].path, "/s?a=1&amp;b=2");
    assert_eq!(prefix.total, 1);
    assert_eq!(wildcard.total, 1);

    engine.shutdown().await.unwrap();
}
