use integration_tests::harness::{LogDir, test_config};
use nginx_log_core::search::QueryRequest;
use nginx_log_core::{Collaborators, Engine};
use pretty_assertions::assert_eq;

const CHROME_LINE: &str = r#"192.168.1.1 - - [25/Dec/2023:10:00:00 +0000] "GET /api/test HTTP/1.1" 200 1024 "https://example.com" "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/91.0.4472.124 Safari/537.36" 0.123 0.050"#;
const COMMON_LINE: &str = r#"10.0.0.1 - - [01/Jan/2023:12:00:00 +0000] "POST /submit HTTP/1.1" 201 512"#;

async fn engine_with(dir: &LogDir, lines: &[&str]) -> (Engine, String) {
    let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
    let log = dir.write("access.log", &lines);
    let config = test_config(dir.root());
    let collaborators = Collaborators::from_config(&config).unwrap();
    let engine = Engine::init(config, collaborators).unwrap();
    engine.index_log_file(&log).await.unwrap();
    (engine, log)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn combined_line_is_enriched_with_user_agent_fields() {
    // Arrange
    let dir = LogDir::new();
    let (engine, log) = engine_with(&dir, &[CHROME_LINE]).await;

    // Act
    let found = engine
        .search_logs(QueryRequest {
            log_path: log,
            ..Default::default()
        })
        .await
        .unwrap();

    // Assert
    assert_eq!(found.total, 1);
    let record = &found.entries[0];
    assert_eq!(record.ip, "192.168.1.1");
    assert_eq!(record.method, "GET");
    assert_eq!(record.path, "/api/test");
    assert_eq!(record.protocol, "HTTP/1.1");
    assert_eq!(record.status, 200);
    assert_eq!(record.bytes_sent, 1024);
    assert_eq!(record.request_time, Some(0.123));
    assert_eq!(record.upstream_time, Some(0.050));
    assert_eq!(record.browser, "Chrome");
    assert_eq!(record.browser_version, "91.0");
    assert_eq!(record.os, "Windows 10");
    assert_eq!(record.device_type, "Desktop");

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn common_line_has_no_user_agent_derivations() {
    // Arrange
    let dir = LogDir::new();
    let (engine, log) = engine_with(&dir, &[COMMON_LINE]).await;

    // Act
    let found = engine
        .search_logs(QueryRequest {
            log_path: log,
            ..Default::default()
        })
        .await
        .unwrap();

    // Assert
    assert_eq!(found.total, 1);
    let record = &found.entries[0];
    assert_eq!(record.timestamp, 1_672_574_400);
    assert_eq!(record.ip, "10.0.0.1");
    assert_eq!(record.method, "POST");
    assert_eq!(record.path, "/submit");
    assert_eq!(record.status, 201);
    assert_eq!(record.bytes_sent, 512);
    assert_eq!(record.browser, "");
    assert_eq!(record.os, "");
    assert_eq!(record.device_type, "");

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unparseable_lines_are_skipped() {
    // Arrange
    let dir = LogDir::new();
    let (engine, log) =
        engine_with(&dir, &[COMMON_LINE, "not an access log line", CHROME_LINE]).await;

    // Act
    let found = engine
        .search_logs(QueryRequest {
            log_path: log,
            sort_order: "asc".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    // Assert
    let paths: Vec<&str> = found.entries.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["/submit", "/api/test"]);

    engine.shutdown().await.unwrap();
}
