use crate::indexer::{FIELD_FILE_PATH, FIELD_SOURCE_FILE, log_document, record_from_document};
use crate::parser::LogRecord;
use pretty_assertions::assert_eq;

fn record() -> LogRecord {
    LogRecord {
        timestamp: 1_703_498_400,
        ip: "192.168.1.1".into(),
        method: "GET".into(),
        path: "/api/test".into(),
        protocol: "HTTP/1.1".into(),
        status: 200,
        bytes_sent: 1024,
        user_agent: "curl/8.0".into(),
        request_time: Some(0.123),
        raw: "raw line".into(),
        ..Default::default()
    }
}

#[test]
fn document_carries_group_and_source_paths() {
    let doc = log_document(&record(), "/logs/access.log", "/logs/access.log.1");

    assert_eq!(doc.text(FIELD_FILE_PATH), Some("/logs/access.log"));
    assert_eq!(doc.text(FIELD_SOURCE_FILE), Some("/logs/access.log.1"));
    assert_eq!(doc.number("status"), Some(200.0));
}

#[test]
fn blank_fields_are_not_stored() {
    let doc = log_document(&record(), "/logs/access.log", "/logs/access.log");

    assert!(doc.get("referer").is_none());
    assert!(doc.get("upstream_time").is_none());
    assert!(doc.get("browser").is_none());
}

#[test]
fn stored_document_converts_back_to_the_record() {
    let original = record();

    let restored = record_from_document(&log_document(&original, "/l", "/l"));

    assert_eq!(restored, original);
}
