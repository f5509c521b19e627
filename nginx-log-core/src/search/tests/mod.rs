mod guard_tests;

use crate::index::{Batch, IndexHandle, SearchIndex};
use crate::indexer::{document_id, log_document};
use crate::parser::LogRecord;

pub(super) const LOG: &str = "/var/log/nginx/access.log";

pub(super) fn record(ts: i64, ip: &str, path: &str, status: u16) -> LogRecord {
    LogRecord {
        timestamp: ts,
        ip: ip.to_string(),
        method: "GET".to_string(),
        path: path.to_string(),
        protocol: "HTTP/1.1".to_string(),
        status,
        bytes_sent: 100,
        browser: "Chrome".to_string(),
        os: "Windows 10".to_string(),
        device_type: "Desktop".to_string(),
        raw: format!("{ip} GET {path} {status}"),
        ..Default::default()
    }
}

pub(super) fn index_records(index: &IndexHandle, log: &str, records: &[LogRecord]) {
    let mut batch = Batch::new();
    for (i, r) in records.iter().enumerate() {
        batch.index(document_id(log, 0, i as u64), log_document(r, log, log));
    }
    index.execute(batch).unwrap();
}
