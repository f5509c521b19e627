mod geo_tests;
mod window_tests;

use crate::analytics::AnalyticsService;
use crate::conf::SearchConfig;
use crate::index::{Batch, IndexHandle, SearchIndex};
use crate::indexer::{document_id, log_document};
use crate::parser::LogRecord;
use std::sync::Arc;

pub(super) const LOG: &str = "/var/log/nginx/access.log";
/// 2024-01-01T00:00:00Z
pub(super) const DAY1: i64 = 1_704_067_200;
/// 2024-01-02T00:00:00Z
pub(super) const DAY2: i64 = DAY1 + 86_400;

pub(super) fn visit(ts: i64, ip: &str, path: &str) -> LogRecord {
    LogRecord {
        timestamp: ts,
        ip: ip.to_string(),
        method: "GET".to_string(),
        path: path.to_string(),
        status: 200,
        bytes_sent: 10,
        browser: "Chrome".to_string(),
        os: "Windows".to_string(),
        device_type: "Desktop".to_string(),
        ..Default::default()
    }
}

pub(super) fn located(ts: i64, region: &str, province: &str, city: &str) -> LogRecord {
    LogRecord {
        region_code: region.to_string(),
        province: province.to_string(),
        city: city.to_string(),
        ..visit(ts, "8.8.8.8", "/")
    }
}

pub(super) fn index_with(log: &str, records: &[LogRecord]) -> (Arc<IndexHandle>, AnalyticsService) {
    let handle = Arc::new(IndexHandle::in_memory(3).unwrap());
    add(&handle, log, records);
    let index: Arc<dyn SearchIndex> = handle.clone();
    let config = SearchConfig {
        page_size: 2,
        ..SearchConfig::default()
    };
    (handle, AnalyticsService::new(index, &config))
}

pub(super) fn add(handle: &IndexHandle, log: &str, records: &[LogRecord]) {
    let mut batch = Batch::new();
    for (i, r) in records.iter().enumerate() {
        batch.index(document_id(log, 0, i as u64), log_document(r, log, log));
    }
    handle.execute(batch).unwrap();
}
