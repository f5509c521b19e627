use crate::index::Document;
use crate::parser::LogRecord;

pub const FIELD_FILE_PATH: &str = "file_path";
pub const FIELD_MAIN_LOG_PATH: &str = "main_log_path";
pub const FIELD_SOURCE_FILE: &str = "source_file";

/// `<path>_<startByteOffset>_<n>`; re-scanning the same range yields the same ids.
pub fn document_id(path: &str, start_position: u64, entry: u64) -> String {
    format!("{path}_{start_position}_{entry}")
}

/// Index document for one record of `source_file`, a member of the `main_log_path` group.
///
/// Blank text fields are left out.
pub fn log_document(record: &LogRecord, main_log_path: &str, source_file: &str) -> Document {
    let mut doc = Document::new()
        .with("timestamp", record.timestamp)
        .with("status", i64::from(record.status))
        .with("bytes_sent", record.bytes_sent)
        .with(FIELD_FILE_PATH, main_log_path)
        .with(FIELD_MAIN_LOG_PATH, main_log_path)
        .with(FIELD_SOURCE_FILE, source_file);

    for (field, value) in [
        ("ip", &record.ip),
        ("region_code", &record.region_code),
        ("province", &record.province),
        ("city", &record.city),
        ("method", &record.method),
        ("path", &record.path),
        ("protocol", &record.protocol),
        ("referer", &record.referer),
        ("user_agent", &record.user_agent),
        ("browser", &record.browser),
        ("browser_version", &record.browser_version),
        ("os", &record.os),
        ("os_version", &record.os_version),
        ("device_type", &record.device_type),
        ("raw", &record.raw),
    ] {
        if !value.is_empty() {
            doc.insert(field, value.as_str());
        }
    }

    if let Some(rt) = record.request_time {
        doc.insert("request_time", rt);
    }
    if let Some(ut) = record.upstream_time {
        doc.insert("upstream_time", ut);
    }

    doc
}

/// Rebuild a record from stored fields. Fields that were not requested stay blank.
pub fn record_from_document(doc: &Document) -> LogRecord {
    let text = |field: &str| doc.text(field).unwrap_or_default().to_string();

    LogRecord {
        timestamp: doc.number("timestamp").unwrap_or_default() as i64,
        ip: text("ip"),
        region_code: text("region_code"),
        province: text("province"),
        city: text("city"),
        method: text("method"),
        path: text("path"),
        protocol: text("protocol"),
        status: doc.number("status").unwrap_or_default() as u16,
        bytes_sent: doc.number("bytes_sent").unwrap_or_default() as i64,
        referer: text("referer"),
        user_agent: text("user_agent"),
        browser: text("browser"),
        browser_version: text("browser_version"),
        os: text("os"),
        os_version: text("os_version"),
        device_type: text("device_type"),
        request_time: doc.number("request_time"),
        upstream_time: doc.number("upstream_time"),
        raw: text("raw"),
    }
}
