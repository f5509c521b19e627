use serde::{Deserialize, Serialize};

/// One parsed access-log line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Unix seconds, UTC.
    pub timestamp: i64,
    pub ip: String,
    pub region_code: String,
    pub province: String,
    pub city: String,
    pub method: String,
    pub path: String,
    pub protocol: String,
    pub status: u16,
    pub bytes_sent: i64,
    pub referer: String,
    pub user_agent: String,
    pub browser: String,
    pub browser_version: String,
    pub os: String,
    pub os_version: String,
    pub device_type: String,
    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_time: Option<f64>,
    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_time: Option<f64>,
    /// The source line, HTML-escaped and truncated.
    pub raw: String,
}
