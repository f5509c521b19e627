use crate::parser::LogRecord;
use crate::search::summary::SummaryStats;
use serde::{Deserialize, Serialize};

/// Filters, pagination and sort of a log search. Empty strings mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryRequest {
    /// Unix seconds, inclusive.
    pub start_time: Option<i64>,
    /// Unix seconds, inclusive.
    pub end_time: Option<i64>,
    /// Free text over the raw line. Wrap in double quotes for a phrase.
    pub query: String,
    pub ip: String,
    pub method: String,
    /// Exact path, `prefix*`, or a pattern with `*` / `?` wildcards.
    pub path: String,
    pub user_agent: String,
    pub referer: String,
    /// Comma-separated.
    pub browser: String,
    /// Comma-separated.
    pub os: String,
    /// Comma-separated.
    pub device: String,
    pub status: Vec<u16>,
    /// Main log path of the group to search.
    pub log_path: String,
    /// Zero uses the configured default.
    pub limit: usize,
    pub offset: usize,
    pub sort_by: String,
    /// `asc` or `desc` (default).
    pub sort_order: String,
    /// Return rows only; summary fields stay zero.
    pub skip_summary: bool,
}

impl QueryRequest {
    /// Stable key over every filter field, without pagination or sort.
    pub fn filter_key(&self) -> String {
        format!(
            "start={:?}|end={:?}|q={}|ip={}|method={}|path={}|ua={}|ref={}|browser={}|os={}|device={}|status={:?}|log={}",
            self.start_time,
            self.end_time,
            self.query,
            self.ip,
            self.method,
            self.path,
            self.user_agent,
            self.referer,
            self.browser,
            self.os,
            self.device,
            self.status,
            self.log_path,
        )
    }

    /// Result-cache key: filters plus pagination and sort.
    pub fn cache_key(&self, limit: usize, sort_field: &str, descending: bool) -> String {
        format!(
            "{}|limit={limit}|offset={}|sort={sort_field}|desc={descending}",
            self.filter_key(),
            self.offset
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub entries: Vec<LogRecord>,
    pub total: u64,
    pub took_ms: u64,
    pub summary: SummaryStats,
    pub from_cache: bool,
}
