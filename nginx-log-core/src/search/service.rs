use crate::conf::SearchConfig;
use crate::cursor::{CursorStore, LogIndexCursor};
use crate::index::{Query, SearchIndex, SearchRequest, SortField};
use crate::indexer::{CacheScope, record_from_document};
use crate::search::cache::{CachedPage, ResultCache, TierStats};
use crate::search::error::SearchError;
use crate::search::guard::SearchGuard;
use crate::search::query_builder::QueryBuilder;
use crate::search::request::{QueryRequest, QueryResult};
use crate::search::summary::{IndexFingerprint, SummaryCache, SummaryStats, compute_summary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::sync::Arc;
use std::time::Instant;

/// Stored fields a search response needs.
pub const RESPONSE_FIELDS: [&str; 20] = [
    "timestamp",
    "ip",
    "region_code",
    "province",
    "city",
    "method",
    "path",
    "protocol",
    "status",
    "bytes_sent",
    "referer",
    "user_agent",
    "browser",
    "browser_version",
    "os",
    "os_version",
    "device_type",
    "request_time",
    "upstream_time",
    "raw",
];

/// Client sort names and the index fields they map to.
const SORT_FIELDS: [(&str, &str); 15] = [
    ("timestamp", "timestamp"),
    ("time", "timestamp"),
    ("ip", "ip"),
    ("method", "method"),
    ("path", "path"),
    ("status", "status"),
    ("bytes_sent", "bytes_sent"),
    ("bytes", "bytes_sent"),
    ("request_time", "request_time"),
    ("upstream_time", "upstream_time"),
    ("browser", "browser"),
    ("os", "os"),
    ("device_type", "device_type"),
    ("device", "device_type"),
    ("referer", "referer"),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub results: TierStats,
    pub summaries: TierStats,
}

/// Unknown names sort by timestamp. Anything but `asc` sorts descending.
pub fn sort_field(sort_by: &str, sort_order: &str) -> SortField {
    let field = SORT_FIELDS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(sort_by.trim()))
        .map(|(_, field)| *field)
        .unwrap_or("timestamp");

    if sort_order.trim().eq_ignore_ascii_case("asc") {
        SortField::asc(field)
    } else {
        SortField::desc(field)
    }
}

/// Filtered log search with a page cache and a summary cache.
pub struct SearchService {
    index: Arc<dyn SearchIndex>,
    cursors: Arc<dyn CursorStore>,
    builder: QueryBuilder,
    results: ResultCache,
    summaries: SummaryCache,
    guard: SearchGuard,
    config: SearchConfig,
}

impl SearchService {
    pub fn new(
        index: Arc<dyn SearchIndex>,
        cursors: Arc<dyn CursorStore>,
        config: &SearchConfig,
        guard: SearchGuard,
    ) -> Self {
        Self {
            index,
            cursors,
            builder: QueryBuilder::new(config.max_time_range_days),
            results: ResultCache::new(config.result_cache_max_cost),
            summaries: SummaryCache::new(config.summary_cache_capacity, config.summary_ttl()),
            guard,
            config: config.clone(),
        }
    }

    pub fn query_builder(&self) -> &QueryBuilder {
        &self.builder
    }

    pub fn guard(&self) -> &SearchGuard {
        &self.guard
    }

    /// Run `f` on the blocking pool behind the guard and the request timeout.
    pub async fn guarded<T, F>(&self, f: F) -> Result<T, SearchError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, SearchError> + Send + 'static,
    {
        self.guard.admit()?;

        let limit = self.config.request_timeout();
        let result = match tokio::time::timeout(limit, tokio::task::spawn_blocking(f)).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(SearchError::Cancelled),
            Err(_) => Err(SearchError::RequestTimeout(limit)),
        };

        self.guard.record(&result);
        result
    }

    /// Guarded search on the blocking pool.
    pub async fn search_logs_async(
        self: &Arc<Self>,
        req: QueryRequest,
    ) -> Result<QueryResult, SearchError> {
        let service = self.clone();
        self.guarded(move || service.execute(&req)).await
    }

    /// Guarded search on the calling thread.
    pub fn search_logs(&self, req: &QueryRequest) -> Result<QueryResult, SearchError> {
        self.guard.admit()?;
        let result = self.execute(req);
        self.guard.record(&result);
        result
    }

    fn execute(&self, req: &QueryRequest) -> Result<QueryResult, SearchError> {
        let started = Instant::now();
        let query = self.builder.build(req);
        let limit = self.clamp_limit(req.limit);
        let sort = sort_field(&req.sort_by, &req.sort_order);
        let key = req.cache_key(limit, &sort.field, sort.descending);

        let (page, from_cache) = match self.results.get(&key) {
            Some(page) => (page, true),
            None => {
                let request = SearchRequest::new(query.clone())
                    .size(limit)
                    .offset(req.offset)
                    .sort(sort)
                    .fields(&RESPONSE_FIELDS);
                let found = self.index.search(&request)?;
                let page = CachedPage {
                    entries: Arc::new(
                        found
                            .hits
                            .iter()
                            .map(|hit| record_from_document(&hit.fields))
                            .collect(),
                    ),
                    total: found.total,
                };
                self.results.insert(&key, page.clone());
                (page, false)
            }
        };

        let summary = if req.skip_summary {
            SummaryStats::default()
        } else {
            self.summary(req, &query)?
        };

        let took_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(
            total = page.total,
            returned = page.entries.len(),
            from_cache,
            took_ms,
            "search completed"
        );

        Ok(QueryResult {
            entries: page.entries.as_ref().clone(),
            total: page.total,
            took_ms,
            summary,
            from_cache,
        })
    }

    /// Summary for the filters of `req`, served from cache while still valid.
    pub fn summary(&self, req: &QueryRequest, query: &Query) -> Result<SummaryStats, SearchError> {
        let key = SummaryCache::key(&req.filter_key());
        let fingerprint = self.fingerprint()?;

        if let Some(stats) = self.summaries.get(key, &fingerprint) {
            return Ok(stats);
        }

        let stats = compute_summary(self.index.as_ref(), query, self.config.page_size.max(1))?;
        self.summaries.insert(key, stats.clone(), fingerprint);
        Ok(stats)
    }

    fn fingerprint(&self) -> Result<IndexFingerprint, SearchError> {
        let doc_count = self.index.doc_count()?;
        let latest_mtime = match self.cursors.get_all() {
            Ok(cursors) => cursors.iter().filter_map(file_mtime).max(),
            Err(e) => {
                tracing::warn!(error = %e, "cannot read cursors for summary validation");
                None
            }
        };

        Ok(IndexFingerprint {
            doc_count,
            latest_mtime,
        })
    }

    fn clamp_limit(&self, limit: usize) -> usize {
        let requested = if limit == 0 {
            self.config.default_limit
        } else {
            limit
        };
        requested.min(self.config.max_limit)
    }

    pub fn invalidate(&self, scope: CacheScope) {
        self.summaries.clear();
        if scope == CacheScope::All {
            self.results.clear();
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            results: self.results.stats(),
            summaries: self.summaries.stats(),
        }
    }
}

/// Current mtime of a registered file, else what its last scan saw.
fn file_mtime(cursor: &LogIndexCursor) -> Option<DateTime<Utc>> {
    fs::metadata(&cursor.path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .ok()
        .or(cursor.last_modified)
}
