use crate::index::Query;
use crate::indexer::FIELD_FILE_PATH;
use crate::parser::html_escape;
use crate::search::request::QueryRequest;

const SECONDS_PER_DAY: i64 = 86_400;

/// Turns request filters into an index query.
///
/// Sub-queries are added most selective first. One sub-query is returned
/// as is, several are combined with a conjunction, none matches everything.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    max_time_range_days: i64,
}

impl QueryBuilder {
    pub fn new(max_time_range_days: i64) -> Self {
        Self {
            max_time_range_days,
        }
    }

    pub fn build(&self, req: &QueryRequest) -> Query {
        let mut queries = Vec::new();

        if !req.log_path.is_empty() {
            queries.push(Query::term(FIELD_FILE_PATH, req.log_path.as_str()));
        }
        if !req.ip.is_empty() {
            queries.push(Query::term("ip", req.ip.trim()));
        }
        if let Some(q) = path_query(req.path.trim()) {
            queries.push(q);
        }
        if let Some(q) = status_query(&req.status) {
            queries.push(q);
        }
        if let Some(q) = self.time_query(req.start_time, req.end_time) {
            queries.push(q);
        }
        if !req.method.is_empty() {
            queries.push(Query::term("method", req.method.trim().to_ascii_uppercase()));
        }
        for (field, values) in [
            ("browser", &req.browser),
            ("os", &req.os),
            ("device_type", &req.device),
        ] {
            if let Some(q) = multi_value_query(field, values) {
                queries.push(q);
            }
        }
        if !req.user_agent.trim().is_empty() {
            queries.push(Query::matching("user_agent", req.user_agent.trim()));
        }
        if !req.referer.trim().is_empty() {
            queries.push(Query::matching("referer", req.referer.trim()));
        }
        if let Some(q) = text_query(&req.query) {
            queries.push(q);
        }

        Query::and(queries)
    }

    /// `[start, end]` in seconds, as a half-open range ending one second later.
    ///
    /// Needs both bounds. Spans of `max_time_range_days` or more are dropped.
    pub fn time_query(&self, start: Option<i64>, end: Option<i64>) -> Option<Query> {
        let (Some(start), Some(end)) = (start, end) else {
            return None;
        };
        if end < start {
            return None;
        }
        if end - start >= self.max_time_range_days * SECONDS_PER_DAY {
            tracing::debug!(
                start,
                end,
                max_days = self.max_time_range_days,
                "time range too wide, filter dropped"
            );
            return None;
        }
        Some(Query::range_half_open(
            "timestamp",
            start as f64,
            (end + 1) as f64,
        ))
    }
}

/// Paths are stored HTML-escaped, so literals are escaped the same way.
fn path_query(path: &str) -> Option<Query> {
    if path.is_empty() {
        return None;
    }
    let path = html_escape(path);
    let path = path.as_ref();

    if let Some(prefix) = path.strip_suffix('*') {
        if !has_wildcard(prefix) {
            return Some(Query::prefix("path", prefix));
        }
    }

    if has_wildcard(path) {
        return Some(Query::regexp("path", wildcard_to_regex(path)));
    }

    Some(Query::term("path", path))
}

fn has_wildcard(s: &str) -> bool {
    s.contains(['*', '?'])
}

/// `*` matches any run, `?` any single character; everything else is literal.
fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
        }
    }
    out
}

fn status_query(statuses: &[u16]) -> Option<Query> {
    let ranges: Vec<Query> = statuses
        .iter()
        .map(|s| Query::range_inclusive("status", f64::from(*s), f64::from(*s)))
        .collect();

    match ranges.len() {
        0 => None,
        _ => Some(Query::or(ranges)),
    }
}

fn multi_value_query(field: &str, values: &str) -> Option<Query> {
    let terms: Vec<Query> = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| Query::term(field, v))
        .collect();

    match terms.len() {
        0 => None,
        _ => Some(Query::or(terms)),
    }
}

fn text_query(text: &str) -> Option<Query> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let quoted = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .filter(|t| !t.trim().is_empty());

    Some(match quoted {
        Some(phrase) => Query::phrase("raw", phrase),
        None => Query::matching("raw", text),
    })
}
