use crate::parser::error::ParseError;
use chrono::{DateTime, NaiveDateTime};
use std::borrow::Cow;

const NGINX_TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";
const PLAIN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ALLOWED_METHODS: &[&str] = &[
    "GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH", "TRACE", "CONNECT",
];
pub(crate) const UNKNOWN_METHOD: &str = "UNKNOWN";

/// Parse an access-log timestamp into Unix seconds.
///
/// Accepts `$time_local` (`25/Dec/2023:10:00:00 +0000`), RFC 3339,
/// `YYYY-MM-DD HH:MM:SS` (taken as UTC), and a Unix epoch in seconds.
pub fn parse_timestamp(raw: &str) -> Result<i64, ParseError> {
    let raw = raw.trim();

    let ts = DateTime::parse_from_str(raw, NGINX_TIME_FORMAT)
        .map(|dt| dt.timestamp())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.timestamp()))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, PLAIN_TIME_FORMAT).map(|dt| dt.and_utc().timestamp())
        })
        .ok()
        .or_else(|| raw.parse::<f64>().ok().map(|secs| secs as i64));

    match ts {
        Some(ts) if ts > 0 => Ok(ts),
        _ => Err(ParseError::InvalidTimestamp(raw.to_string())),
    }
}

/// Split `$request` into method, path, and protocol.
pub(crate) fn split_request(request: &str) -> (String, &str, &str) {
    let mut parts = request.split_whitespace();
    let method = normalize_method(parts.next().unwrap_or_default());
    let path = parts.next().unwrap_or_default();
    let protocol = parts.next().unwrap_or_default();
    (method, path, protocol)
}

pub(crate) fn normalize_method(raw: &str) -> String {
    let upper = raw.to_ascii_uppercase();
    if ALLOWED_METHODS.contains(&upper.as_str()) {
        upper
    } else {
        UNKNOWN_METHOD.to_string()
    }
}

pub(crate) fn parse_status(raw: &str) -> Result<u16, ParseError> {
    if raw == "-" {
        return Ok(0);
    }
    match raw.parse::<u16>() {
        Ok(status) if status <= 999 => Ok(status),
        _ => Err(ParseError::InvalidStatus(raw.to_string())),
    }
}

pub(crate) fn parse_bytes(raw: &str) -> i64 {
    raw.parse::<i64>().map(|b| b.max(0)).unwrap_or(0)
}

/// `-` and garbage yield `None`. Multi-upstream values (`0.050, 0.030`) keep the first.
pub(crate) fn parse_optional_float(raw: &str) -> Option<f64> {
    let first = raw.split([',', ':', ' ']).next()?.trim();
    if first.is_empty() || first == "-" {
        return None;
    }
    first.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

/// Cut `s` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

pub fn html_escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
