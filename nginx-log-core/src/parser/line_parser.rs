use crate::enrichment::{GeoEngine, UaEngine};
use crate::parser::error::ParseError;
use crate::parser::fields::{
    html_escape, parse_bytes, parse_optional_float, parse_status, parse_timestamp, split_request,
    truncate_chars,
};
use crate::parser::format::LogFormat;
use crate::parser::ip::{INVALID_IP, extract_real_ip};
use crate::parser::record::LogRecord;
use rayon::prelude::*;
use regex::Captures;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Batches smaller than this are parsed on the calling thread.
pub const PARALLEL_THRESHOLD: usize = 100;

const MAX_RAW_LENGTH: usize = 2048;
const MAX_PATH_LENGTH: usize = 2048;
const MAX_PROTOCOL_LENGTH: usize = 32;
const MAX_HEADER_LENGTH: usize = 2048;

/// Failures logged per batch; the rest are only counted.
const LOGGED_FAILURES_PER_BATCH: usize = 3;

pub struct LogParser {
    ua_engine: Option<UaEngine>,
    geo_engine: Option<GeoEngine>,
}

#[derive(Debug, Default)]
pub struct ParseOutcome {
    /// Successfully parsed records, in input order.
    pub records: Vec<LogRecord>,
    pub failed: usize,
}

impl LogParser {
    pub fn new(ua_engine: Option<UaEngine>, geo_engine: Option<GeoEngine>) -> Self {
        Self {
            ua_engine,
            geo_engine,
        }
    }

    /// Parser without enrichment collaborators.
    pub fn plain() -> Self {
        Self::new(None, None)
    }

    pub fn parse_line(&self, line: &str) -> Result<LogRecord, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(ParseError::EmptyLine);
        }

        for format in LogFormat::PRIORITY {
            if let Some(caps) = format.regex().captures(line) {
                return self.build_record(line, &caps);
            }
        }

        Err(ParseError::UnsupportedFormat)
    }

    /// Parse a batch, dropping failures. Order of the surviving records matches the input.
    pub fn parse_lines<S>(&self, lines: &[S]) -> ParseOutcome
    where
        S: AsRef<str> + Sync,
    {
        let failures = AtomicUsize::new(0);

        let slots: Vec<Option<LogRecord>> =
            if lines.len() < PARALLEL_THRESHOLD || rayon::current_num_threads() <= 1 {
                lines
                    .iter()
                    .map(|line| self.parse_counted(line.as_ref(), &failures))
                    .collect()
            } else {
                let mut slots: Vec<Option<LogRecord>> = Vec::with_capacity(lines.len());
                slots.resize_with(lines.len(), || None);

                // Each worker writes only its own slot; no locking on the output.
                slots
                    .par_iter_mut()
                    .zip(lines.par_iter())
                    .for_each(|(slot, line)| {
                        *slot = self.parse_counted(line.as_ref(), &failures);
                    });

                slots
            };

        let failed = failures.into_inner();
        if failed > LOGGED_FAILURES_PER_BATCH {
            tracing::debug!(
                failed,
                total = lines.len(),
                "batch had more parse failures than were logged"
            );
        }

        ParseOutcome {
            records: slots.into_iter().flatten().collect(),
            failed,
        }
    }

    fn parse_counted(&self, line: &str, failures: &AtomicUsize) -> Option<LogRecord> {
        match self.parse_line(line) {
            Ok(record) => Some(record),
            Err(err) => {
                let seen = failures.fetch_add(1, Ordering::Relaxed);
                if seen < LOGGED_FAILURES_PER_BATCH {
                    tracing::warn!(
                        error = %err,
                        line = truncate_chars(line, 200),
                        "failed to parse log line"
                    );
                }
                None
            }
        }
    }

    fn build_record(&self, line: &str, caps: &Captures<'_>) -> Result<LogRecord, ParseError> {
        let group = |name: &str| caps.name(name).map(|m| m.as_str());

        let timestamp = parse_timestamp(group("time").unwrap_or_default())?;
        let status = parse_status(group("status").unwrap_or("-"))?;
        let (method, path, protocol) = split_request(group("request").unwrap_or_default());

        let mut record = LogRecord {
            timestamp,
            ip: extract_real_ip(group("ip").unwrap_or_default()),
            method,
            path: html_escape(truncate_chars(path, MAX_PATH_LENGTH)).into_owned(),
            protocol: html_escape(truncate_chars(protocol, MAX_PROTOCOL_LENGTH)).into_owned(),
            status,
            bytes_sent: parse_bytes(group("bytes").unwrap_or("-")),
            referer: group("referer")
                .map(|r| truncate_chars(r, MAX_HEADER_LENGTH).to_string())
                .unwrap_or_default(),
            user_agent: group("ua")
                .map(|ua| truncate_chars(ua, MAX_HEADER_LENGTH).to_string())
                .unwrap_or_default(),
            request_time: group("rt").and_then(parse_optional_float),
            upstream_time: group("urt").and_then(parse_optional_float),
            raw: html_escape(truncate_chars(line, MAX_RAW_LENGTH)).into_owned(),
            ..Default::default()
        };

        // Only formats that carry a user agent get classified.
        if let (Some(engine), Some(ua)) = (&self.ua_engine, group("ua")) {
            let info = engine.classify(ua);
            record.browser = info.browser;
            record.browser_version = info.browser_version;
            record.os = info.os;
            record.os_version = info.os_version;
            record.device_type = info.device_type.as_str().to_string();
        }

        if let Some(geo) = &self.geo_engine {
            let info = (record.ip != INVALID_IP)
                .then(|| record.ip.parse::<IpAddr>().ok())
                .flatten()
                .and_then(|ip| geo.lookup(ip));
            if let Some(info) = info {
                record.region_code = info.region_code;
                record.province = info.province;
                record.city = info.city;
            }
        }

        Ok(record)
    }
}
