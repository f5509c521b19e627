//! Line parser for nginx access logs.
//!
//! Each line is matched against the known formats (widest first), split into
//! typed fields, and enriched with user-agent and geolocation data when those
//! collaborators are configured.
//!
//! Batches are parsed on the rayon pool. Every line owns a pre-allocated slot
//! in the output so results come back in input order without a sort pass or a
//! shared append.

mod error;
mod fields;
mod format;
mod ip;
mod line_parser;
mod record;

#[cfg(test)]
mod tests;

pub use error::ParseError;
pub use fields::{html_escape, parse_timestamp, truncate_chars};
pub use format::{LogFormat, detect_log_format};
pub use ip::{INVALID_IP, extract_real_ip, is_public_ip};
pub use line_parser::{LogParser, PARALLEL_THRESHOLD, ParseOutcome};
pub use record::LogRecord;
