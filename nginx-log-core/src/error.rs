use serde::Serialize;

/// Blast radius of a failure.
///
/// Every error enum in the crate maps onto one of these so callers can decide
/// whether to absorb, skip, surface, or abort:
/// - `Line`: one log line was dropped; the file keeps going
/// - `File`: one file was skipped; the rest of the group keeps going
/// - `Group`: a whole log group failed; other groups keep going
/// - `Query`: a search request failed and is returned to the caller as-is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Line,
    File,
    Group,
    Query,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Line => "line",
            ErrorCategory::File => "file",
            ErrorCategory::Group => "group",
            ErrorCategory::Query => "query",
        }
    }
}
