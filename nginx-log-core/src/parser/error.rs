use crate::error::ErrorCategory;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty line")]
    EmptyLine,

    #[error("unsupported log format")]
    UnsupportedFormat,

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("invalid status '{0}'")]
    InvalidStatus(String),
}

impl ParseError {
    /// Parse failures never fail the file they came from.
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Line
    }
}
