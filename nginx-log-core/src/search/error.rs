use crate::error::ErrorCategory;
use crate::index::IndexError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search rate limit exceeded")]
    RateLimited,

    #[error("search circuit breaker is open")]
    CircuitOpen,

    #[error("search did not finish within {0:?}")]
    RequestTimeout(Duration),

    #[error("search was cancelled")]
    Cancelled,

    #[error(transparent)]
    Index(#[from] IndexError),
}

impl SearchError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Query
    }

    /// Whether the failure says something about the index rather than the caller.
    pub(crate) fn counts_against_breaker(&self) -> bool {
        matches!(self, SearchError::Index(_) | SearchError::RequestTimeout(_))
    }
}
