//! Filtered log search, summary statistics, and their caches.

mod cache;
mod error;
mod guard;
mod query_builder;
mod request;
mod service;
mod summary;

#[cfg(test)]
mod tests;

pub use cache::{CachedPage, ResultCache, TierStats};
pub use error::SearchError;
pub use guard::{CircuitBreaker, CircuitBreakerParams, CircuitState, RateLimiter, SearchGuard};
pub use query_builder::QueryBuilder;
pub use request::{QueryRequest, QueryResult};
pub use service::{CacheStats, RESPONSE_FIELDS, SearchService, sort_field};
pub use summary::{IndexFingerprint, SummaryCache, SummaryStats, compute_summary};
