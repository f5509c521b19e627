//! Sharded full-text and numeric index over tantivy.
//!
//! Documents are routed to shards by a fixed-seed hash of their id. Each shard
//! is its own tantivy index, on disk or in RAM, committed after every batch.
//! Searches fan out across shards on the rayon pool and are merged and
//! re-paginated here.

mod analyzer;
mod batch;
mod document;
mod error;
mod handle;
mod mapping;
mod query;
mod shard;
mod sharded;

#[cfg(test)]
mod tests;

pub use analyzer::tokenize;
pub use batch::{Batch, BatchOp};
pub use document::{Document, FieldValue};
pub use error::IndexError;
pub use handle::IndexHandle;
pub use mapping::{FieldKind, IndexMapping};
pub use query::{Hit, MatchOperator, Query, SearchRequest, SearchResult, SortField};
pub use sharded::ShardedIndex;

/// Capability surface of the full-text index.
pub trait SearchIndex: Send + Sync {
    /// Apply every operation of `batch`. Operations on one id apply in order.
    fn execute(&self, batch: Batch) -> Result<(), IndexError>;

    fn search(&self, request: &SearchRequest) -> Result<SearchResult, IndexError>;

    fn doc_count(&self) -> Result<u64, IndexError>;

    /// Flush to storage and reject further operations.
    fn close(&self) -> Result<(), IndexError>;
}
