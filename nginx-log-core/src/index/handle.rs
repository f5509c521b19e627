use crate::index::SearchIndex;
use crate::index::batch::Batch;
use crate::index::error::IndexError;
use crate::index::mapping::IndexMapping;
use crate::index::query::{SearchRequest, SearchResult};
use crate::index::sharded::ShardedIndex;
use arc_swap::ArcSwap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Swappable reference to the live index.
///
/// Readers load the current index without locking; `recreate` swaps in a
/// fresh one. Callers still holding the old index get `IndexError::Closed`.
pub struct IndexHandle {
    current: ArcSwap<ShardedIndex>,
    data_dir: Option<PathBuf>,
    shard_count: usize,
}

impl IndexHandle {
    pub fn open(data_dir: Option<&Path>, shard_count: usize) -> Result<Self, IndexError> {
        let index = match data_dir {
            Some(dir) => ShardedIndex::open(dir, shard_count, IndexMapping::nginx_log())?,
            None => ShardedIndex::in_memory(shard_count, IndexMapping::nginx_log())?,
        };

        Ok(Self {
            current: ArcSwap::from_pointee(index),
            data_dir: data_dir.map(Path::to_path_buf),
            shard_count,
        })
    }

    pub fn in_memory(shard_count: usize) -> Result<Self, IndexError> {
        Self::open(None, shard_count)
    }

    pub fn current(&self) -> Arc<ShardedIndex> {
        self.current.load_full()
    }

    /// Drop the live index and its storage, then swap in an empty one.
    ///
    /// The old writers are released first so the directory can be reopened.
    pub fn recreate(&self) -> Result<(), IndexError> {
        self.current().discard();

        let fresh = match &self.data_dir {
            Some(dir) => {
                match fs::remove_dir_all(dir) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(IndexError::storage(dir, e)),
                }
                ShardedIndex::open(dir, self.shard_count, IndexMapping::nginx_log())?
            }
            None => ShardedIndex::in_memory(self.shard_count, IndexMapping::nginx_log())?,
        };

        self.current.store(Arc::new(fresh));
        tracing::info!("index recreated");
        Ok(())
    }
}

impl SearchIndex for IndexHandle {
    fn execute(&self, batch: Batch) -> Result<(), IndexError> {
        self.current.load().execute(batch)
    }

    fn search(&self, request: &SearchRequest) -> Result<SearchResult, IndexError> {
        self.current.load().search(request)
    }

    fn doc_count(&self) -> Result<u64, IndexError> {
        self.current.load().doc_count()
    }

    fn close(&self) -> Result<(), IndexError> {
        self.current.load().close()
    }
}
