use crate::index::SearchIndex;
use crate::index::batch::{Batch, BatchOp};
use crate::index::error::IndexError;
use crate::index::mapping::IndexMapping;
use crate::index::query::{Hit, SearchRequest, SearchResult, SortField};
use crate::index::shard::{Candidate, Shard, compare_sort_values};
use ahash::RandomState;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tantivy::Searcher;
use tantivy::query::Query as TantivyQuery;

const SHARD_DIR_PREFIX: &str = "shard-";

/// Documents partitioned across tantivy shards by id hash.
///
/// Routing uses a fixed-seed hasher so a document lands on the same shard
/// across restarts. Every batch is committed before `execute` returns, so
/// what a caller saw succeed survives a crash.
pub struct ShardedIndex {
    shards: Vec<Shard>,
    data_dir: Option<PathBuf>,
    closed: AtomicBool,
}

/// Per-shard state of one search: a consistent searcher and the compiled query.
struct ShardSearch {
    searcher: Searcher,
    query: Box<dyn TantivyQuery>,
    total: u64,
}

impl ShardedIndex {
    pub fn in_memory(shard_count: usize, mapping: IndexMapping) -> Result<Self, IndexError> {
        let schema = Arc::new(mapping.schema());
        let shards = (0..shard_count.max(1))
            .map(|_| Shard::in_memory(schema.clone()))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            shards,
            data_dir: None,
            closed: AtomicBool::new(false),
        })
    }

    /// Open the index stored under `data_dir`, creating the directory when missing.
    ///
    /// An existing index keeps the shard count it was created with.
    pub fn open(
        data_dir: &Path,
        shard_count: usize,
        mapping: IndexMapping,
    ) -> Result<Self, IndexError> {
        fs::create_dir_all(data_dir).map_err(|e| IndexError::storage(data_dir, e))?;

        let existing = existing_shards(data_dir);
        let count = if existing > 0 && existing != shard_count {
            tracing::warn!(
                data_dir = %data_dir.display(),
                configured = shard_count,
                existing,
                "keeping the shard count the index was created with"
            );
            existing
        } else {
            shard_count.max(1)
        };

        let schema = Arc::new(mapping.schema());
        let shards: Vec<Shard> = (0..count)
            .into_par_iter()
            .map(|n| Shard::open(schema.clone(), &shard_dir(data_dir, n)))
            .collect::<Result<_, _>>()?;
        let documents: u64 = shards.iter().map(Shard::doc_count).sum();

        tracing::info!(
            data_dir = %data_dir.display(),
            shards = shards.len(),
            documents,
            "opened index"
        );
        Ok(Self {
            shards,
            data_dir: Some(data_dir.to_path_buf()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Release writers without committing. Later operations fail with `Closed`.
    pub fn discard(&self) {
        self.closed.store(true, Ordering::SeqCst);
        for shard in &self.shards {
            shard.discard();
        }
    }

    // Fixed seeds: routing must be stable across processes. Not security-sensitive.
    fn shard_for(&self, id: &str) -> usize {
        static HASHER: RandomState = RandomState::with_seeds(1, 2, 3, 4);
        (HASHER.hash_one(id) % self.shards.len() as u64) as usize
    }

    fn ensure_open(&self) -> Result<(), IndexError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(IndexError::Closed);
        }
        Ok(())
    }

    fn search_unsorted(
        &self,
        prepared: &[ShardSearch],
        request: &SearchRequest,
    ) -> Result<Vec<Candidate>, IndexError> {
        // Index order is shard order, then address order inside a shard.
        let mut skip = request.from as u64;
        let mut remaining = request.size;
        let mut out = Vec::with_capacity(remaining.min(1024));

        for (n, (shard, search)) in self.shards.iter().zip(prepared).enumerate() {
            if remaining == 0 {
                break;
            }
            if skip >= search.total {
                skip -= search.total;
                continue;
            }
            let hits = shard.collect_in_order(
                n,
                &search.searcher,
                search.query.as_ref(),
                skip as usize,
                remaining.min((search.total - skip) as usize),
            )?;
            remaining -= hits.len();
            skip = 0;
            out.extend(hits);
        }
        Ok(out)
    }

    fn search_sorted(
        &self,
        prepared: &[ShardSearch],
        request: &SearchRequest,
        sort: &SortField,
    ) -> Result<Vec<Candidate>, IndexError> {
        let window = request.from.saturating_add(request.size);

        let per_shard: Vec<Vec<Candidate>> = self
            .shards
            .par_iter()
            .zip(prepared.par_iter())
            .enumerate()
            .map(|(n, (shard, search))| {
                // Collectors allocate up to their limit.
                let limit = window.min(search.total as usize);
                shard.collect_sorted(n, &search.searcher, search.query.as_ref(), sort, limit)
            })
            .collect::<Result<_, _>>()?;

        let mut merged: Vec<Candidate> = per_shard.into_iter().flatten().collect();
        merged.sort_by(|a, b| {
            compare_sort_values(&a.value, &b.value, sort.descending)
                .then_with(|| a.position().cmp(&b.position()))
        });
        Ok(merged
            .into_iter()
            .skip(request.from)
            .take(request.size)
            .collect())
    }
}

impl SearchIndex for ShardedIndex {
    fn execute(&self, batch: Batch) -> Result<(), IndexError> {
        self.ensure_open()?;
        if batch.is_empty() {
            return Ok(());
        }

        let mut per_shard: Vec<Vec<BatchOp>> = vec![Vec::new(); self.shards.len()];
        for op in batch.into_ops() {
            per_shard[self.shard_for(op.id())].push(op);
        }

        self.shards
            .par_iter()
            .zip(per_shard.into_par_iter())
            .filter(|(_, ops)| !ops.is_empty())
            .try_for_each(|(shard, ops)| shard.apply(ops))
    }

    fn search(&self, request: &SearchRequest) -> Result<SearchResult, IndexError> {
        self.ensure_open()?;

        let prepared: Vec<ShardSearch> = self
            .shards
            .par_iter()
            .map(|shard| {
                let searcher = shard.searcher();
                let query = shard.compile(&request.query)?;
                let total = shard.count(&searcher, query.as_ref())?;
                Ok(ShardSearch {
                    searcher,
                    query,
                    total,
                })
            })
            .collect::<Result<_, IndexError>>()?;
        let total = prepared.iter().map(|s| s.total).sum();

        if request.size == 0 {
            return Ok(SearchResult {
                total,
                hits: Vec::new(),
            });
        }

        let candidates = match &request.sort {
            Some(sort) => self.search_sorted(&prepared, request, sort)?,
            None => self.search_unsorted(&prepared, request)?,
        };

        let hits = candidates
            .par_iter()
            .map(|c| {
                let searcher = &prepared[c.shard].searcher;
                let (id, fields) =
                    self.shards[c.shard].load(searcher, c.address, &request.fields)?;
                Ok(Hit { id, fields })
            })
            .collect::<Result<_, IndexError>>()?;

        Ok(SearchResult { total, hits })
    }

    fn doc_count(&self) -> Result<u64, IndexError> {
        self.ensure_open()?;
        Ok(self.shards.iter().map(Shard::doc_count).sum())
    }

    fn close(&self) -> Result<(), IndexError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        for shard in &self.shards {
            shard.close()?;
        }
        if let Some(dir) = &self.data_dir {
            tracing::info!(data_dir = %dir.display(), "index closed");
        }
        Ok(())
    }
}

fn shard_dir(data_dir: &Path, shard: usize) -> PathBuf {
    data_dir.join(format!("{SHARD_DIR_PREFIX}{shard}"))
}

/// Number of consecutive `shard-<n>` directories already under `data_dir`.
fn existing_shards(data_dir: &Path) -> usize {
    let mut count = 0;
    while shard_dir(data_dir, count).is_dir() {
        count += 1;
    }
    count
}
