use crate::index::{IndexError, Query, SearchIndex, SearchRequest};
use crate::search::cache::{Counters, TierStats};
use ahash::{AHashSet, RandomState};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const SUMMARY_FIELDS: [&str; 3] = ["ip", "path", "bytes_sent"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub uv: u64,
    pub pv: u64,
    pub total_traffic: u64,
    pub unique_pages: u64,
    pub avg_traffic_per_pv: f64,
}

/// PV from a count-only query, the rest from paging `ip`, `path` and `bytes_sent`.
pub fn compute_summary(
    index: &dyn SearchIndex,
    query: &Query,
    page_size: usize,
) -> Result<SummaryStats, IndexError> {
    let pv = index.search(&SearchRequest::count(query.clone()))?.total;
    if pv == 0 {
        return Ok(SummaryStats::default());
    }

    let mut ips: AHashSet<String> = AHashSet::new();
    let mut pages: AHashSet<String> = AHashSet::new();
    let mut traffic = 0u64;
    let mut offset = 0usize;

    loop {
        let request = SearchRequest::new(query.clone())
            .size(page_size)
            .offset(offset)
            .fields(&SUMMARY_FIELDS);
        let page = index.search(&request)?;
        if page.hits.is_empty() {
            break;
        }

        for hit in &page.hits {
            if let Some(ip) = hit.fields.text("ip") {
                ips.insert(ip.to_string());
            }
            if let Some(path) = hit.fields.text("path") {
                pages.insert(path.to_string());
            }
            traffic += hit.fields.number("bytes_sent").unwrap_or(0.0).max(0.0) as u64;
        }

        offset += page.hits.len();
        if page.hits.len() < page_size {
            break;
        }
    }

    // Documents indexed between the count and the scan must not break UV <= PV.
    Ok(SummaryStats {
        uv: (ips.len() as u64).min(pv),
        pv,
        total_traffic: traffic,
        unique_pages: (pages.len() as u64).min(pv),
        avg_traffic_per_pv: traffic as f64 / pv as f64,
    })
}

/// What the index looked like when a summary was computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexFingerprint {
    pub doc_count: u64,
    /// Newest modification time among registered log files.
    pub latest_mtime: Option<DateTime<Utc>>,
}

struct SummaryEntry {
    stats: SummaryStats,
    fingerprint: IndexFingerprint,
    computed_at: Instant,
}

/// Summary statistics keyed by filter, valid while the index is unchanged.
///
/// An entry is served only when the document count matches, no registered
/// file changed since, and it is younger than the ttl. Stale entries are
/// removed on lookup.
pub struct SummaryCache {
    entries: DashMap<u64, SummaryEntry>,
    capacity: usize,
    ttl: Duration,
    counters: Counters,
}

impl SummaryCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            ttl,
            counters: Counters::default(),
        }
    }

    pub fn key(filter_key: &str) -> u64 {
        static HASHER: RandomState = RandomState::with_seeds(1, 2, 3, 4);
        HASHER.hash_one(filter_key)
    }

    pub fn get(&self, key: u64, current: &IndexFingerprint) -> Option<SummaryStats> {
        let valid = self.entries.get(&key).map(|entry| {
            let fresh = entry.computed_at.elapsed() < self.ttl;
            let same_count = entry.fingerprint.doc_count == current.doc_count;
            let files_unchanged = match (current.latest_mtime, entry.fingerprint.latest_mtime) {
                (Some(now), Some(then)) => now <= then,
                (Some(_), None) => false,
                (None, _) => true,
            };
            (fresh && same_count && files_unchanged).then(|| entry.stats.clone())
        });

        match valid {
            Some(Some(stats)) => {
                self.counters.hit();
                Some(stats)
            }
            Some(None) => {
                self.entries.remove(&key);
                self.counters.evicted(1);
                self.counters.miss();
                None
            }
            None => {
                self.counters.miss();
                None
            }
        }
    }

    pub fn insert(&self, key: u64, stats: SummaryStats, fingerprint: IndexFingerprint) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            SummaryEntry {
                stats,
                fingerprint,
                computed_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        let dropped = self.entries.len() as u64;
        self.entries.clear();
        self.counters.evicted(dropped);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> TierStats {
        self.counters.snapshot(self.entries.len(), self.entries.len() as u64)
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|e| e.computed_at)
            .map(|e| *e.key());
        if let Some(key) = oldest {
            self.entries.remove(&key);
            self.counters.evicted(1);
        }
    }
}
