use crate::parser::LogRecord;
use ahash::RandomState;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Estimated bytes per cached row.
const BYTES_PER_ENTRY: u64 = 500;
const ENTRY_OVERHEAD: u64 = 100;
/// A single page may take at most this share of the cache.
const MAX_ENTRY_SHARE: u64 = 100;

const SKETCH_DEPTH: usize = 4;
const SKETCH_MAX_COUNT: u8 = 15;
const ROW_SEEDS: [u64; SKETCH_DEPTH] = [
    0x9E37_79B9_7F4A_7C15,
    0xC2B2_AE3D_27D4_EB4F,
    0x1656_67B1_9E37_79F9,
    0x85EB_CA77_C2B2_AE63,
];

fn key_hash(key: &str) -> u64 {
    static HASHER: RandomState = RandomState::with_seeds(1, 2, 3, 4);
    HASHER.hash_one(key)
}

/// Count-min sketch of recent access frequency, halved periodically so old
/// popularity fades.
struct FrequencySketch {
    counters: Vec<u8>,
    width_mask: usize,
    additions: u64,
    sample_size: u64,
}

impl FrequencySketch {
    fn new(expected_items: usize) -> Self {
        let width = expected_items.clamp(64, 1 << 20).next_power_of_two();
        Self {
            counters: vec![0; width * SKETCH_DEPTH],
            width_mask: width - 1,
            additions: 0,
            sample_size: (width as u64) * 10,
        }
    }

    fn slot(&self, hash: u64, row: usize) -> usize {
        let mixed = (hash ^ ROW_SEEDS[row]).wrapping_mul(0x2545_F491_4F6C_DD1D);
        row * (self.width_mask + 1) + ((mixed >> 32) as usize & self.width_mask)
    }

    fn increment(&mut self, hash: u64) {
        for row in 0..SKETCH_DEPTH {
            let slot = self.slot(hash, row);
            if self.counters[slot] < SKETCH_MAX_COUNT {
                self.counters[slot] += 1;
            }
        }

        self.additions += 1;
        if self.additions >= self.sample_size {
            self.counters.iter_mut().for_each(|c| *c /= 2);
            self.additions /= 2;
        }
    }

    fn estimate(&self, hash: u64) -> u8 {
        (0..SKETCH_DEPTH)
            .map(|row| self.counters[self.slot(hash, row)])
            .min()
            .unwrap_or(0)
    }

    fn clear(&mut self) {
        self.counters.iter_mut().for_each(|c| *c = 0);
        self.additions = 0;
    }
}

/// A cached search page.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPage {
    pub entries: Arc<Vec<LogRecord>>,
    pub total: u64,
}

impl CachedPage {
    pub fn cost(&self) -> u64 {
        self.entries.len() as u64 * BYTES_PER_ENTRY + ENTRY_OVERHEAD
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Inserts refused by size or by admission.
    pub rejected: u64,
    pub entries: usize,
    pub cost: u64,
}

#[derive(Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    rejected: AtomicU64,
}

impl Counters {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn evicted(&self, n: u64) {
        self.evictions.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn reject(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, entries: usize, cost: u64) -> TierStats {
        TierStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            entries,
            cost,
        }
    }
}

struct Slot {
    page: CachedPage,
    cost: u64,
}

struct ResultInner {
    lru: LruCache<String, Slot>,
    sketch: FrequencySketch,
    cost: u64,
}

/// Cost-bounded page cache with frequency-based admission.
///
/// When full, a new page only displaces the least recently used one if it
/// has been requested at least as often.
pub struct ResultCache {
    inner: Mutex<ResultInner>,
    max_cost: u64,
    counters: Counters,
}

impl ResultCache {
    pub fn new(max_cost: u64) -> Self {
        let expected = (max_cost / (BYTES_PER_ENTRY * 10)).max(1) as usize;
        Self {
            inner: Mutex::new(ResultInner {
                lru: LruCache::unbounded(),
                sketch: FrequencySketch::new(expected),
                cost: 0,
            }),
            max_cost,
            counters: Counters::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<CachedPage> {
        let mut inner = self.inner.lock();
        inner.sketch.increment(key_hash(key));

        match inner.lru.get(key) {
            Some(slot) => {
                self.counters.hit();
                Some(slot.page.clone())
            }
            None => {
                self.counters.miss();
                None
            }
        }
    }

    /// Returns whether the page was stored.
    pub fn insert(&self, key: &str, page: CachedPage) -> bool {
        let cost = page.cost();
        if cost > self.max_cost / MAX_ENTRY_SHARE {
            self.counters.reject();
            return false;
        }

        let hash = key_hash(key);
        let mut inner = self.inner.lock();
        inner.sketch.increment(hash);

        if let Some(old) = inner.lru.pop(key) {
            inner.cost -= old.cost;
        }

        let candidate = inner.sketch.estimate(hash);
        while inner.cost + cost > self.max_cost {
            let Some((victim_key, _)) = inner.lru.peek_lru() else {
                break;
            };
            if inner.sketch.estimate(key_hash(victim_key)) > candidate {
                self.counters.reject();
                return false;
            }
            if let Some((_, victim)) = inner.lru.pop_lru() {
                inner.cost -= victim.cost;
                self.counters.evicted(1);
            }
        }

        inner.cost += cost;
        inner.lru.put(key.to_string(), Slot { page, cost });
        true
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let dropped = inner.lru.len() as u64;
        inner.lru.clear();
        inner.sketch.clear();
        inner.cost = 0;
        self.counters.evicted(dropped);
    }

    pub fn stats(&self) -> TierStats {
        let inner = self.inner.lock();
        self.counters.snapshot(inner.lru.len(), inner.cost)
    }
}
