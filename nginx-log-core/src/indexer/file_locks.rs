use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// One mutex per file path, created on first use and reused afterwards.
#[derive(Default)]
pub struct FileLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FileLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `path`.
    pub fn with_lock<T>(&self, path: &str, f: impl FnOnce() -> T) -> T {
        let mutex = self.mutex(path);
        let _guard = mutex.lock();
        f()
    }

    pub fn is_locked(&self, path: &str) -> bool {
        self.locks
            .get(path)
            .map(|m| m.is_locked())
            .unwrap_or(false)
    }

    fn mutex(&self, path: &str) -> Arc<Mutex<()>> {
        // Clone out of the map so the shard guard is released before blocking.
        self.locks
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }
}
