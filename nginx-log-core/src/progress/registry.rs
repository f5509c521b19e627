use crate::events::EventBus;
use crate::progress::tracker::{PROGRESS_THROTTLE, ProgressSnapshot, ProgressTracker};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Trackers keyed by main log path.
pub struct ProgressRegistry {
    bus: EventBus,
    throttle: Duration,
    trackers: DashMap<String, Arc<ProgressTracker>>,
}

impl ProgressRegistry {
    pub fn new(bus: EventBus) -> Self {
        Self::with_throttle(bus, PROGRESS_THROTTLE)
    }

    pub fn with_throttle(bus: EventBus, throttle: Duration) -> Self {
        Self {
            bus,
            throttle,
            trackers: DashMap::new(),
        }
    }

    /// Fresh tracker for a new rebuild of `log_path`, replacing any previous one.
    pub fn begin(&self, log_path: &str) -> Arc<ProgressTracker> {
        let tracker = Arc::new(ProgressTracker::with_throttle(
            log_path,
            self.bus.clone(),
            self.throttle,
        ));
        self.trackers.insert(log_path.to_string(), tracker.clone());
        tracker
    }

    pub fn get(&self, log_path: &str) -> Option<Arc<ProgressTracker>> {
        self.trackers.get(log_path).map(|t| t.value().clone())
    }

    /// Existing tracker, or a new one when none is registered.
    pub fn get_or_create(&self, log_path: &str) -> Arc<ProgressTracker> {
        self.trackers
            .entry(log_path.to_string())
            .or_insert_with(|| {
                Arc::new(ProgressTracker::with_throttle(
                    log_path,
                    self.bus.clone(),
                    self.throttle,
                ))
            })
            .value()
            .clone()
    }

    pub fn remove(&self, log_path: &str) {
        self.trackers.remove(log_path);
    }

    /// Snapshots of every tracker whose group has not completed yet.
    pub fn active(&self) -> Vec<ProgressSnapshot> {
        let mut out: Vec<ProgressSnapshot> = self
            .trackers
            .iter()
            .filter(|t| !t.is_completed())
            .map(|t| t.snapshot())
            .collect();
        out.sort_by(|a, b| a.log_path.cmp(&b.log_path));
        out
    }

    pub fn clear(&self) {
        self.trackers.clear();
    }
}
