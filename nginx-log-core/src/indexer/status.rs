use crate::events::{EngineEvent, EventBus, ReadyEvent};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;

/// Which files and groups are being indexed right now.
///
/// Holders are counted per main log path. When the last holder of a group
/// releases, a `ready` event is published for it.
pub struct IndexingStatus {
    files: DashMap<String, String>,
    groups: DashMap<String, GroupHolders>,
    active: watch::Sender<usize>,
    bus: EventBus,
}

#[derive(Default)]
struct GroupHolders {
    count: usize,
    success: bool,
}

impl IndexingStatus {
    pub fn new(bus: EventBus) -> Self {
        let (active, _) = watch::channel(0);
        Self {
            files: DashMap::new(),
            groups: DashMap::new(),
            active,
            bus,
        }
    }

    pub fn is_indexing(&self, path: &str) -> bool {
        self.files.contains_key(path) || self.groups.contains_key(path)
    }

    pub fn any_indexing(&self) -> bool {
        !self.groups.is_empty()
    }

    pub fn indexing_files(&self) -> Vec<String> {
        let mut files: Vec<String> = self.files.iter().map(|e| e.key().clone()).collect();
        files.sort();
        files
    }

    /// Number of active groups, updated on every change.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.active.subscribe()
    }

    pub fn set_indexing(&self, path: &str, main_log_path: &str, indexing: bool) {
        if indexing {
            self.files.insert(path.to_string(), main_log_path.to_string());
            self.acquire(main_log_path);
        } else if self.files.remove(path).is_some() {
            self.release(main_log_path, false);
        }
    }

    /// Mark a file as indexing until the returned flag drops.
    pub fn begin_file(&self, path: &str, main_log_path: &str) -> IndexingFlag<'_> {
        self.files.insert(path.to_string(), main_log_path.to_string());
        self.acquire(main_log_path);
        IndexingFlag {
            status: self,
            file: Some(path.to_string()),
            group: main_log_path.to_string(),
            success: false,
        }
    }

    /// Mark a whole group as indexing until the returned flag drops.
    pub fn begin_group(&self, main_log_path: &str) -> IndexingFlag<'_> {
        self.acquire(main_log_path);
        IndexingFlag {
            status: self,
            file: None,
            group: main_log_path.to_string(),
            success: false,
        }
    }

    fn acquire(&self, group: &str) {
        match self.groups.entry(group.to_string()) {
            Entry::Occupied(mut entry) => entry.get_mut().count += 1,
            Entry::Vacant(entry) => {
                let _held = entry.insert(GroupHolders {
                    count: 1,
                    success: false,
                });
                self.active.send_modify(|active| *active += 1);
            }
        }
    }

    /// Drop one holder. The last one publishes `ready` and removes the group
    /// while still holding the entry, so a concurrent `acquire` either lands
    /// before the removal or starts a new round.
    fn release(&self, group: &str, success: bool) {
        let Entry::Occupied(mut entry) = self.groups.entry(group.to_string()) else {
            return;
        };
        let holders = entry.get_mut();
        holders.count = holders.count.saturating_sub(1);
        holders.success |= success;
        if holders.count > 0 {
            return;
        }

        self.bus.publish(EngineEvent::Ready(ReadyEvent {
            log_path: group.to_string(),
            success: holders.success,
        }));
        self.active.send_modify(|active| *active = active.saturating_sub(1));
        entry.remove();
    }
}

/// Clears its indexing mark on drop, on every exit path.
pub struct IndexingFlag<'a> {
    status: &'a IndexingStatus,
    file: Option<String>,
    group: String,
    success: bool,
}

impl IndexingFlag<'_> {
    pub fn succeeded(&mut self) {
        self.success = true;
    }
}

impl Drop for IndexingFlag<'_> {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            self.status.files.remove(file);
        }
        self.status.release(&self.group, self.success);
    }
}
