mod document_tests;
mod status_tests;

use crate::cursor::{CursorStore, MemoryCursorStore};
use crate::discovery::AccessPolicy;
use crate::events::{EngineEvent, EventBus};
use crate::index::{IndexHandle, Query, SearchIndex, SearchRequest};
use crate::indexer::{Indexer, IndexerSettings, IndexingStatus, InvalidationHook};
use crate::parser::LogParser;
use crate::progress::ProgressRegistry;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::broadcast::Receiver;

pub(super) struct Fixture {
    pub dir: TempDir,
    pub bus: EventBus,
    pub index: Arc<IndexHandle>,
    pub cursors: Arc<MemoryCursorStore>,
    pub indexer: Arc<Indexer>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::build(|_| AccessPolicy::allow_all(u64::MAX), None)
    }

    pub fn with_hook(hook: InvalidationHook) -> Self {
        Self::build(|_| AccessPolicy::allow_all(u64::MAX), Some(hook))
    }

    pub fn with_policy(policy: impl FnOnce(&Path) -> AccessPolicy) -> Self {
        Self::build(policy, None)
    }

    fn build(policy: impl FnOnce(&Path) -> AccessPolicy, hook: Option<InvalidationHook>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let bus = EventBus::new();
        let index = Arc::new(IndexHandle::in_memory(3).unwrap());
        let cursors = Arc::new(MemoryCursorStore::new());
        let indexer = Indexer::new(
            index.clone(),
            cursors.clone(),
            Arc::new(LogParser::plain()),
            policy(dir.path()),
            Arc::new(ProgressRegistry::new(bus.clone())),
            Arc::new(IndexingStatus::new(bus.clone())),
            small_settings(),
        );
        let indexer = match hook {
            Some(hook) => indexer.with_invalidation_hook(hook),
            None => indexer,
        };

        Self {
            dir,
            bus,
            index,
            cursors,
            indexer: Arc::new(indexer),
        }
    }

    pub fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().into_owned()
    }

    pub fn write(&self, name: &str, lines: &[String]) -> String {
        let path = self.path(name);
        fs::write(&path, joined(lines)).unwrap();
        path
    }

    pub fn append(&self, path: &str, lines: &[String]) {
        let mut file = fs::OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(joined(lines).as_bytes()).unwrap();
    }

    pub fn write_gz(&self, name: &str, lines: &[String]) -> String {
        let path = self.path(name);
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(joined(lines).as_bytes()).unwrap();
        fs::write(&path, encoder.finish().unwrap()).unwrap();
        path
    }

    pub fn count(&self, field: &str, value: &str) -> u64 {
        self.index
            .search(&SearchRequest::count(Query::term(field, value)))
            .unwrap()
            .total
    }

    pub fn position(&self, path: &str) -> u64 {
        self.cursors.get(path).unwrap().last_position
    }

    pub fn dir_path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }
}

/// Small enough that every batching path runs on a handful of lines.
pub(super) fn small_settings() -> IndexerSettings {
    IndexerSettings {
        batch_size: 7,
        scan_buffer_lines: 10,
        progress_every_lines: 5,
        page_size: 13,
    }
}

/// Combined-format line `n`, one second apart.
pub(super) fn line(n: usize) -> String {
    format!(
        r#"10.0.{}.{} - - [25/Dec/2023:10:{:02}:{:02} +0000] "GET /page/{} HTTP/1.1" 200 512 "-" "curl/8.0""#,
        n / 250,
        n % 250 + 1,
        (n / 60) % 60,
        n % 60,
        n
    )
}

pub(super) fn lines(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(line).collect()
}

fn joined(lines: &[String]) -> String {
    lines.iter().map(|l| format!("{l}\n")).collect()
}

pub(super) fn drain(rx: &mut Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}
