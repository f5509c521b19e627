use chrono::DateTime;
use flate2::Compression;
use flate2::write::GzEncoder;
use nginx_log_core::conf::EngineConfig;
use nginx_log_core::events::{CompleteEvent, EngineEvent};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use tokio::sync::broadcast::Receiver;

/// 2024-01-01T00:00:00Z
pub const DAY1: i64 = 1_704_067_200;
/// 2024-01-02T00:00:00Z
pub const DAY2: i64 = DAY1 + 86_400;

const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/91.0.4472.124 Safari/537.36";

/// A temporary directory of nginx log files, removed on drop.
pub struct LogDir {
    dir: TempDir,
}

impl LogDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().into_owned()
    }

    pub fn write(&self, name: &str, lines: &[String]) -> String {
        let path = self.path(name);
        fs::write(&path, joined(lines)).expect("failed to write log file");
        path
    }

    pub fn append(&self, path: &str, lines: &[String]) {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(path)
            .expect("failed to open log file");
        file.write_all(joined(lines).as_bytes())
            .expect("failed to append to log file");
    }

    pub fn write_gz(&self, name: &str, lines: &[String]) -> String {
        let path = self.path(name);
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(joined(lines).as_bytes())
            .expect("failed to compress log lines");
        fs::write(&path, encoder.finish().expect("failed to finish gzip stream"))
            .expect("failed to write gz log file");
        path
    }
}

impl Default for LogDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Combined-format line from a Chrome on Windows client at `ts` (Unix seconds, UTC).
pub fn access_line(ts: i64, ip: &str, path: &str, status: u16) -> String {
    let time = DateTime::from_timestamp(ts, 0)
        .expect("timestamp out of range")
        .format("%d/%b/%Y:%H:%M:%S +0000");
    format!(r#"{ip} - - [{time}] "GET {path} HTTP/1.1" {status} 512 "-" "{CHROME_WINDOWS}""#)
}

/// In-memory engine whose whitelist is `root`, with small worker and shard counts.
pub fn test_config(root: &Path) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.whitelist = vec![root.to_path_buf()];
    config.index.data_dir = None;
    config.index.cursor_file = None;
    config.index.shard_count = 2;
    config.index.worker_pool_size = 2;
    config
}

/// Completion events received so far.
pub fn completions(rx: &mut Receiver<EngineEvent>) -> Vec<CompleteEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let EngineEvent::Complete(complete) = event {
            out.push(complete);
        }
    }
    out
}

fn joined(lines: &[String]) -> String {
    lines.iter().map(|l| format!("{l}\n")).collect()
}
