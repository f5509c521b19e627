use serde::Serialize;
use tokio::sync::broadcast;

pub const TOPIC_PROGRESS: &str = "nginx_log.index.progress";
pub const TOPIC_COMPLETE: &str = "nginx_log.index.complete";
pub const TOPIC_READY: &str = "nginx_log.index.ready";

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub log_path: String,
    /// 0–100
    pub progress: f64,
    pub stage: String,
    pub status: String,
    pub elapsed_ms: u64,
    pub estimated_remaining_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompleteEvent {
    pub log_path: String,
    pub success: bool,
    pub duration_ms: u64,
    pub total_lines: u64,
    pub indexed_size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadyEvent {
    pub log_path: String,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "topic", content = "payload")]
pub enum EngineEvent {
    #[serde(rename = "nginx_log.index.progress")]
    Progress(ProgressEvent),
    #[serde(rename = "nginx_log.index.complete")]
    Complete(CompleteEvent),
    #[serde(rename = "nginx_log.index.ready")]
    Ready(ReadyEvent),
}

impl EngineEvent {
    pub fn topic(&self) -> &'static str {
        match self {
            EngineEvent::Progress(_) => TOPIC_PROGRESS,
            EngineEvent::Complete(_) => TOPIC_COMPLETE,
            EngineEvent::Ready(_) => TOPIC_READY,
        }
    }

    pub fn log_path(&self) -> &str {
        match self {
            EngineEvent::Progress(e) => &e.log_path,
            EngineEvent::Complete(e) => &e.log_path,
            EngineEvent::Ready(e) => &e.log_path,
        }
    }
}

/// Process-wide publish/subscribe channel for indexing events.
///
/// Publishing never blocks. Slow subscribers see `RecvError::Lagged` and
/// miss events rather than stall the indexer.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: EngineEvent) {
        tracing::trace!(topic = event.topic(), log_path = event.log_path(), "publishing event");
        // No subscribers is not an error.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
