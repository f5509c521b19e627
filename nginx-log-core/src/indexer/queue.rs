use crate::conf::QueueConfig;
use crate::indexer::error::IndexerError;
use crate::indexer::log_indexer::{GroupOutcome, Indexer};
use crate::indexer::streaming::FileOutcome;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio::time::{Instant, sleep_until, timeout};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// Scan one file from its cursor.
    Incremental(String),
    /// Rebuild the group of a main log path.
    FullGroup(String),
}

impl TaskKind {
    fn key(&self) -> &str {
        match self {
            TaskKind::Incremental(path) | TaskKind::FullGroup(path) => path,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TaskOutput {
    File(FileOutcome),
    Group(GroupOutcome),
}

pub type TaskResult = Result<TaskOutput, IndexerError>;

struct IndexTask {
    kind: TaskKind,
    /// Skips debouncing and the minimum reindex interval.
    immediate: bool,
    respond: Option<oneshot::Sender<TaskResult>>,
}

struct Pending {
    task: IndexTask,
    due: Instant,
}

#[derive(Debug, Clone)]
struct QueueTimings {
    debounce: Duration,
    min_interval: Duration,
    submit_timeout: Duration,
    response_timeout: Duration,
}

/// Async front of the indexer.
///
/// A single dispatcher drains the task channel, debounces repeated
/// submissions per file, keeps at most one task per file active, and hands
/// work to a bounded pool of blocking workers.
pub struct IndexQueue {
    indexer: Arc<Indexer>,
    tx: mpsc::Sender<IndexTask>,
    cancel: CancellationToken,
    tasks: TaskTracker,
    timings: QueueTimings,
}

impl IndexQueue {
    /// Start the dispatcher on the current runtime.
    pub fn start(indexer: Arc<Indexer>, config: &QueueConfig, workers: usize) -> Self {
        let (tx, rx) = mpsc::channel(config.capacity.max(1));
        let cancel = CancellationToken::new();
        let tasks = TaskTracker::new();
        let timings = QueueTimings {
            debounce: config.debounce(),
            min_interval: config.min_reindex_interval(),
            submit_timeout: config.submit_timeout(),
            response_timeout: config.response_timeout(),
        };

        let dispatcher = Dispatcher {
            indexer: indexer.clone(),
            workers: Arc::new(Semaphore::new(workers.max(1))),
            cancel: cancel.clone(),
            tasks: tasks.clone(),
            timings: timings.clone(),
            pending: HashMap::new(),
            active: HashSet::new(),
            waiting: HashMap::new(),
            last_success: HashMap::new(),
        };
        tasks.spawn(dispatcher.run(rx));

        tracing::debug!(capacity = config.capacity, workers, "index queue started");
        Self {
            indexer,
            tx,
            cancel,
            tasks,
            timings,
        }
    }

    /// Index new lines of `path` now and wait for the outcome.
    pub async fn index_log_file(&self, path: &str) -> Result<FileOutcome, IndexerError> {
        match self
            .submit_and_wait(TaskKind::Incremental(path.to_string()), true)
            .await?
        {
            TaskOutput::File(outcome) => Ok(outcome),
            TaskOutput::Group(_) => unreachable!("incremental task produced a group outcome"),
        }
    }

    /// Schedule a debounced incremental scan without waiting. Never blocks.
    pub fn submit_incremental(&self, path: &str) -> Result<(), IndexerError> {
        let task = IndexTask {
            kind: TaskKind::Incremental(path.to_string()),
            immediate: false,
            respond: None,
        };
        self.tx.try_send(task).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => IndexerError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => IndexerError::ShuttingDown,
        })
    }

    /// Rebuild the group of `main_log_path` and wait for the outcome.
    pub async fn index_log_file_full(
        &self,
        main_log_path: &str,
    ) -> Result<GroupOutcome, IndexerError> {
        match self
            .submit_and_wait(TaskKind::FullGroup(main_log_path.to_string()), true)
            .await?
        {
            TaskOutput::Group(outcome) => Ok(outcome),
            TaskOutput::File(_) => unreachable!("group task produced a file outcome"),
        }
    }

    /// Queue a group rebuild and register it on `group` so the caller can
    /// `close()` and `wait()` for it together with other rebuilds.
    pub async fn force_reindex_file_group(
        &self,
        main_log_path: &str,
        group: &TaskTracker,
    ) -> Result<(), IndexerError> {
        let (respond, response) = oneshot::channel();
        self.submit(IndexTask {
            kind: TaskKind::FullGroup(main_log_path.to_string()),
            immediate: true,
            respond: Some(respond),
        })
        .await?;

        let main_log_path = main_log_path.to_string();
        group.spawn(async move {
            match response.await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::warn!(
                    main_log_path = %main_log_path,
                    error = %e,
                    "queued group rebuild failed"
                ),
                Err(_) => tracing::warn!(
                    main_log_path = %main_log_path,
                    "queued group rebuild was dropped"
                ),
            }
        });
        Ok(())
    }

    /// Reset the index and cursors, then rebuild every known group through the queue.
    ///
    /// A failing group does not stop the others.
    pub async fn rebuild_index(&self) -> Result<Vec<String>, IndexerError> {
        let indexer = self.indexer.clone();
        let plan = tokio::task::spawn_blocking(move || indexer.prepare_rebuild())
            .await
            .map_err(|_| IndexerError::ShuttingDown)??;

        let group = TaskTracker::new();
        for main_log_path in &plan.groups {
            self.force_reindex_file_group(main_log_path, &group).await?;
        }
        group.close();
        group.wait().await;

        tracing::info!(groups = plan.groups.len(), "index rebuild finished");
        Ok(plan.groups)
    }

    /// Stop accepting work, cancel in-flight scans at the next line, and wait for workers.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tasks.close();
        self.tasks.wait().await;
        tracing::debug!("index queue stopped");
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    async fn submit(&self, task: IndexTask) -> Result<(), IndexerError> {
        if self.cancel.is_cancelled() {
            return Err(IndexerError::ShuttingDown);
        }
        match timeout(self.timings.submit_timeout, self.tx.send(task)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(IndexerError::ShuttingDown),
            Err(_) => Err(IndexerError::Timeout(self.timings.submit_timeout)),
        }
    }

    async fn submit_and_wait(&self, kind: TaskKind, immediate: bool) -> TaskResult {
        let (respond, response) = oneshot::channel();
        self.submit(IndexTask {
            kind,
            immediate,
            respond: Some(respond),
        })
        .await?;

        match timeout(self.timings.response_timeout, response).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(IndexerError::ShuttingDown),
            Err(_) => Err(IndexerError::Timeout(self.timings.response_timeout)),
        }
    }
}

struct Dispatcher {
    indexer: Arc<Indexer>,
    workers: Arc<Semaphore>,
    cancel: CancellationToken,
    tasks: TaskTracker,
    timings: QueueTimings,
    /// Debounced tasks by key.
    pending: HashMap<String, Pending>,
    active: HashSet<String>,
    /// Tasks for keys that already have an active task, in arrival order.
    waiting: HashMap<String, VecDeque<IndexTask>>,
    last_success: HashMap<String, Instant>,
}

impl Dispatcher {
    async fn run(mut self, mut rx: mpsc::Receiver<IndexTask>) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(String, bool)>();

        loop {
            let next_due = self.pending.values().map(|p| p.due).min();

            tokio::select! {
                _ = self.cancel.cancelled() => break,

                task = rx.recv() => match task {
                    Some(task) if task.immediate => self.enqueue(task, &done_tx),
                    Some(task) => self.debounce(task),
                    None => break,
                },

                Some((key, success)) = done_rx.recv() => {
                    self.active.remove(&key);
                    if success {
                        self.last_success.insert(key.clone(), Instant::now());
                    }
                    let next = self.waiting.get_mut(&key).and_then(VecDeque::pop_front);
                    if self.waiting.get(&key).is_some_and(VecDeque::is_empty) {
                        self.waiting.remove(&key);
                    }
                    if let Some(task) = next {
                        self.start(task, &done_tx);
                    }
                },

                _ = sleep_until(next_due.unwrap_or_else(Instant::now)), if next_due.is_some() => {
                    self.release_due(&done_tx);
                },
            }
        }

        // Dropping queued responders tells their callers the queue shut down.
        let dropped = self.pending.len() + self.waiting.values().map(VecDeque::len).sum::<usize>();
        if dropped > 0 {
            tracing::info!(dropped, "discarding queued index tasks on shutdown");
        }
    }

    /// A newer submission for the same key replaces the pending one and restarts its timer.
    fn debounce(&mut self, task: IndexTask) {
        let key = task.kind.key().to_string();
        let due = Instant::now() + self.timings.debounce;

        match self.pending.get_mut(&key) {
            Some(pending) => {
                pending.task = task;
                pending.due = due;
                tracing::trace!(path = %key, "debounced index task");
            }
            None => {
                self.pending.insert(key, Pending { task, due });
            }
        }
    }

    fn release_due(&mut self, done_tx: &mpsc::UnboundedSender<(String, bool)>) {
        let now = Instant::now();
        let due: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, p)| p.due <= now)
            .map(|(k, _)| k.clone())
            .collect();

        for key in due {
            // A recent successful scan pushes the task out to the minimum interval.
            let earliest = self
                .last_success
                .get(&key)
                .map(|at| *at + self.timings.min_interval);
            if let Some(earliest) = earliest {
                if earliest > now {
                    if let Some(pending) = self.pending.get_mut(&key) {
                        pending.due = earliest;
                    }
                    continue;
                }
            }

            if let Some(pending) = self.pending.remove(&key) {
                self.enqueue(pending.task, done_tx);
            }
        }
    }

    fn enqueue(&mut self, task: IndexTask, done_tx: &mpsc::UnboundedSender<(String, bool)>) {
        let key = task.kind.key().to_string();
        if self.active.contains(&key) {
            self.waiting.entry(key).or_default().push_back(task);
        } else {
            self.start(task, done_tx);
        }
    }

    fn start(&mut self, task: IndexTask, done_tx: &mpsc::UnboundedSender<(String, bool)>) {
        let key = task.kind.key().to_string();
        self.active.insert(key.clone());

        let indexer = self.indexer.clone();
        let workers = self.workers.clone();
        let cancel = self.cancel.child_token();
        let done_tx = done_tx.clone();

        self.tasks.spawn(async move {
            let Ok(_permit) = workers.acquire_owned().await else {
                let _ = done_tx.send((key, false));
                return;
            };

            let kind = task.kind.clone();
            let joined =
                tokio::task::spawn_blocking(move || run_task(&indexer, &kind, &cancel)).await;

            let success = match joined {
                Ok(result) => {
                    let success = result.is_ok();
                    if let Some(respond) = task.respond {
                        let _ = respond.send(result);
                    }
                    success
                }
                Err(e) => {
                    tracing::error!(path = %key, error = %e, "index worker panicked");
                    false
                }
            };
            let _ = done_tx.send((key, success));
        });
    }
}

fn run_task(indexer: &Indexer, kind: &TaskKind, cancel: &CancellationToken) -> TaskResult {
    match kind {
        TaskKind::Incremental(path) => indexer
            .index_log_file(path, cancel)
            .map(TaskOutput::File)
            .inspect_err(|e| tracing::warn!(path = %path, error = %e, "incremental index failed")),
        TaskKind::FullGroup(main_log_path) => indexer
            .index_log_file_full(main_log_path, cancel)
            .map(TaskOutput::Group),
    }
}
