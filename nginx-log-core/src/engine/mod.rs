//! Engine lifecycle: builds every component from an `EngineConfig`, exposes
//! the inbound API, and tears down in dependency order.


use crate::analytics::{
    AnalyticsService, DashboardAnalytics, DashboardQueryRequest, ProvinceStat, RegionStat,
};
use crate::conf::{EngineConfig, validate};
use crate::cursor::{CursorStats, CursorStore, JsonCursorStore, MemoryCursorStore};
use crate::discovery::AccessPolicy;
use crate::enrichment::{GeoEngine, UaEngine, build_geo_engine, build_ua_engine};
use crate::events::{EngineEvent, EventBus};
use crate::index::{IndexHandle, SearchIndex};
use crate::indexer::{
    CacheScope, CleanupReport, FileOutcome, GroupOutcome, IndexQueue, Indexer, IndexerError,
    IndexerSettings, IndexingStatus,
};
use crate::parser::{LogFormat, LogParser, detect_log_format};
use crate::progress::{ProgressRegistry, ProgressSnapshot};
use crate::search::{CacheStats, QueryRequest, QueryResult, SearchError, SearchGuard, SearchService};
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

/// External capabilities handed to the engine. Missing pieces fall back to
/// what the configuration describes.
#[derive(Default)]
pub struct Collaborators {
    pub ua: Option<UaEngine>,
    pub geo: Option<GeoEngine>,
    pub cursor_store: Option<Arc<dyn CursorStore>>,
}

impl Collaborators {
    /// User-agent and geoip engines as configured in `enrichment`.
    pub fn from_config(config: &EngineConfig) -> anyhow::Result<Self> {
        let enrichment = &config.enrichment;
        Ok(Self {
            ua: enrichment
                .enable_user_agent
                .then(|| build_ua_engine(enrichment.ua_engine)),
            geo: build_geo_engine(enrichment)?,
            cursor_store: None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexStats {
    #[serde(flatten)]
    pub cursors: CursorStats,
    pub doc_count: u64,
}

pub struct Engine {
    id: Uuid,
    bus: EventBus,
    index: Arc<IndexHandle>,
    cursors: Arc<dyn CursorStore>,
    indexer: Arc<Indexer>,
    queue: IndexQueue,
    search: Arc<SearchService>,
    analytics: Arc<AnalyticsService>,
}

impl Engine {
    /// Wire every component. Must be called inside a tokio runtime.
    pub fn init(config: EngineConfig, collaborators: Collaborators) -> anyhow::Result<Self> {
        validate(&config).context("invalid engine configuration")?;
        let id = Uuid::new_v4();
        let bus = EventBus::new();

        let cursors: Arc<dyn CursorStore> =
            match (collaborators.cursor_store, &config.index.cursor_file) {
                (Some(store), _) => store,
                (None, Some(path)) => {
                    let store = JsonCursorStore::open(path).with_context(|| {
                        format!("failed to open cursor store {}", path.display())
                    })?;
                    Arc::new(store)
                }
                (None, None) => Arc::new(MemoryCursorStore::new()),
            };

        let index = Arc::new(
            IndexHandle::open(config.index.data_dir.as_deref(), config.index.shard_count)
                .context("failed to open index")?,
        );
        let shared: Arc<dyn SearchIndex> = index.clone();

        let search = Arc::new(SearchService::new(
            shared.clone(),
            cursors.clone(),
            &config.search,
            SearchGuard::new(&config.rate_limit, &config.circuit_breaker),
        ));
        let analytics = Arc::new(AnalyticsService::new(shared, &config.search));

        let invalidate = search.clone();
        let indexer = Arc::new(
            Indexer::new(
                index.clone(),
                cursors.clone(),
                Arc::new(LogParser::new(collaborators.ua, collaborators.geo)),
                AccessPolicy::new(&config.whitelist, config.index.max_file_size_bytes),
                Arc::new(ProgressRegistry::new(bus.clone())),
                Arc::new(IndexingStatus::new(bus.clone())),
                IndexerSettings::from_config(&config),
            )
            .with_invalidation_hook(Arc::new(move |scope: CacheScope| {
                invalidate.invalidate(scope)
            })),
        );

        let queue = IndexQueue::start(
            indexer.clone(),
            &config.queue,
            config.index.worker_pool_size,
        );

        tracing::info!(
            engine_id = %id,
            shards = config.index.shard_count,
            workers = config.index.worker_pool_size,
            persistent = config.index.data_dir.is_some(),
            "engine initialized"
        );

        Ok(Self {
            id,
            bus,
            index,
            cursors,
            indexer,
            queue,
            search,
            analytics,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.bus.subscribe()
    }

    pub fn status(&self) -> &Arc<IndexingStatus> {
        self.indexer.status()
    }

    /// Groups with a rebuild in flight.
    pub fn progress(&self) -> Vec<ProgressSnapshot> {
        self.indexer.progress().active()
    }

    //-------------------------------------------------------------------------
    // Search
    //-------------------------------------------------------------------------

    pub async fn search_logs(&self, req: QueryRequest) -> Result<QueryResult, SearchError> {
        self.search.search_logs_async(req).await
    }

    pub async fn get_dashboard_analytics(
        &self,
        req: DashboardQueryRequest,
    ) -> Result<DashboardAnalytics, SearchError> {
        let analytics = self.analytics.clone();
        self.search
            .guarded(move || Ok(analytics.dashboard(&req)?))
            .await
    }

    pub async fn world_map(
        &self,
        req: DashboardQueryRequest,
    ) -> Result<Vec<RegionStat>, SearchError> {
        let analytics = self.analytics.clone();
        self.search
            .guarded(move || Ok(analytics.world_map(&req)?))
            .await
    }

    pub async fn china_map(
        &self,
        req: DashboardQueryRequest,
    ) -> Result<Vec<ProvinceStat>, SearchError> {
        let analytics = self.analytics.clone();
        self.search
            .guarded(move || Ok(analytics.china_map(&req)?))
            .await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.search.cache_stats()
    }

    //-------------------------------------------------------------------------
    // Indexing
    //-------------------------------------------------------------------------

    pub async fn index_log_file(&self, path: &str) -> Result<FileOutcome, IndexerError> {
        self.queue.index_log_file(path).await
    }

    /// Debounced background indexing, e.g. from a file watcher.
    pub fn notify_file_changed(&self, path: &str) -> Result<(), IndexerError> {
        self.queue.submit_incremental(path)
    }

    pub async fn index_log_file_full(
        &self,
        main_log_path: &str,
    ) -> Result<GroupOutcome, IndexerError> {
        self.queue.index_log_file_full(main_log_path).await
    }

    /// Queue a group rebuild and wait for it to finish.
    pub async fn force_reindex_file_group(&self, main_log_path: &str) -> Result<(), IndexerError> {
        let group = TaskTracker::new();
        self.queue.force_reindex_file_group(main_log_path, &group).await?;
        group.close();
        group.wait().await;
        Ok(())
    }

    /// Reset everything and rebuild every known group. Returns the groups.
    pub async fn rebuild_index(&self) -> Result<Vec<String>, IndexerError> {
        self.queue.rebuild_index().await
    }

    pub async fn delete_file_index(&self, path: &str) -> Result<u64, IndexerError> {
        let path = path.to_string();
        self.blocking(move |indexer| indexer.delete_file_index(&path)).await
    }

    pub async fn delete_log_group_from_index(
        &self,
        main_log_path: &str,
    ) -> Result<u64, IndexerError> {
        let main_log_path = main_log_path.to_string();
        self.blocking(move |indexer| indexer.delete_log_group_from_index(&main_log_path))
            .await
    }

    pub async fn delete_all_indexes(&self) -> Result<(), IndexerError> {
        self.blocking(|indexer| indexer.delete_all_indexes()).await
    }

    pub async fn cleanup_orphaned_indexes(&self) -> Result<CleanupReport, IndexerError> {
        self.blocking(|indexer| indexer.cleanup_orphaned_indexes()).await
    }

    pub fn index_stats(&self) -> Result<IndexStats, IndexerError> {
        Ok(IndexStats {
            cursors: self.cursors.stats()?,
            doc_count: self.index.doc_count()?,
        })
    }

    pub fn detect_log_format<S: AsRef<str>>(&self, samples: &[S]) -> Option<LogFormat> {
        detect_log_format(samples)
    }

    /// Drain the task queue, then close the index and release its writers.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.queue.shutdown().await;
        self.index.close().context("failed to close index")?;
        tracing::info!(engine_id = %self.id, "engine stopped");
        Ok(())
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, IndexerError>
    where
        T: Send + 'static,
        F: FnOnce(&Indexer) -> Result<T, IndexerError> + Send + 'static,
    {
        if self.queue.is_shut_down() {
            return Err(IndexerError::ShuttingDown);
        }
        let indexer = self.indexer.clone();
        tokio::task::spawn_blocking(move || f(&indexer))
            .await
            .map_err(|_| IndexerError::ShuttingDown)?
    }
}
