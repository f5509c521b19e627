use crate::analytics::aggregate::aggregate_dashboard;
use crate::analytics::geo::{china_map, world_map};
use crate::analytics::scan::for_each_document;
use crate::analytics::stats::{DASHBOARD_FIELDS, DashboardAccumulator};
use crate::analytics::types::{DashboardAnalytics, DashboardQueryRequest, ProvinceStat, RegionStat};
use crate::analytics::window::DashboardWindow;
use crate::conf::SearchConfig;
use crate::index::{IndexError, Query, SearchIndex};
use crate::indexer::FIELD_FILE_PATH;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// How a dashboard is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardPath {
    /// Fetch every match once and aggregate in memory.
    InMemory,
    /// One scoped query per time bucket and per field.
    Aggregated,
}

pub struct AnalyticsService {
    index: Arc<dyn SearchIndex>,
    page_size: usize,
    aggregation_threshold: u64,
    max_days: i64,
}

impl AnalyticsService {
    pub fn new(index: Arc<dyn SearchIndex>, config: &SearchConfig) -> Self {
        Self {
            index,
            page_size: config.page_size.max(1),
            aggregation_threshold: config.aggregation_threshold,
            max_days: config.max_time_range_days,
        }
    }

    pub fn window(&self, req: &DashboardQueryRequest, now: i64) -> DashboardWindow {
        DashboardWindow::resolve(req.start_time, req.end_time, now, self.max_days)
    }

    /// Large corpora take the aggregated path.
    pub fn choose_path(&self) -> Result<DashboardPath, IndexError> {
        Ok(if self.index.doc_count()? > self.aggregation_threshold {
            DashboardPath::Aggregated
        } else {
            DashboardPath::InMemory
        })
    }

    pub fn dashboard(&self, req: &DashboardQueryRequest) -> Result<DashboardAnalytics, IndexError> {
        self.dashboard_at(req, Utc::now().timestamp())
    }

    pub fn dashboard_at(
        &self,
        req: &DashboardQueryRequest,
        now: i64,
    ) -> Result<DashboardAnalytics, IndexError> {
        let path = self.choose_path()?;
        self.dashboard_with(req, now, path)
    }

    pub fn dashboard_with(
        &self,
        req: &DashboardQueryRequest,
        now: i64,
        path: DashboardPath,
    ) -> Result<DashboardAnalytics, IndexError> {
        let started = Instant::now();
        let window = self.window(req, now);
        let base = self.base_query(req, &window);
        let index = self.index.as_ref();

        let parts = match path {
            DashboardPath::Aggregated => {
                aggregate_dashboard(index, &base, &window, self.page_size)?
            }
            DashboardPath::InMemory => {
                let mut acc = DashboardAccumulator::new(&window);
                for_each_document(index, &base, &DASHBOARD_FIELDS, self.page_size, |doc| {
                    acc.add(doc)
                })?;
                acc.finish()
            }
        };

        let analytics = parts.into_analytics(&window);
        debug!(
            path = ?path,
            days = window.days,
            total_pv = analytics.summary.total_pv,
            took_ms = started.elapsed().as_millis() as u64,
            "dashboard computed"
        );
        Ok(analytics)
    }

    pub fn world_map(&self, req: &DashboardQueryRequest) -> Result<Vec<RegionStat>, IndexError> {
        self.world_map_at(req, Utc::now().timestamp())
    }

    pub fn world_map_at(
        &self,
        req: &DashboardQueryRequest,
        now: i64,
    ) -> Result<Vec<RegionStat>, IndexError> {
        let base = self.base_query(req, &self.window(req, now));
        world_map(self.index.as_ref(), &base, self.page_size)
    }

    pub fn china_map(&self, req: &DashboardQueryRequest) -> Result<Vec<ProvinceStat>, IndexError> {
        self.china_map_at(req, Utc::now().timestamp())
    }

    pub fn china_map_at(
        &self,
        req: &DashboardQueryRequest,
        now: i64,
    ) -> Result<Vec<ProvinceStat>, IndexError> {
        let base = self.base_query(req, &self.window(req, now));
        china_map(self.index.as_ref(), &base, self.page_size)
    }

    fn base_query(&self, req: &DashboardQueryRequest, window: &DashboardWindow) -> Query {
        let mut queries = Vec::with_capacity(2);
        if !req.log_path.is_empty() {
            queries.push(Query::term(FIELD_FILE_PATH, req.log_path.as_str()));
        }
        queries.push(window.time_query());
        Query::and(queries)
    }
}
