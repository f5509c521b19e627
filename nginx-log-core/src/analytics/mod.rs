//! Dashboard statistics and geographic rollups over the indexed corpus.
//!
//! Two paths compute the dashboard. The in-memory path fetches every matching
//! document once; the aggregation path issues one scoped query per hour, day
//! and field. Both feed the same assembly step and produce identical output.

mod aggregate;
mod geo;
mod scan;
mod service;
mod stats;
mod types;
mod window;

#[cfg(test)]
mod tests;

pub use geo::{normalize_province, short_province};
pub use service::{AnalyticsService, DashboardPath};
pub use types::{
    CityStat, DailyStat, DashboardAnalytics, DashboardQueryRequest, DashboardSummary,
    DistributionEntry, HourlyStat, ProvinceStat, RegionStat, UrlStat,
};
pub use window::DashboardWindow;
