use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardQueryRequest {
    /// Unix seconds, inclusive.
    pub start_time: Option<i64>,
    /// Unix seconds, inclusive.
    pub end_time: Option<i64>,
    /// Main log path of the group. Empty covers every group.
    pub log_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HourlyStat {
    pub hour: u32,
    pub uv: u64,
    pub pv: u64,
    /// Start of the hour, Unix seconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyStat {
    /// `YYYY-MM-DD`, UTC.
    pub date: String,
    pub uv: u64,
    pub pv: u64,
    /// Start of the day, Unix seconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UrlStat {
    pub url: String,
    pub visits: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DistributionEntry {
    pub name: String,
    pub count: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_uv: u64,
    pub total_pv: u64,
    pub avg_daily_uv: f64,
    pub avg_daily_pv: f64,
    pub peak_hour: u32,
    pub peak_hour_traffic: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardAnalytics {
    /// Always 24 entries, one per hour of the target day.
    pub hourly_stats: Vec<HourlyStat>,
    /// One entry per day of the window, zero-filled.
    pub daily_stats: Vec<DailyStat>,
    pub top_urls: Vec<UrlStat>,
    pub browsers: Vec<DistributionEntry>,
    pub operating_systems: Vec<DistributionEntry>,
    pub devices: Vec<DistributionEntry>,
    pub summary: DashboardSummary,
}

/// World-map bucket keyed by ISO region code.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegionStat {
    pub code: String,
    pub value: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CityStat {
    pub name: String,
    pub value: u64,
    /// Share of the province.
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProvinceStat {
    /// Standard long form, e.g. `北京市`.
    pub name: String,
    /// Map label, e.g. `北京`.
    pub short_name: String,
    pub value: u64,
    pub percent: f64,
    pub cities: Vec<CityStat>,
}
