use crate::analytics::types::{
    DailyStat, DashboardAnalytics, DashboardSummary, DistributionEntry, HourlyStat, UrlStat,
};
use crate::analytics::window::{DashboardWindow, SECONDS_PER_HOUR, format_day};
use crate::index::Document;
use ahash::{AHashMap, AHashSet};
use std::cmp::Reverse;

pub(crate) const DASHBOARD_FIELDS: [&str; 6] =
    ["timestamp", "ip", "path", "browser", "os", "device_type"];
pub(crate) const TOP_URL_LIMIT: usize = 10;
const UNKNOWN_LABEL: &str = "Unknown";

pub(crate) type Counts = AHashMap<String, u64>;

/// Distribution label; blank values are grouped as `Unknown`.
pub(crate) fn label(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN_LABEL.to_string(),
    }
}

pub(crate) fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Largest counts first, ties by name.
pub(crate) fn ranked(counts: Counts) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = counts.into_iter().collect();
    entries.sort_by(|a, b| (Reverse(a.1), &a.0).cmp(&(Reverse(b.1), &b.0)));
    entries
}

/// Visitor and request count of one slice of the corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Traffic {
    pub uv: u64,
    pub pv: u64,
}

#[derive(Default)]
struct Tally {
    ips: AHashSet<String>,
    pv: u64,
}

impl Tally {
    fn add(&mut self, ip: Option<&str>) {
        self.pv += 1;
        if let Some(ip) = ip {
            self.ips.insert(ip.to_string());
        }
    }

    fn traffic(&self) -> Traffic {
        Traffic {
            uv: self.ips.len() as u64,
            pv: self.pv,
        }
    }
}

/// Everything a dashboard is assembled from, however it was gathered.
#[derive(Debug, Default)]
pub(crate) struct DashboardParts {
    pub hours: Vec<Traffic>,
    pub days: Vec<Traffic>,
    pub total: Traffic,
    pub urls: Counts,
    pub browsers: Counts,
    pub operating_systems: Counts,
    pub devices: Counts,
}

impl DashboardParts {
    pub(crate) fn into_analytics(self, window: &DashboardWindow) -> DashboardAnalytics {
        let total_pv = self.total.pv;

        let hourly_stats: Vec<HourlyStat> = window
            .hour_starts()
            .zip(self.hours.iter().copied().chain(std::iter::repeat(Traffic::default())))
            .map(|(timestamp, t)| HourlyStat {
                hour: ((timestamp - window.target_day) / SECONDS_PER_HOUR) as u32,
                uv: t.uv,
                pv: t.pv,
                timestamp,
            })
            .collect();

        let daily_stats: Vec<DailyStat> = window
            .day_starts()
            .zip(self.days.iter().copied().chain(std::iter::repeat(Traffic::default())))
            .map(|(timestamp, t)| DailyStat {
                date: format_day(timestamp),
                uv: t.uv,
                pv: t.pv,
                timestamp,
            })
            .collect();

        let top_urls = ranked(self.urls)
            .into_iter()
            .take(TOP_URL_LIMIT)
            .map(|(url, visits)| UrlStat {
                percent: percent(visits, total_pv),
                url,
                visits,
            })
            .collect();

        let summary = summarize(&hourly_stats, &daily_stats, self.total);

        DashboardAnalytics {
            hourly_stats,
            daily_stats,
            top_urls,
            browsers: distribution(self.browsers, total_pv),
            operating_systems: distribution(self.operating_systems, total_pv),
            devices: distribution(self.devices, total_pv),
            summary,
        }
    }
}

fn distribution(counts: Counts, total: u64) -> Vec<DistributionEntry> {
    ranked(counts)
        .into_iter()
        .map(|(name, count)| DistributionEntry {
            percent: percent(count, total),
            name,
            count,
        })
        .collect()
}

fn summarize(hourly: &[HourlyStat], daily: &[DailyStat], total: Traffic) -> DashboardSummary {
    let mut peak: Option<&HourlyStat> = None;
    for h in hourly {
        if peak.is_none_or(|p| h.pv > p.pv) {
            peak = Some(h);
        }
    }

    let days = daily.len().max(1) as f64;
    DashboardSummary {
        total_uv: total.uv,
        total_pv: total.pv,
        avg_daily_uv: daily.iter().map(|d| d.uv).sum::<u64>() as f64 / days,
        avg_daily_pv: daily.iter().map(|d| d.pv).sum::<u64>() as f64 / days,
        peak_hour: peak.map_or(0, |p| p.hour),
        peak_hour_traffic: peak.map_or(0, |p| p.pv),
    }
}

/// Builds dashboard parts from full documents in one pass.
pub(crate) struct DashboardAccumulator<'a> {
    window: &'a DashboardWindow,
    hours: Vec<Tally>,
    days: Vec<Tally>,
    total: Tally,
    urls: Counts,
    browsers: Counts,
    operating_systems: Counts,
    devices: Counts,
}

impl<'a> DashboardAccumulator<'a> {
    pub(crate) fn new(window: &'a DashboardWindow) -> Self {
        Self {
            window,
            hours: (0..24).map(|_| Tally::default()).collect(),
            days: (0..window.days).map(|_| Tally::default()).collect(),
            total: Tally::default(),
            urls: Counts::default(),
            browsers: Counts::default(),
            operating_systems: Counts::default(),
            devices: Counts::default(),
        }
    }

    pub(crate) fn add(&mut self, doc: &Document) {
        let ip = doc.text("ip");
        self.total.add(ip);

        if let Some(ts) = doc.number("timestamp").map(|t| t as i64) {
            if let Some(h) = self.window.hour_index(ts) {
                self.hours[h].add(ip);
            }
            if let Some(d) = self.window.day_index(ts) {
                self.days[d].add(ip);
            }
        }

        if let Some(path) = doc.text("path") {
            *self.urls.entry(path.to_string()).or_default() += 1;
        }
        *self.browsers.entry(label(doc.text("browser"))).or_default() += 1;
        *self.operating_systems.entry(label(doc.text("os"))).or_default() += 1;
        *self.devices.entry(label(doc.text("device_type"))).or_default() += 1;
    }

    pub(crate) fn finish(self) -> DashboardParts {
        DashboardParts {
            hours: self.hours.iter().map(Tally::traffic).collect(),
            days: self.days.iter().map(Tally::traffic).collect(),
            total: self.total.traffic(),
            urls: self.urls,
            browsers: self.browsers,
            operating_systems: self.operating_systems,
            devices: self.devices,
        }
    }
}
