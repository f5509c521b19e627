use crate::index::Query;
use chrono::DateTime;

pub(crate) const SECONDS_PER_HOUR: i64 = 3_600;
pub(crate) const SECONDS_PER_DAY: i64 = 86_400;
const TRAILING_DAYS: i64 = 30;

/// Resolved bounds of a dashboard request, Unix seconds, UTC days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardWindow {
    /// Inclusive.
    pub start: i64,
    /// Inclusive.
    pub end: i64,
    /// Start of the day whose hours are reported.
    pub target_day: i64,
    /// Start of the first reported day.
    pub first_day: i64,
    pub days: usize,
}

impl DashboardWindow {
    /// Missing bounds fall back to the trailing 30 days ending at `now`.
    /// Windows longer than `max_days` keep their most recent days.
    pub fn resolve(start: Option<i64>, end: Option<i64>, now: i64, max_days: i64) -> Self {
        let trailing = |end: i64| day_start(end) - (TRAILING_DAYS - 1) * SECONDS_PER_DAY;
        let (start, end) = match (start, end) {
            (Some(s), Some(e)) if e >= s => (s, e),
            (Some(s), Some(e)) => (e, s),
            (Some(s), None) => (s, now.max(s)),
            (None, Some(e)) => (trailing(e), e),
            (None, None) => (trailing(now), now),
        };

        let target_day = day_start(end);
        let first_day = day_start(start).max(target_day - (max_days.max(1) - 1) * SECONDS_PER_DAY);

        Self {
            start: start.max(first_day),
            end,
            target_day,
            first_day,
            days: ((target_day - first_day) / SECONDS_PER_DAY + 1) as usize,
        }
    }

    pub fn day_starts(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.days as i64).map(|d| self.first_day + d * SECONDS_PER_DAY)
    }

    pub fn hour_starts(&self) -> impl Iterator<Item = i64> + '_ {
        (0..24).map(|h| self.target_day + h * SECONDS_PER_HOUR)
    }

    /// Day slot of `ts`, if inside the reported days.
    pub(crate) fn day_index(&self, ts: i64) -> Option<usize> {
        let offset = ts - self.first_day;
        (offset >= 0 && offset < self.days as i64 * SECONDS_PER_DAY)
            .then(|| (offset / SECONDS_PER_DAY) as usize)
    }

    /// Hour slot of `ts`, if on the target day.
    pub(crate) fn hour_index(&self, ts: i64) -> Option<usize> {
        let offset = ts - self.target_day;
        (0..SECONDS_PER_DAY)
            .contains(&offset)
            .then(|| (offset / SECONDS_PER_HOUR) as usize)
    }

    pub(crate) fn time_query(&self) -> Query {
        Query::range_inclusive("timestamp", self.start as f64, self.end as f64)
    }
}

pub(crate) fn day_start(ts: i64) -> i64 {
    ts.div_euclid(SECONDS_PER_DAY) * SECONDS_PER_DAY
}

pub(crate) fn format_day(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
