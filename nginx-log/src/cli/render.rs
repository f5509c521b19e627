use anyhow::Result;
use chrono::DateTime;
use nginx_log_core::analytics::{DashboardAnalytics, DistributionEntry, ProvinceStat, RegionStat};
use nginx_log_core::engine::IndexStats;
use nginx_log_core::indexer::{CleanupReport, FileOutcome, GroupOutcome};
use nginx_log_core::search::{CacheStats, QueryResult, TierStats};
use owo_colors::OwoColorize;
use serde::Serialize;

/// Distribution rows shown before the rest is summarized.
const MAX_ROWS: usize = 8;

pub fn json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn time(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn status(code: u16) -> String {
    match code {
        200..=299 => code.green().to_string(),
        300..=399 => code.cyan().to_string(),
        400..=499 => code.yellow().to_string(),
        _ => code.red().to_string(),
    }
}

pub fn file_outcome(outcome: &FileOutcome) {
    if outcome.up_to_date {
        println!("{} {} is up to date", "✔".green(), outcome.path);
        return;
    }
    println!(
        "{} {}: {} lines, {} documents, {} failed (bytes {}..{})",
        "✔".green(),
        outcome.path.bold(),
        outcome.lines,
        outcome.documents,
        outcome.failed_lines,
        outcome.start_position,
        outcome.end_position
    );
}

pub fn group_outcome(outcome: &GroupOutcome) {
    println!(
        "{} {}: {} files, {} lines, {} documents in {:.1?}",
        "✔".green(),
        outcome.main_log_path.bold(),
        outcome.files.len(),
        outcome.total_lines,
        outcome.documents,
        outcome.duration
    );
    for (path, error) in &outcome.failed_files {
        println!("  {} {path}: {error}", "✘".red());
    }
}

pub fn rebuilt(groups: &[String], doc_count: u64) {
    println!(
        "{} rebuilt {} groups, {} documents indexed",
        "✔".green(),
        groups.len(),
        doc_count
    );
    for group in groups {
        println!("  {group}");
    }
}

pub fn search_result(result: &QueryResult) {
    for e in &result.entries {
        println!(
            "{} {:<15} {:<6} {} {} {}",
            time(e.timestamp).dimmed(),
            e.ip,
            e.method,
            status(e.status),
            e.path,
            e.bytes_sent.dimmed()
        );
    }

    let cache = if result.from_cache { " (cached)" } else { "" };
    println!(
        "{} of {} entries in {} ms{cache}",
        result.entries.len().bold(),
        result.total.bold(),
        result.took_ms
    );
    let s = &result.summary;
    if s.pv > 0 {
        println!(
            "PV {}  UV {}  pages {}  traffic {} bytes ({:.1} per request)",
            s.pv, s.uv, s.unique_pages, s.total_traffic, s.avg_traffic_per_pv
        );
    }
}

fn distribution(title: &str, entries: &[DistributionEntry]) {
    println!("{}", title.bold());
    for e in entries.iter().take(MAX_ROWS) {
        println!("  {:<24} {:>8} {:>6.2}%", e.name, e.count, e.percent);
    }
    if entries.len() > MAX_ROWS {
        println!("  … {} more", entries.len() - MAX_ROWS);
    }
}

pub fn dashboard(d: &DashboardAnalytics) {
    let s = &d.summary;
    println!(
        "{}  PV {}  UV {}  daily avg PV {:.1} UV {:.1}  peak {:02}:00 ({} requests)",
        "Summary".bold(),
        s.total_pv,
        s.total_uv,
        s.avg_daily_pv,
        s.avg_daily_uv,
        s.peak_hour,
        s.peak_hour_traffic
    );

    let peak = d.hourly_stats.iter().map(|h| h.pv).max().unwrap_or(0).max(1);
    println!("{}", "Hourly".bold());
    for h in &d.hourly_stats {
        let bar = "█".repeat((h.pv * 40 / peak) as usize);
        println!("  {:02}:00 {:>8} {:>6} {}", h.hour, h.pv, h.uv, bar.cyan());
    }

    println!("{}", "Daily".bold());
    for day in &d.daily_stats {
        println!("  {} {:>8} {:>6}", day.date, day.pv, day.uv);
    }

    println!("{}", "Top URLs".bold());
    for u in &d.top_urls {
        println!("  {:>8} {:>6.2}% {}", u.visits, u.percent, u.url);
    }

    distribution("Browsers", &d.browsers);
    distribution("Operating systems", &d.operating_systems);
    distribution("Devices", &d.devices);
}

pub fn geo(world: &[RegionStat], china: &[ProvinceStat]) {
    println!("{}", "Regions".bold());
    for r in world.iter().take(MAX_ROWS) {
        println!("  {:<8} {:>8} {:>6.2}%", r.code, r.value, r.percent);
    }
    println!("{}", "China".bold());
    for p in china.iter().take(MAX_ROWS) {
        let cities: Vec<&str> = p.cities.iter().take(3).map(|c| c.name.as_str()).collect();
        println!(
            "  {:<10} {:>8} {:>6.2}% {}",
            p.short_name,
            p.value,
            p.percent,
            cities.join(", ").dimmed()
        );
    }
}

pub fn cleanup(report: &CleanupReport) {
    println!(
        "{} removed {} files and {} groups, {} documents deleted",
        "✔".green(),
        report.removed_files.len(),
        report.removed_groups.len(),
        report.deleted_documents
    );
}

fn tier(name: &str, t: &TierStats) {
    println!(
        "  {:<10} entries {:>6}  hits {:>8}  misses {:>8}  evictions {:>6}  rejected {:>6}",
        name, t.entries, t.hits, t.misses, t.evictions, t.rejected
    );
}

pub fn stats(stats: &IndexStats, caches: &CacheStats) {
    println!("{}", "Index".bold());
    println!("  documents      {}", stats.doc_count);
    println!(
        "  files          {} ({} enabled)",
        stats.cursors.total_files, stats.cursors.enabled_files
    );
    println!("  cursor docs    {}", stats.cursors.total_documents);
    println!("{}", "Caches".bold());
    tier("results", &caches.results);
    tier("summaries", &caches.summaries);
}
