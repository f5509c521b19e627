use crate::analytics::scan::{count, for_each_document};
use crate::analytics::stats::{Counts, DashboardParts, Traffic, label};
use crate::analytics::window::{DashboardWindow, SECONDS_PER_DAY, SECONDS_PER_HOUR};
use crate::index::{IndexError, Query, SearchIndex};
use ahash::AHashSet;

/// Dashboard parts from scoped queries, one per time bucket and per field.
pub(crate) fn aggregate_dashboard(
    index: &dyn SearchIndex,
    base: &Query,
    window: &DashboardWindow,
    page_size: usize,
) -> Result<DashboardParts, IndexError> {
    let hours = window
        .hour_starts()
        .map(|from| traffic(index, &scoped(base, from, from + SECONDS_PER_HOUR), page_size))
        .collect::<Result<Vec<_>, _>>()?;
    let days = window
        .day_starts()
        .map(|from| traffic(index, &scoped(base, from, from + SECONDS_PER_DAY), page_size))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DashboardParts {
        hours,
        days,
        total: traffic(index, base, page_size)?,
        urls: field_counts(index, base, "path", page_size, false)?,
        browsers: field_counts(index, base, "browser", page_size, true)?,
        operating_systems: field_counts(index, base, "os", page_size, true)?,
        devices: field_counts(index, base, "device_type", page_size, true)?,
    })
}

fn scoped(base: &Query, from: i64, to: i64) -> Query {
    Query::and(vec![
        base.clone(),
        Query::range_half_open("timestamp", from as f64, to as f64),
    ])
}

fn traffic(
    index: &dyn SearchIndex,
    query: &Query,
    page_size: usize,
) -> Result<Traffic, IndexError> {
    let pv = count(index, query)?;
    if pv == 0 {
        return Ok(Traffic::default());
    }

    let mut ips: AHashSet<String> = AHashSet::new();
    for_each_document(index, query, &["ip"], page_size, |doc| {
        if let Some(ip) = doc.text("ip") {
            ips.insert(ip.to_string());
        }
    })?;

    Ok(Traffic {
        uv: (ips.len() as u64).min(pv),
        pv,
    })
}

/// Value counts of one field. Blank values count as `Unknown` when
/// `label_blank` is set and are skipped otherwise.
fn field_counts(
    index: &dyn SearchIndex,
    query: &Query,
    field: &str,
    page_size: usize,
    label_blank: bool,
) -> Result<Counts, IndexError> {
    let mut counts = Counts::default();
    for_each_document(index, query, &[field], page_size, |doc| {
        let value = doc.text(field);
        if label_blank {
            *counts.entry(label(value)).or_default() += 1;
        } else if let Some(v) = value {
            *counts.entry(v.to_string()).or_default() += 1;
        }
    })?;
    Ok(counts)
}
