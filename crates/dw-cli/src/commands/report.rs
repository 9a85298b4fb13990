//! Report command: render one day's buckets.

use std::fmt::Write as _;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use dw_core::Category;
use dw_db::BucketStore;

/// One rendered row, ordered by accumulated time descending.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ReportRow {
    pub domain: String,
    pub accumulated_ms: i64,
    pub category: Category,
}

/// Reads and orders a day's buckets.
pub fn day_rows(store: &BucketStore, day: NaiveDate) -> Result<Vec<ReportRow>> {
    let mut rows: Vec<ReportRow> = store
        .read_day(day)?
        .into_iter()
        .map(|(domain, bucket)| ReportRow {
            domain,
            accumulated_ms: bucket.accumulated_ms,
            category: bucket.category,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.accumulated_ms
            .cmp(&a.accumulated_ms)
            .then_with(|| a.domain.cmp(&b.domain))
    });
    Ok(rows)
}

/// Formats milliseconds as a duration string.
/// Returns "Xh Ym" if >= 1 hour, "Xm" if < 1 hour.
pub fn format_duration(ms: i64) -> String {
    if ms < 0 {
        return "0m".to_string();
    }
    let total_minutes = ms / 60_000;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Renders the human-readable table.
pub fn render(day: NaiveDate, rows: &[ReportRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Dwell time for {day}");
    if rows.is_empty() {
        let _ = writeln!(out, "  (no tracked time)");
        return out;
    }

    let width = rows.iter().map(|row| row.domain.len()).max().unwrap_or(0);
    let mut total_ms = 0;
    for row in rows {
        total_ms += row.accumulated_ms;
        let _ = writeln!(
            out,
            "  {:width$}  {:>8}  {}",
            row.domain,
            format_duration(row.accumulated_ms),
            row.category,
        );
    }
    let _ = writeln!(out, "  total: {}", format_duration(total_ms));
    out
}

pub fn run(store: &BucketStore, day: NaiveDate, json: bool) -> Result<()> {
    let rows = day_rows(store, day)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", render(day, &rows));
    }
    Ok(())
}
