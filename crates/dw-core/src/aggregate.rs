//! Time-bucketed aggregation over raw time records.
//!
//! Explicit grouping-and-summation passes over a materialized record slice.
//! The contract is the grouping key, the sum, and the sort order — nothing
//! here relies on a store's native grouping operator, so the same results
//! are reproducible over any record source.
//!
//! Calendar-day bucketing uses UTC as the fixed reference timezone.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::category::Category;
use crate::record::RawTimeRecord;

/// The time range a query aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Start of the current UTC calendar day until now.
    Day,
    /// Rolling trailing 7 days, not calendar-aligned.
    Week,
}

impl Window {
    /// Returns the inclusive start of the window `[start, now)`.
    #[must_use]
    pub fn start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            // Midnight always exists in UTC, so the unwrap cannot fail.
            Self::Day => now.date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc(),
            Self::Week => now - Duration::days(7),
        }
    }
}

/// Summed dwell time for one `(domain, category)` group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainTotal {
    pub domain: String,
    pub category: Category,
    pub total_ms: i64,
}

/// Summed dwell time for one `(date, category)` group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateTotal {
    pub date: NaiveDate,
    pub category: Category,
    pub total_ms: i64,
}

/// Groups records at or after `since` by `(domain, category)` and sums
/// durations per group.
///
/// Sorted by total descending; ties break on domain ascending so the order
/// is deterministic.
#[must_use]
pub fn totals_by_domain(records: &[RawTimeRecord], since: DateTime<Utc>) -> Vec<DomainTotal> {
    let mut groups: BTreeMap<(String, Category), i64> = BTreeMap::new();
    for record in records.iter().filter(|record| record.occurred_at >= since) {
        *groups
            .entry((record.domain.clone(), record.category))
            .or_default() += record.duration_ms;
    }

    let mut totals: Vec<DomainTotal> = groups
        .into_iter()
        .map(|((domain, category), total_ms)| DomainTotal {
            domain,
            category,
            total_ms,
        })
        .collect();
    totals.sort_by(|a, b| {
        b.total_ms
            .cmp(&a.total_ms)
            .then_with(|| a.domain.cmp(&b.domain))
    });
    totals
}

/// Groups records at or after `since` by `(UTC calendar date, category)` and
/// sums durations per group, sorted by date ascending.
#[must_use]
pub fn totals_by_date(records: &[RawTimeRecord], since: DateTime<Utc>) -> Vec<DateTotal> {
    let mut groups: BTreeMap<(NaiveDate, Category), i64> = BTreeMap::new();
    for record in records.iter().filter(|record| record.occurred_at >= since) {
        *groups
            .entry((record.occurred_at.date_naive(), record.category))
            .or_default() += record.duration_ms;
    }

    groups
        .into_iter()
        .map(|((date, category), total_ms)| DateTotal {
            date,
            category,
            total_ms,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(domain: &str, category: Category, duration_ms: i64, occurred_at: DateTime<Utc>) -> RawTimeRecord {
        RawTimeRecord {
            owner_id: None,
            domain: domain.to_string(),
            duration_ms,
            category,
            occurred_at,
        }
    }

    fn noon(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn domain_totals_group_and_sort_descending() {
        let records = vec![
            record("a.com", Category::Productive, 600_000, noon(2)),
            record("b.com", Category::Unproductive, 300_000, noon(2)),
            record("a.com", Category::Productive, 120_000, noon(2)),
        ];

        let totals = totals_by_domain(&records, Window::Day.start(noon(2)));
        assert_eq!(
            totals,
            vec![
                DomainTotal {
                    domain: "a.com".to_string(),
                    category: Category::Productive,
                    total_ms: 720_000,
                },
                DomainTotal {
                    domain: "b.com".to_string(),
                    category: Category::Unproductive,
                    total_ms: 300_000,
                },
            ]
        );
    }

    #[test]
    fn domain_totals_break_ties_by_domain() {
        let records = vec![
            record("z.com", Category::Neutral, 1000, noon(2)),
            record("a.com", Category::Neutral, 1000, noon(2)),
        ];

        let totals = totals_by_domain(&records, Window::Day.start(noon(2)));
        assert_eq!(totals[0].domain, "a.com");
        assert_eq!(totals[1].domain, "z.com");
    }

    #[test]
    fn daily_window_excludes_yesterday() {
        let yesterday = Utc.with_ymd_and_hms(2025, 6, 1, 23, 59, 59).unwrap();
        let records = vec![
            record("a.com", Category::Productive, 1000, yesterday),
            record("b.com", Category::Neutral, 2000, noon(2)),
        ];

        let totals = totals_by_domain(&records, Window::Day.start(noon(2)));
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].domain, "b.com");
    }

    #[test]
    fn date_totals_sort_ascending_by_date() {
        let records = vec![
            record("a.com", Category::Productive, 1000, noon(5)),
            record("b.com", Category::Unproductive, 2000, noon(3)),
            record("c.com", Category::Productive, 3000, noon(3)),
        ];

        let totals = totals_by_date(&records, Window::Week.start(noon(7)));
        assert_eq!(totals.len(), 3);
        assert_eq!(totals[0].date, NaiveDate::from_ymd_opt(2025, 6, 3).unwrap());
        assert_eq!(totals[0].category, Category::Productive);
        assert_eq!(totals[0].total_ms, 3000);
        assert_eq!(totals[1].category, Category::Unproductive);
        assert_eq!(totals[2].date, NaiveDate::from_ymd_opt(2025, 6, 5).unwrap());
    }

    #[test]
    fn date_totals_merge_same_day_same_category() {
        let records = vec![
            record("a.com", Category::Productive, 1000, noon(3)),
            record("b.com", Category::Productive, 500, noon(3)),
        ];

        let totals = totals_by_date(&records, Window::Week.start(noon(7)));
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].total_ms, 1500);
    }

    #[test]
    fn weekly_window_is_exactly_seven_days() {
        let now = noon(10);
        let boundary = now - Duration::days(7);
        let records = vec![
            // One millisecond too old.
            record("old.com", Category::Neutral, 1000, boundary - Duration::milliseconds(1)),
            // Exactly on the boundary is included.
            record("edge.com", Category::Neutral, 2000, boundary),
        ];

        let totals = totals_by_date(&records, Window::Week.start(now));
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].total_ms, 2000);
    }

    #[test]
    fn daily_window_starts_at_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 18, 30, 45).unwrap();
        assert_eq!(
            Window::Day.start(now),
            Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn empty_records_produce_empty_totals() {
        let totals = totals_by_domain(&[], Window::Day.start(noon(2)));
        assert!(totals.is_empty());
        let totals = totals_by_date(&[], Window::Week.start(noon(2)));
        assert!(totals.is_empty());
    }
}
