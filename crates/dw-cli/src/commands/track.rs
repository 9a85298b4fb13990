//! Track command: drive the session tracker from a JSONL event stream.
//!
//! Closed sessions always take the synchronous local path (classify, merge
//! into the day's bucket) before the detached forwarding path sees them.
//! A merge failure loses that one update locally; the session is not
//! replayed and still goes to the forwarder, which may succeed
//! independently.

use std::io::BufRead;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use dw_core::tracker::{Tracker, TrackerConfig};
use dw_core::{ClassifierConfig, FocusEvent, Session, normalize_domain};
use dw_db::BucketStore;
use dw_sync::Forwarder;

/// One line of tracker input.
#[derive(Debug, Deserialize)]
struct WireLine {
    ts: DateTime<Utc>,
    #[serde(flatten)]
    event: WireEvent,
}

/// Focus events as emitted by the browser-side observer.
///
/// Events carry raw URLs; domains are normalized here before they reach the
/// tracker.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum WireEvent {
    FocusGained { url: String },
    FocusLost,
    TabNavigated { url: String },
    WindowBlurred,
    WindowFocused { url: String },
    ActivityPing,
    IdleTick,
}

impl From<WireEvent> for FocusEvent {
    fn from(wire: WireEvent) -> Self {
        match wire {
            WireEvent::FocusGained { url } => Self::FocusGained(normalize_domain(&url)),
            WireEvent::FocusLost => Self::FocusLost,
            WireEvent::TabNavigated { url } => Self::TabNavigated(normalize_domain(&url)),
            WireEvent::WindowBlurred => Self::WindowBlurred,
            WireEvent::WindowFocused { url } => Self::WindowFocused(normalize_domain(&url)),
            WireEvent::ActivityPing => Self::ActivityPing,
            WireEvent::IdleTick => Self::IdleTick,
        }
    }
}

/// Outcome of one tracking run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TrackSummary {
    pub sessions: usize,
    pub accumulated_ms: i64,
    pub merge_failures: usize,
}

/// Consumes the event stream until EOF, flushing the open session at the
/// end so teardown never silently drops accrued time.
pub fn process(
    reader: impl BufRead,
    store: &mut BucketStore,
    forwarder: Option<&Forwarder>,
    classifier: &ClassifierConfig,
    tracker_config: &TrackerConfig,
) -> Result<TrackSummary> {
    let mut tracker: Option<Tracker> = None;
    let mut last_ts: Option<DateTime<Utc>> = None;
    let mut summary = TrackSummary::default();

    for (number, line) in reader.lines().enumerate() {
        let line = line.context("failed to read event stream")?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: WireLine = match serde_json::from_str(&line) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(line = number + 1, error = %err, "skipping malformed event");
                continue;
            }
        };

        let tracker = tracker
            .get_or_insert_with(|| Tracker::new(tracker_config, parsed.ts));
        last_ts = Some(parsed.ts);
        if let Some(session) = tracker.handle(&parsed.event.into(), parsed.ts) {
            settle(&session, store, forwarder, classifier, &mut summary);
        }
    }

    if let (Some(mut tracker), Some(ts)) = (tracker, last_ts) {
        if let Some(session) = tracker.finish(ts) {
            settle(&session, store, forwarder, classifier, &mut summary);
        }
    }

    Ok(summary)
}

/// Runs a closed session through the local-merge and forwarding paths.
fn settle(
    session: &Session,
    store: &mut BucketStore,
    forwarder: Option<&Forwarder>,
    classifier: &ClassifierConfig,
    summary: &mut TrackSummary,
) {
    let category = classifier.classify(&session.domain);
    let day = session.ended_at.date_naive();

    summary.sessions += 1;
    summary.accumulated_ms += session.duration_ms;

    if let Err(err) = store.merge_add(day, &session.domain, session.duration_ms, category) {
        // Local-only loss; the session is closed either way and the
        // forwarder still gets its copy.
        tracing::error!(
            domain = %session.domain,
            error = %err,
            "failed to merge session into local store"
        );
        summary.merge_failures += 1;
    }

    if let Some(forwarder) = forwarder {
        forwarder.forward(session, category);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chrono::NaiveDate;

    use super::*;

    fn run(input: &str, forwarder: Option<&Forwarder>) -> (TrackSummary, BucketStore) {
        let mut store = BucketStore::open_in_memory().unwrap();
        let summary = process(
            Cursor::new(input),
            &mut store,
            forwarder,
            &ClassifierConfig::default(),
            &TrackerConfig::default(),
        )
        .unwrap();
        (summary, store)
    }

    const SCRIPT: &str = r#"
{"ts":"2025-06-02T09:00:00Z","event":"focus_gained","url":"https://github.com/rust-lang/rust"}
{"ts":"2025-06-02T09:04:00Z","event":"activity_ping"}
{"ts":"2025-06-02T09:08:00Z","event":"activity_ping"}
{"ts":"2025-06-02T09:10:00Z","event":"tab_navigated","url":"https://www.youtube.com/watch"}
{"ts":"2025-06-02T09:12:00Z","event":"activity_ping"}
{"ts":"2025-06-02T09:15:00Z","event":"focus_lost"}
"#;

    #[test]
    fn script_accumulates_per_domain_buckets() {
        let (summary, store) = run(SCRIPT, None);
        assert_eq!(summary.sessions, 2);
        assert_eq!(summary.merge_failures, 0);
        assert_eq!(summary.accumulated_ms, 900_000);

        let day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let buckets = store.read_day(day).unwrap();
        assert_eq!(buckets.get("github.com").unwrap().accumulated_ms, 600_000);
        assert_eq!(
            buckets.get("github.com").unwrap().category,
            dw_core::Category::Productive
        );
        assert_eq!(buckets.get("youtube.com").unwrap().accumulated_ms, 300_000);
        assert_eq!(
            buckets.get("youtube.com").unwrap().category,
            dw_core::Category::Unproductive
        );
    }

    #[test]
    fn stream_end_flushes_open_session() {
        let input = r#"{"ts":"2025-06-02T09:00:00Z","event":"focus_gained","url":"https://docs.rs/serde"}"#;
        let (summary, store) = run(input, None);
        // The open session closes at the last event timestamp: zero
        // duration, but it goes through the normal close path.
        assert_eq!(summary.sessions, 1);
        let day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert!(store.read_day(day).unwrap().contains_key("docs.rs"));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let input = format!("not json at all\n{SCRIPT}");
        let (summary, _) = run(&input, None);
        assert_eq!(summary.sessions, 2);
    }

    #[test]
    fn unparsable_urls_bucket_under_unknown() {
        let input = r#"
{"ts":"2025-06-02T09:00:00Z","event":"focus_gained","url":"about:blank"}
{"ts":"2025-06-02T09:01:00Z","event":"focus_lost"}
"#;
        let (_, store) = run(input, None);
        let day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let buckets = store.read_day(day).unwrap();
        let bucket = buckets.get("unknown").unwrap();
        assert_eq!(bucket.accumulated_ms, 60_000);
        assert_eq!(bucket.category, dw_core::Category::Neutral);
    }

    #[test]
    fn forwarder_failure_leaves_local_buckets_intact() {
        // Nothing listens here; every forward fails after the local merge.
        let forwarder = Forwarder::spawn("http://127.0.0.1:9/api/time-tracking").unwrap();
        let (summary, store) = run(SCRIPT, Some(&forwarder));
        forwarder.shutdown();

        assert_eq!(summary.merge_failures, 0);
        let day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let buckets = store.read_day(day).unwrap();
        assert_eq!(buckets.get("github.com").unwrap().accumulated_ms, 600_000);
        assert_eq!(buckets.get("youtube.com").unwrap().accumulated_ms, 300_000);
    }

    #[test]
    fn idle_stretch_is_excluded_from_buckets() {
        // 10 minutes without activity before the close; only the 2 minutes
        // up to the last ping count.
        let input = r#"
{"ts":"2025-06-02T09:00:00Z","event":"focus_gained","url":"https://example.org/"}
{"ts":"2025-06-02T09:02:00Z","event":"activity_ping"}
{"ts":"2025-06-02T09:12:00Z","event":"focus_lost"}
"#;
        let (_, store) = run(input, None);
        let day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let buckets = store.read_day(day).unwrap();
        assert_eq!(buckets.get("example.org").unwrap().accumulated_ms, 120_000);
    }
}
