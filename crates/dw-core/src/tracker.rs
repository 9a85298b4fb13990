//! Activity session tracking.
//!
//! The tracker is a state machine fed by discrete focus/visibility/idle
//! events. Every focus transition closes the open session (if any) before
//! opening the next one, so at most one domain owns focus at a time. Idle
//! time is excluded retroactively at close: the tracker only ever reads
//! `last_activity`, it never mutates state from the idle timer.
//!
//! The clock is injected — every call takes `now` — so tracking is
//! deterministic under test and independent of wall-clock scheduling.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Tracker policy knobs.
///
/// None of these affect the correctness of the state machine, only how much
/// dwell time an idle stretch forfeits.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Inactivity gap after which dwell time stops accruing.
    /// Default: 300000 (5 minutes).
    pub idle_threshold_ms: i64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            idle_threshold_ms: 300_000, // 5 minutes
        }
    }
}

/// One continuous interval of a domain holding user focus.
///
/// Immutable once closed. `duration_ms` may be shorter than
/// `ended_at - started_at` when idle time was excluded, but is never
/// negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub domain: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: i64,
}

/// A focus/visibility/idle signal from the tracked context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusEvent {
    /// A tab with the given domain took focus.
    FocusGained(String),
    /// Focus left the tracked context entirely.
    FocusLost,
    /// The focused tab navigated to a new domain.
    ///
    /// Treated as focus lost plus focus gained on the same tab.
    TabNavigated(String),
    /// The window lost focus.
    WindowBlurred,
    /// The window regained focus on the given domain.
    WindowFocused(String),
    /// Mouse/keyboard activity was observed.
    ActivityPing,
    /// Periodic idle check. Never closes a session by itself.
    IdleTick,
}

/// The open session, when a domain currently holds focus.
#[derive(Debug, Clone)]
struct OpenSession {
    domain: String,
    since: DateTime<Utc>,
}

/// Focus-event state machine for a single tracked context.
///
/// Construct one instance per tracked context and feed it events; closed
/// sessions come back from [`Tracker::handle`] and [`Tracker::finish`].
/// A tracker dropped with a session still open emits nothing — completed
/// sessions are accounted at most once, never partially.
#[derive(Debug)]
pub struct Tracker {
    active: Option<OpenSession>,
    last_activity: DateTime<Utc>,
    idle_threshold: Duration,
}

impl Tracker {
    /// Creates a tracker in the no-focus state.
    #[must_use]
    pub fn new(config: &TrackerConfig, now: DateTime<Utc>) -> Self {
        Self {
            active: None,
            last_activity: now,
            idle_threshold: Duration::milliseconds(config.idle_threshold_ms.max(0)),
        }
    }

    /// Feeds one event into the state machine.
    ///
    /// Returns the session closed by this event, if any. Focus-changing
    /// events always close before reopening, so the returned session belongs
    /// to the previously focused domain.
    pub fn handle(&mut self, event: &FocusEvent, now: DateTime<Utc>) -> Option<Session> {
        match event {
            FocusEvent::FocusGained(domain)
            | FocusEvent::TabNavigated(domain)
            | FocusEvent::WindowFocused(domain) => {
                let closed = self.close(now);
                // The focus change itself is a user action.
                self.last_activity = now;
                self.active = Some(OpenSession {
                    domain: domain.clone(),
                    since: now,
                });
                closed
            }
            FocusEvent::FocusLost | FocusEvent::WindowBlurred => self.close(now),
            FocusEvent::ActivityPing => {
                self.last_activity = now;
                None
            }
            FocusEvent::IdleTick => {
                if self.active.is_some() && now - self.last_activity > self.idle_threshold {
                    tracing::debug!(
                        idle_ms = (now - self.last_activity).num_milliseconds(),
                        "user inactive; idle time will be excluded at session close"
                    );
                }
                None
            }
        }
    }

    /// Closes and returns the open session, if any.
    ///
    /// Call this before tearing down the tracked context so an in-progress
    /// session's accrued time is flushed through the normal close path.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Option<Session> {
        self.close(now)
    }

    /// Returns the currently focused domain, if any.
    #[must_use]
    pub fn active_domain(&self) -> Option<&str> {
        self.active.as_ref().map(|open| open.domain.as_str())
    }

    fn close(&mut self, now: DateTime<Utc>) -> Option<Session> {
        let open = self.active.take()?;

        // Idle exclusion: if the user went inactive longer than the
        // threshold, the stretch past the last activity does not count.
        let effective_end = if now - self.last_activity > self.idle_threshold {
            self.last_activity
        } else {
            now
        };

        // Clamp guards both idle exclusion and clock skew.
        let duration_ms = (effective_end - open.since).num_milliseconds().max(0);

        Some(Session {
            domain: open.domain,
            started_at: open.since,
            ended_at: now,
            duration_ms,
        })
    }
}
