//! Raw time records, the durable unit of remote aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// One closed dwell session as accepted by the remote record store.
///
/// Records are append-only and never mutated; many records may exist for the
/// same domain on the same day. Aggregation happens at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTimeRecord {
    /// Authenticated owner, or `None` for anonymous ingestion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    /// Normalized domain the time was spent on.
    pub domain: String,
    /// Dwell time in milliseconds, never negative.
    pub duration_ms: i64,
    /// Category assigned at session close.
    pub category: Category,
    /// When the session closed.
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn record_serialization_roundtrip() {
        let record = RawTimeRecord {
            owner_id: Some("user-1".to_string()),
            domain: "github.com".to_string(),
            duration_ms: 600_000,
            category: Category::Productive,
            occurred_at: Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).unwrap(),
        };

        let json = serde_json::to_string(&record).unwrap();
        let parsed: RawTimeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn record_owner_defaults_to_none() {
        let json = r#"{
            "domain": "example.org",
            "duration_ms": 1000,
            "category": "neutral",
            "occurred_at": "2025-06-02T12:00:00Z"
        }"#;
        let parsed: RawTimeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.owner_id, None);
    }
}
