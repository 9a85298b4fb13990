//! Storage layer for the dwell-time tracker.
//!
//! Two independent stores, both backed by `rusqlite`:
//!
//! - [`BucketStore`]: the client-side daily aggregate store, keyed by
//!   `(calendar day, domain)`, accumulating session durations.
//! - [`RecordStore`]: the server-side append-only raw record store that the
//!   aggregation queries read from.
//!
//! # Thread Safety
//!
//! Both types wrap a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! An instance can be moved between threads but needs external
//! synchronization (e.g. a `Mutex`) to be shared.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in RFC 3339 format with millisecond
//! precision, always UTC (e.g. `2025-06-02T10:30:00.000Z`), so lexicographic
//! ordering matches chronological ordering. Calendar days are TEXT
//! `YYYY-MM-DD` keys in the UTC reference timezone.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use uuid::Uuid;

use dw_core::{Category, RawTimeRecord};

/// Database errors.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored category string was not a valid category.
    #[error("invalid category for {key}: {value}")]
    CategoryParse { key: String, value: String },
    /// A stored timestamp could not be parsed.
    #[error("invalid timestamp for record {record_id}: {timestamp}")]
    TimestampParse {
        record_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A duration outside the valid range was rejected.
    #[error("negative duration: {0}ms")]
    NegativeDuration(i64),
}

/// Formats a timestamp for storage.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Formats a calendar day for use as a bucket key.
fn format_day(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Accumulated dwell time for one domain on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyBucket {
    pub accumulated_ms: i64,
    pub category: Category,
}

/// The local daily aggregate store.
///
/// Keys are `(calendar day, domain)`; values accumulate monotonically within
/// a day. The category is fixed at first write: the classifier is pure, so
/// later merges for the same domain carry the same category anyway, and the
/// store never overwrites it.
pub struct BucketStore {
    conn: Connection,
}

impl BucketStore {
    /// Opens a bucket store at the given path, creating it if necessary.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Opens an in-memory bucket store. Useful for testing.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Initializes the schema. Idempotent.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS buckets (
                day TEXT NOT NULL,
                domain TEXT NOT NULL,
                accumulated_ms INTEGER NOT NULL DEFAULT 0,
                category TEXT NOT NULL,
                PRIMARY KEY (day, domain)
            );
            ",
        )?;
        Ok(())
    }

    /// Merges a closed session's duration into its daily bucket.
    ///
    /// Creating and updating go through a single upsert statement, so the
    /// read-modify-write is atomic per key. Existing rows keep their
    /// original category. Merges are additive and commutative: applying a
    /// set of them in any order yields the same accumulated total.
    pub fn merge_add(
        &mut self,
        day: NaiveDate,
        domain: &str,
        duration_ms: i64,
        category: Category,
    ) -> Result<(), DbError> {
        if duration_ms < 0 {
            return Err(DbError::NegativeDuration(duration_ms));
        }
        self.conn.execute(
            "
            INSERT INTO buckets (day, domain, accumulated_ms, category)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(day, domain) DO UPDATE SET
                accumulated_ms = accumulated_ms + excluded.accumulated_ms
            ",
            params![format_day(day), domain, duration_ms, category.as_str()],
        )?;
        Ok(())
    }

    /// Reads all buckets for one calendar day, keyed by domain.
    pub fn read_day(&self, day: NaiveDate) -> Result<BTreeMap<String, DailyBucket>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT domain, accumulated_ms, category
            FROM buckets
            WHERE day = ?
            ORDER BY domain ASC
            ",
        )?;
        let rows = stmt.query_map([format_day(day)], |row| {
            let domain: String = row.get(0)?;
            let accumulated_ms: i64 = row.get(1)?;
            let category: String = row.get(2)?;
            Ok((domain, accumulated_ms, category))
        })?;

        let mut buckets = BTreeMap::new();
        for row in rows {
            let (domain, accumulated_ms, category) = row?;
            let category = category.parse().map_err(|_| DbError::CategoryParse {
                key: domain.clone(),
                value: category,
            })?;
            buckets.insert(
                domain,
                DailyBucket {
                    accumulated_ms,
                    category,
                },
            );
        }
        Ok(buckets)
    }

    /// Removes all buckets for one calendar day.
    ///
    /// Irreversible; other days are untouched. Returns the number of
    /// domains removed.
    pub fn clear_day(&mut self, day: NaiveDate) -> Result<usize, DbError> {
        let removed = self
            .conn
            .execute("DELETE FROM buckets WHERE day = ?", [format_day(day)])?;
        tracing::debug!(day = %day, removed, "cleared daily buckets");
        Ok(removed)
    }
}

/// The append-only raw time-record store.
///
/// Records are never mutated after insert; aggregation happens at query
/// time over the rows this store returns.
pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Opens a record store at the given path, creating it if necessary.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Opens an in-memory record store. Useful for testing.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Initializes the schema. Idempotent.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Raw time records: one row per closed session.
            -- occurred_at: RFC 3339 UTC (e.g. '2025-06-02T10:30:00.000Z')
            CREATE TABLE IF NOT EXISTS records (
                id TEXT PRIMARY KEY,
                owner_id TEXT,
                domain TEXT NOT NULL,
                duration_ms INTEGER NOT NULL,
                category TEXT NOT NULL,
                occurred_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_records_occurred ON records(occurred_at);
            CREATE INDEX IF NOT EXISTS idx_records_owner ON records(owner_id);
            ",
        )?;
        Ok(())
    }

    /// Appends one record, assigning it a fresh ID.
    pub fn insert(&mut self, record: &RawTimeRecord) -> Result<(), DbError> {
        if record.duration_ms < 0 {
            return Err(DbError::NegativeDuration(record.duration_ms));
        }
        self.conn.execute(
            "
            INSERT INTO records (id, owner_id, domain, duration_ms, category, occurred_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
            params![
                Uuid::new_v4().to_string(),
                record.owner_id,
                record.domain,
                record.duration_ms,
                record.category.as_str(),
                format_timestamp(record.occurred_at),
            ],
        )?;
        Ok(())
    }

    /// Lists records with `occurred_at >= start`, ordered by timestamp then
    /// ID ascending.
    ///
    /// When `owner` is given, only that owner's records are returned;
    /// otherwise all records match (the public/demo aggregate view).
    pub fn records_since(
        &self,
        start: DateTime<Utc>,
        owner: Option<&str>,
    ) -> Result<Vec<RawTimeRecord>, DbError> {
        let start = format_timestamp(start);
        let mut stmt = self.conn.prepare(
            "
            SELECT id, owner_id, domain, duration_ms, category, occurred_at
            FROM records
            WHERE occurred_at >= ?1
              AND (?2 IS NULL OR owner_id = ?2)
            ORDER BY occurred_at ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map(params![start, owner], |row| {
            let id: String = row.get(0)?;
            let owner_id: Option<String> = row.get(1)?;
            let domain: String = row.get(2)?;
            let duration_ms: i64 = row.get(3)?;
            let category: String = row.get(4)?;
            let occurred_at: String = row.get(5)?;
            Ok((id, owner_id, domain, duration_ms, category, occurred_at))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, owner_id, domain, duration_ms, category, occurred_at) = row?;
            let category = category.parse().map_err(|_| DbError::CategoryParse {
                key: id.clone(),
                value: category,
            })?;
            let occurred_at = DateTime::parse_from_rfc3339(&occurred_at)
                .map_err(|source| DbError::TimestampParse {
                    record_id: id,
                    timestamp: occurred_at.clone(),
                    source,
                })?
                .with_timezone(&Utc);
            records.push(RawTimeRecord {
                owner_id,
                domain,
                duration_ms,
                category,
                occurred_at,
            });
        }
        Ok(records)
    }
}
