//! Core domain logic for the dwell-time tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Classification: mapping domains to productivity categories
//! - Session tracking: turning focus events into closed dwell sessions
//! - Aggregation: grouping raw time records into bucketed totals

pub mod aggregate;
pub mod category;
pub mod classify;
pub mod record;
pub mod tracker;

pub use aggregate::{DateTotal, DomainTotal, Window, totals_by_date, totals_by_domain};
pub use category::{Category, InvalidCategory};
pub use classify::{ClassifierConfig, UNKNOWN_DOMAIN, normalize_domain};
pub use record::RawTimeRecord;
pub use tracker::{FocusEvent, Session, Tracker};
