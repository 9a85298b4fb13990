//! Productivity categories.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing an unrecognized category string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid category: {value}")]
pub struct InvalidCategory {
    pub value: String,
}

/// Productivity classification of a domain.
///
/// This enum encodes the only three valid categories, preventing invalid
/// string values from reaching storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Domains on the productive membership list.
    Productive,
    /// Domains on the unproductive membership list.
    Unproductive,
    /// Everything else.
    Neutral,
}

impl Category {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Productive => "productive",
            Self::Unproductive => "unproductive",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = InvalidCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "productive" => Ok(Self::Productive),
            "unproductive" => Ok(Self::Unproductive),
            "neutral" => Ok(Self::Neutral),
            _ => Err(InvalidCategory {
                value: s.to_string(),
            }),
        }
    }
}
