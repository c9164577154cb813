//! Storage module for persisting harvest history
//!
//! This module handles the append-only history file:
//! - Loading prior records into a `SeenSet` at startup
//! - Appending one durable record per accepted asset
//! - Reading records back for statistics

mod csv_store;
mod traits;

pub use csv_store::{CsvHistoryStore, HISTORY_HEADER};
pub use traits::{HistoryStore, StorageError, StorageResult};

use chrono::{DateTime, SecondsFormat, Utc};

/// One accepted discovery, as written to the history file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub reference: String,
    pub category: String,
    pub extracted_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Creates a record stamped with the current UTC time
    pub fn new(reference: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            category: category.into(),
            extracted_at: Utc::now(),
        }
    }

    /// ISO-8601 UTC timestamp as stored in the `extraction_date` column
    pub fn extracted_at_string(&self) -> String {
        self.extracted_at
            .to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_utc_iso8601() {
        let record = HistoryRecord::new("https://cdn.example.com/a_1.mp4", "anime");
        let stamp = record.extracted_at_string();
        assert!(stamp.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&stamp).is_ok());
    }
}
