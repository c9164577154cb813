//! Statistics generation from the harvest history
//!
//! This module provides functionality for summarizing what the history file
//! already holds, without touching a page session.

use crate::asset::resolve_identity;
use crate::storage::{HistoryRecord, HistoryStore, StorageResult};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};

/// History statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStatistics {
    /// Total number of well-formed records
    pub total_records: usize,

    /// Number of distinct references
    pub unique_references: usize,

    /// Number of distinct content identities
    pub unique_identities: usize,

    /// Records whose reference yields no identity
    pub unidentified: usize,

    /// Record count per category
    pub records_by_category: BTreeMap<String, usize>,

    /// Earliest and latest extraction timestamps
    pub first_extracted: Option<DateTime<Utc>>,
    pub last_extracted: Option<DateTime<Utc>>,
}

impl HistoryStatistics {
    /// Builds statistics from history records
    pub fn from_records(records: &[HistoryRecord]) -> Self {
        let mut references = HashSet::new();
        let mut identities = HashSet::new();
        let mut stats = Self {
            total_records: records.len(),
            ..Self::default()
        };

        for record in records {
            references.insert(record.reference.as_str());
            match resolve_identity(&record.reference) {
                Some(identity) => {
                    identities.insert(identity);
                }
                None => stats.unidentified += 1,
            }

            *stats
                .records_by_category
                .entry(record.category.clone())
                .or_insert(0) += 1;

            stats.first_extracted = Some(match stats.first_extracted {
                Some(first) => first.min(record.extracted_at),
                None => record.extracted_at,
            });
            stats.last_extracted = Some(match stats.last_extracted {
                Some(last) => last.max(record.extracted_at),
                None => record.extracted_at,
            });
        }

        stats.unique_references = references.len();
        stats.unique_identities = identities.len();
        stats
    }
}

/// Loads statistics from a history store
///
/// # Arguments
///
/// * `store` - The history store to read
///
/// # Returns
///
/// * `Ok(HistoryStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to read the history
pub fn load_statistics(store: &dyn HistoryStore) -> StorageResult<HistoryStatistics> {
    let records = store.records()?;
    Ok(HistoryStatistics::from_records(&records))
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HistoryStatistics) {
    println!("=== Harvest History ===\n");

    println!("Overview:");
    println!("  Total records: {}", stats.total_records);
    println!("  Unique references: {}", stats.unique_references);
    println!("  Unique assets (by identity): {}", stats.unique_identities);
    if stats.unidentified > 0 {
        println!("  Records without identity: {}", stats.unidentified);
    }
    println!();

    if !stats.records_by_category.is_empty() {
        println!("Records by Category:");
        // Sort categories by count (descending)
        let mut category_counts: Vec<_> = stats.records_by_category.iter().collect();
        category_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (category, count) in category_counts {
            let percentage = (*count as f64 / stats.total_records as f64) * 100.0;
            println!("  {}: {} ({:.1}%)", category, count, percentage);
        }
        println!();
    }

    if let (Some(first), Some(last)) = (stats.first_extracted, stats.last_extracted) {
        println!("First extraction: {}", first.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("Last extraction:  {}", last.format("%Y-%m-%d %H:%M:%S UTC"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(reference: &str, category: &str, hour: u32) -> HistoryRecord {
        HistoryRecord {
            reference: reference.to_string(),
            category: category.to_string(),
            extracted_at: Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_statistics_from_records() {
        let records = vec![
            record("https://cdn.example.com/aE0jr5o_460sv.mp4", "anime", 10),
            record("https://cdn.example.com/bQ7xk2p_460sv.mp4", "anime", 8),
            record("https://cdn.example.com/bQ7xk2p_460svav1.mp4", "gaming", 12),
            record("https://cdn.example.com/", "gaming", 9),
        ];

        let stats = HistoryStatistics::from_records(&records);

        assert_eq!(stats.total_records, 4);
        assert_eq!(stats.unique_references, 4);
        assert_eq!(stats.unique_identities, 2);
        assert_eq!(stats.unidentified, 1);
        assert_eq!(stats.records_by_category.get("anime"), Some(&2));
        assert_eq!(stats.records_by_category.get("gaming"), Some(&2));
        assert_eq!(
            stats.first_extracted,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap())
        );
        assert_eq!(
            stats.last_extracted,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_empty_history() {
        let stats = HistoryStatistics::from_records(&[]);
        assert_eq!(stats, HistoryStatistics::default());
    }
}
