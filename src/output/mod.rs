//! Output module for reporting on harvests
//!
//! This module handles:
//! - Statistics over the persisted history (`--stats`)
//! - The end-of-run summary table

pub mod stats;
mod summary;

pub use stats::{load_statistics, print_statistics, HistoryStatistics};
pub use summary::{print_run_summary, render_run_summary};
