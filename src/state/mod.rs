//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `SeenSet` / `SessionSet`: what has already been recorded, run-wide and per category
//! - `Verdict`: why a candidate was accepted or rejected
//! - `CrawlPhase`: the per-category state machine
//! - `ScanCounters`: stall/error/quota counters driving termination

mod crawl_phase;
mod seen;

// Re-export main types
pub use crawl_phase::{CrawlPhase, ScanCounters, StopReason};
pub use seen::{evaluate_candidate, record_candidate, SeenSet, SessionSet, Verdict};
