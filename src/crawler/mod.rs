//! Crawler module for feed scanning and run orchestration
//!
//! This module contains the core harvesting logic, including:
//! - Media reference extraction through a strategy cascade
//! - Retry policies for navigation and page scripts
//! - Human-like pacing
//! - The per-category scan loop and the run-wide coordinator

mod category;
mod coordinator;
mod diagnostics;
mod extract;
mod pacing;
mod retry;

pub use category::{
    advance, CategoryCrawler, CategoryReport, EXTENT_SCRIPT, LARGE_SCROLL_SCRIPT,
    RECOVERY_SCROLL_SCRIPT,
};
pub use coordinator::{Harvester, RunSummary};
pub use diagnostics::{diagnose, diagnostic_selectors, PageDiagnostics};
pub use extract::{ExtractionCascade, Strategy};
pub use pacing::{scroll_distance, DelayRange};
pub use retry::{navigate_with_retry, run_script_or, run_script_with_retry, Attempt};

use crate::config::Config;
use crate::session::PageSession;
use crate::storage::CsvHistoryStore;
use crate::Result;

/// Runs a complete harvest into the configured CSV history
///
/// This is the main entry point for a run. It will:
/// 1. Open the history file named in the config
/// 2. Load every previously recorded reference
/// 3. Crawl each category in order
/// 4. Close the page session
///
/// # Arguments
///
/// * `config` - The validated harvest configuration
/// * `session` - An established page session; it is closed when the run ends
///
/// # Returns
///
/// * `Ok(RunSummary)` - Every category was attempted
/// * `Err(HarvestError)` - The config is invalid or the history could not be read
pub async fn harvest<S: PageSession>(
    config: Config,
    session: S,
) -> Result<RunSummary> {
    let history = CsvHistoryStore::new(&config.output.history_path);
    Harvester::new(config, session, history).run().await
}
