//! Category crawler - the per-category scroll/extract/accept loop
//!
//! One category is driven through the phases
//! `Loading -> WaitingForContent -> Scanning -> Done`. Inside `Scanning`
//! every iteration:
//! - runs the extraction cascade over the live page
//! - accepts new candidates in scan order, persisting each one before marking it seen
//! - scrolls a little (and, on every Nth stall, a lot) and re-measures the page
//!
//! Iteration faults are counted against an error budget and never escape the
//! category; only an illegal phase transition is reported as an error.

use crate::asset::resolve_identity;
use crate::config::{CategoryEntry, Config};
use crate::crawler::diagnostics;
use crate::crawler::extract::ExtractionCascade;
use crate::crawler::pacing::scroll_distance;
use crate::crawler::retry::{navigate_with_retry, run_script_or, Attempt};
use crate::session::{wait_for_selector, PageSession, WaitOutcome};
use crate::state::{
    evaluate_candidate, record_candidate, CrawlPhase, ScanCounters, SeenSet, SessionSet,
    StopReason,
};
use crate::storage::{HistoryRecord, HistoryStore};
use crate::{HarvestError, Result};
use serde_json::Value;

/// Page script returning the current document height
pub const EXTENT_SCRIPT: &str = "document.body.scrollHeight";

/// Page script jumping toward the current end of the page
pub const LARGE_SCROLL_SCRIPT: &str = "window.scrollBy(0, document.body.scrollHeight)";

/// Page script nudging the page after a failed iteration
pub const RECOVERY_SCROLL_SCRIPT: &str = "window.scrollBy(0, 100)";

/// Outcome of crawling one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub category: String,
    pub quota: usize,
    pub collected: usize,
    /// Scan iterations started (0 when the page never loaded)
    pub iterations: u32,
    pub stop: StopReason,
}

/// Drives one category through its crawl phases
///
/// The seen set and history store are borrowed from the orchestrator, so
/// acceptance here is visible to every later category.
pub struct CategoryCrawler<'a, S: ?Sized, H: ?Sized> {
    config: &'a Config,
    cascade: &'a ExtractionCascade,
    session: &'a S,
    history: &'a mut H,
    seen: &'a mut SeenSet,
}

impl<'a, S, H> CategoryCrawler<'a, S, H>
where
    S: PageSession + ?Sized,
    H: HistoryStore + ?Sized,
{
    pub fn new(
        config: &'a Config,
        cascade: &'a ExtractionCascade,
        session: &'a S,
        history: &'a mut H,
        seen: &'a mut SeenSet,
    ) -> Self {
        Self {
            config,
            cascade,
            session,
            history,
            seen,
        }
    }

    /// Crawls one category until its quota, stall limit, or error budget ends it
    ///
    /// # Arguments
    ///
    /// * `category` - The category to crawl
    /// * `diagnose` - Whether to log page content diagnostics before scanning
    ///
    /// # Returns
    ///
    /// * `Ok(CategoryReport)` - The category finished, normally or abandoned
    /// * `Err(HarvestError::InvalidTransition)` - The phase machine was misused
    pub async fn run(
        &mut self,
        category: &CategoryEntry,
        diagnose: bool,
    ) -> Result<CategoryReport> {
        let config = self.config;
        let quota = config.crawler.max_assets_per_category;
        let mut phase = CrawlPhase::Loading;

        tracing::info!("Processing category: {} ({})", category.name, category.url);

        let loaded = navigate_with_retry(
            self.session,
            &category.url,
            config.crawler.navigation_attempts,
            &config.pacing.load_retry,
        )
        .await;

        if let Attempt::Exhausted {
            last_error,
            attempts,
        } = loaded
        {
            tracing::error!(
                "Could not load category {} after {} attempts: {}",
                category.name,
                attempts,
                last_error
            );
            advance(&mut phase, CrawlPhase::Done)?;
            return Ok(CategoryReport {
                category: category.name.clone(),
                quota,
                collected: 0,
                iterations: 0,
                stop: StopReason::LoadFailed,
            });
        }

        config.pacing.after_load.pause().await;
        advance(&mut phase, CrawlPhase::WaitingForContent)?;
        self.wait_for_content().await;
        config.pacing.settle.pause().await;

        if diagnose {
            diagnostics::diagnose(self.session, &config.extraction.media_extension)
                .await
                .log();
        }

        advance(&mut phase, CrawlPhase::Scanning)?;
        let (counters, stop) = self.scan(category, quota).await;
        advance(&mut phase, CrawlPhase::Done)?;

        tracing::info!(
            "{}: {}/{} assets collected ({})",
            category.name,
            counters.collected,
            quota,
            stop
        );

        Ok(CategoryReport {
            category: category.name.clone(),
            quota,
            collected: counters.collected,
            iterations: counters.iterations,
            stop,
        })
    }

    async fn wait_for_content(&self) {
        let config = self.config;
        let timeout = config.crawler.content_wait_timeout();

        match wait_for_selector(self.session, &config.extraction.content_selector, timeout).await
        {
            WaitOutcome::Satisfied => tracing::debug!("Media content present"),
            WaitOutcome::TimedOut => {
                tracing::warn!(
                    "No '{}' element after {:?}, continuing after an extra wait",
                    config.extraction.content_selector,
                    timeout
                );
                config.pacing.content_fallback.pause().await;
            }
        }
    }

    /// The `Scanning` loop; returns the final counters and why it ended
    async fn scan(&mut self, category: &CategoryEntry, quota: usize) -> (ScanCounters, StopReason) {
        let config = self.config;
        let error_limit = config.crawler.consecutive_error_limit;

        let initial_extent = self.measure_extent(0).await;
        let mut counters = ScanCounters::new(initial_extent);
        let mut session_set = SessionSet::new();

        loop {
            counters.iterations += 1;

            let fault = match self
                .scan_iteration(category, quota, &mut counters, &mut session_set)
                .await
            {
                Ok(Some(stop)) => return (counters, stop),
                Ok(None) => continue,
                Err(e) => e,
            };

            let errors = counters.record_error();
            tracing::warn!(
                "Scan iteration failed ({}/{} consecutive): {}",
                errors,
                error_limit,
                fault
            );

            if counters.errors_exhausted(error_limit) {
                tracing::error!("Too many consecutive errors, skipping {}", category.name);
                return (counters, StopReason::ErrorBudgetExhausted);
            }

            if let Err(e) = self.session.run_script(RECOVERY_SCROLL_SCRIPT).await {
                tracing::error!("Recovery failed, skipping {}: {}", category.name, e);
                return (counters, StopReason::RecoveryFailed);
            }
            config.pacing.recovery.pause().await;
        }
    }

    /// One scan iteration; `Ok(Some(_))` ends the loop
    async fn scan_iteration(
        &mut self,
        category: &CategoryEntry,
        quota: usize,
        counters: &mut ScanCounters,
        session_set: &mut SessionSet,
    ) -> Result<Option<StopReason>> {
        let config = self.config;
        let candidates = self.cascade.extract(self.session).await?;
        tracing::debug!(
            "Scan {}: {} candidates in DOM",
            counters.iterations,
            candidates.len()
        );

        let mut accepted = 0;
        for reference in &candidates {
            let identity = resolve_identity(reference);
            let verdict =
                evaluate_candidate(&*self.seen, session_set, reference, identity.as_deref());
            if !verdict.is_accept() {
                tracing::trace!("Skipping {} ({})", reference, verdict.as_str());
                continue;
            }

            // Persist first: a failed append leaves the candidate unseen
            self.history
                .append(&HistoryRecord::new(reference.as_str(), category.name.as_str()))?;
            record_candidate(&mut *self.seen, session_set, reference, identity.as_deref());
            counters.collected += 1;
            accepted += 1;

            tracing::info!(
                "({}/{}) id:{} {}",
                counters.collected,
                quota,
                identity.as_deref().unwrap_or("-"),
                reference
            );

            if counters.quota_reached(quota) {
                return Ok(Some(StopReason::QuotaReached));
            }
        }

        counters.record_scan(accepted);
        if accepted == 0 {
            tracing::warn!(
                "No new assets (stall {}/{})",
                counters.stall_count,
                config.crawler.stall_limit
            );
        }

        let distance = scroll_distance(&config.crawler.scroll_distance);
        self.script(&format!("window.scrollBy(0, {})", distance)).await;
        config.pacing.scan.pause().await;

        if counters.wants_large_scroll(config.crawler.large_scroll_every) {
            tracing::info!("Large scroll to load more content");
            self.script(LARGE_SCROLL_SCRIPT).await;
            config.pacing.large_scroll.pause().await;
        }

        let extent = self.measure_extent(counters.last_extent).await;
        if !counters.record_extent(extent) {
            tracing::debug!("Page extent unchanged at {}", extent);
        }

        if counters.stalled_out(config.crawler.stall_limit) {
            tracing::warn!(
                "No progress after {} stalls, moving on",
                counters.stall_count
            );
            return Ok(Some(StopReason::NoProgress));
        }

        Ok(None)
    }

    /// Runs a page script whose result is not needed
    async fn script(&self, code: &str) {
        let config = self.config;
        run_script_or(
            self.session,
            code,
            Value::Null,
            config.crawler.script_attempts,
            &config.pacing.script_retry_backoff,
        )
        .await;
    }

    /// Reads the page height, falling back to `default` on failure
    async fn measure_extent(&self, default: u64) -> u64 {
        let config = self.config;
        let value = run_script_or(
            self.session,
            EXTENT_SCRIPT,
            Value::from(default),
            config.crawler.script_attempts,
            &config.pacing.script_retry_backoff,
        )
        .await;
        extent_from(&value).unwrap_or(default)
    }
}

/// Moves `phase` to `next`, rejecting illegal transitions
pub fn advance(phase: &mut CrawlPhase, next: CrawlPhase) -> Result<()> {
    if !phase.can_transition_to(next) {
        return Err(HarvestError::InvalidTransition {
            from: *phase,
            to: next,
        });
    }
    tracing::trace!("Phase {} -> {}", phase, next);
    *phase = next;
    Ok(())
}

fn extent_from(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
}
