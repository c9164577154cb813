//! Run orchestration - drives every configured category through one session
//!
//! The harvester owns the run's resources:
//! - the page session, created by the caller and closed exactly once here
//! - the history store, loaded exactly once before the first category
//! - the run-wide seen set, lent to each category crawl in turn

use crate::config::{validate, Config};
use crate::crawler::category::{CategoryCrawler, CategoryReport};
use crate::crawler::extract::ExtractionCascade;
use crate::session::PageSession;
use crate::state::SeenSet;
use crate::storage::HistoryStore;
use crate::Result;
use std::time::{Duration, Instant};

/// What a finished run did, category by category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// One report per configured category, in crawl order
    pub reports: Vec<CategoryReport>,

    pub elapsed: Duration,

    /// Size of the seen set at the end of the run (history plus this run)
    pub seen_references: usize,
    pub seen_identities: usize,
}

impl RunSummary {
    pub fn total_collected(&self) -> usize {
        self.reports.iter().map(|r| r.collected).sum()
    }

    /// Categories that ended on a fault rather than on quota or stall
    pub fn abandoned(&self) -> impl Iterator<Item = &CategoryReport> {
        self.reports.iter().filter(|r| r.stop.is_abandoned())
    }
}

/// Main harvest orchestrator
pub struct Harvester<S, H> {
    config: Config,
    session: S,
    history: H,
    cascade: ExtractionCascade,
}

impl<S, H> Harvester<S, H>
where
    S: PageSession,
    H: HistoryStore,
{
    /// Creates a harvester over an already established page session
    pub fn new(config: Config, session: S, history: H) -> Self {
        let cascade = ExtractionCascade::for_extension(&config.extraction.media_extension);
        Self {
            config,
            session,
            history,
            cascade,
        }
    }

    /// Crawls every category in configured order, then closes the session
    ///
    /// The configuration is validated before anything is loaded. A category
    /// that fails to load or exhausts its error budget is reported and
    /// skipped; it never stops the categories after it. The session is
    /// closed whether or not the run succeeded.
    pub async fn run(mut self) -> Result<RunSummary> {
        let outcome = self.crawl_all().await;

        if let Err(e) = self.session.close().await {
            tracing::warn!("Failed to close page session: {}", e);
        }

        outcome
    }

    async fn crawl_all(&mut self) -> Result<RunSummary> {
        validate(&self.config)?;

        let started = Instant::now();
        let mut seen: SeenSet = self.history.load()?;
        tracing::info!(
            "Loaded {} references ({} identities) from history",
            seen.reference_count(),
            seen.identity_count()
        );

        let total = self.config.categories.len();
        let mut reports = Vec::with_capacity(total);

        for (index, category) in self.config.categories.iter().enumerate() {
            tracing::info!("=== Category {}/{}: {} ===", index + 1, total, category.name);
            let diagnose = index == 0 && self.config.crawler.diagnose_first_category;

            let report = CategoryCrawler::new(
                &self.config,
                &self.cascade,
                &self.session,
                &mut self.history,
                &mut seen,
            )
            .run(category, diagnose)
            .await?;
            reports.push(report);

            if index + 1 < total {
                let delay = self.config.pacing.between_categories.sample();
                tracing::info!("Waiting {:?} before the next category", delay);
                tokio::time::sleep(delay).await;
            }
        }

        Ok(RunSummary {
            reports,
            elapsed: started.elapsed(),
            seen_references: seen.reference_count(),
            seen_identities: seen.identity_count(),
        })
    }
}
