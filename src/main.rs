//! Sumi-Harvest main entry point
//!
//! This is the command-line interface for the Sumi-Harvest feed harvester.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use sumi_harvest::config::{load_config_with_hash, Config};
use sumi_harvest::crawler::ExtractionCascade;
use sumi_harvest::output::{load_statistics, print_statistics};
use sumi_harvest::session::{PageSession, SnapshotSession};
use sumi_harvest::storage::CsvHistoryStore;
use sumi_harvest::{resolve_identity, HistoryStore};
use tracing_subscriber::EnvFilter;

/// Sumi-Harvest: an incremental media feed harvester
///
/// Sumi-Harvest scrolls category feed pages in a rendered browser session,
/// extracts media references, and appends each newly discovered asset exactly
/// once to a CSV history.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version = "1.0.0")]
#[command(about = "An incremental media feed harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "inspect"])]
    dry_run: bool,

    /// Show statistics from the history file and exit
    #[arg(long, conflicts_with_all = ["dry_run", "inspect"])]
    stats: bool,

    /// Run the extraction cascade over a saved HTML page and exit
    #[arg(long, value_name = "HTML", conflicts_with_all = ["dry_run", "stats"])]
    inspect: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if let Some(page) = cli.inspect.as_deref() {
        handle_inspect(&config, page).await
    } else {
        handle_harvest(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<()> {
    println!("=== Sumi-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Max assets per category: {}",
        config.crawler.max_assets_per_category
    );
    println!("  Page load timeout: {}s", config.crawler.page_load_timeout);
    println!(
        "  Content wait timeout: {}s",
        config.crawler.content_wait_timeout
    );
    println!("  Stall limit: {}", config.crawler.stall_limit);
    println!(
        "  Consecutive error limit: {}",
        config.crawler.consecutive_error_limit
    );
    println!(
        "  Large scroll every: {} stalls",
        config.crawler.large_scroll_every
    );

    println!("\nPacing:");
    println!(
        "  Scan delay: {}-{}ms",
        config.pacing.scan.min_ms, config.pacing.scan.max_ms
    );
    println!(
        "  Between categories: {}-{}ms",
        config.pacing.between_categories.min_ms, config.pacing.between_categories.max_ms
    );

    println!("\nExtraction:");
    println!("  Media extension: {}", config.extraction.media_extension);
    println!("  Content selector: {}", config.extraction.content_selector);

    let store = CsvHistoryStore::new(&config.output.history_path);
    println!("\nOutput:");
    println!("  History: {}", config.output.history_path);
    if store.exists() {
        let seen = store
            .load()
            .context("Failed to read the history file")?;
        println!(
            "  Known references: {} ({} distinct assets)",
            seen.reference_count(),
            seen.identity_count()
        );
    } else {
        println!("  (new file, header will be written)");
    }

    println!("\nCategories ({}):", config.categories.len());
    for (index, category) in config.categories.iter().enumerate() {
        println!("  {}. {} -> {}", index + 1, category.name, category.url);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would harvest up to {} assets across {} categories",
        config.crawler.max_assets_per_category * config.categories.len(),
        config.categories.len()
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the history file
fn handle_stats(config: &Config) -> Result<()> {
    println!("History: {}\n", config.output.history_path);

    let store = CsvHistoryStore::new(&config.output.history_path);
    let stats = load_statistics(&store).context("Failed to read the history file")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --inspect mode: runs extraction over a saved page
async fn handle_inspect(config: &Config, page: &Path) -> Result<()> {
    let session = SnapshotSession::from_file(page)
        .with_context(|| format!("Failed to read {}", page.display()))?;
    let cascade = ExtractionCascade::for_extension(&config.extraction.media_extension);

    let references = cascade
        .extract(&session)
        .await
        .context("Extraction failed")?;

    let store = CsvHistoryStore::new(&config.output.history_path);
    let seen = if store.exists() {
        store.load().context("Failed to read the history file")?
    } else {
        Default::default()
    };

    println!("=== {} ({} candidates) ===\n", page.display(), references.len());
    for reference in &references {
        let identity = resolve_identity(reference);
        let known = seen.contains_reference(reference)
            || identity
                .as_deref()
                .is_some_and(|id| seen.contains_identity(id));
        println!(
            "{} id:{} {}",
            if known { "=" } else { "+" },
            identity.as_deref().unwrap_or("-"),
            reference
        );
    }

    session.close().await.ok();
    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config) -> Result<()> {
    tracing::info!(
        "Categories: {}, quota per category: {}",
        config.categories.len(),
        config.crawler.max_assets_per_category
    );
    tracing::info!("History file: {}", config.output.history_path);

    let session = launch_session(&config).await?;

    match sumi_harvest::crawler::harvest(config, session).await {
        Ok(summary) => {
            tracing::info!(
                "Harvest completed: {} new assets in {:?}",
                summary.total_collected(),
                summary.elapsed
            );
            sumi_harvest::output::print_run_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(feature = "browser")]
async fn launch_session(config: &Config) -> Result<sumi_harvest::session::ChromeSession> {
    tracing::info!("Launching browser (headless: {})", config.browser.headless);
    sumi_harvest::session::ChromeSession::launch(
        &config.browser,
        config.crawler.page_load_timeout(),
    )
    .await
    .context("Failed to start the browser session")
}

#[cfg(not(feature = "browser"))]
async fn launch_session(_config: &Config) -> Result<SnapshotSession> {
    anyhow::bail!(
        "this build has no browser backend; rebuild with `--features browser` \
         or use --inspect, --stats, or --dry-run"
    )
}
