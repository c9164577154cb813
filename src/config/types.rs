use crate::crawler::DelayRange;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sumi-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Crawl targets, processed in declaration order
    #[serde(default, rename = "category")]
    pub categories: Vec<CategoryEntry>,
}

/// Scan loop behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of assets accepted per category
    pub max_assets_per_category: usize,

    /// Navigation timeout (seconds)
    pub page_load_timeout: u64,

    /// How long to poll for the first media element (seconds)
    pub content_wait_timeout: u64,

    /// Stall count at which a category ends without progress
    pub stall_limit: u32,

    /// Consecutive failed iterations at which a category is abandoned
    pub consecutive_error_limit: u32,

    /// A large scroll is issued on every Nth stall
    pub large_scroll_every: u32,

    /// Navigation attempts per category
    pub navigation_attempts: u32,

    /// Attempts per page script before the default value is used
    pub script_attempts: u32,

    /// Small scroll distance range in pixels
    pub scroll_distance: PixelRange,

    /// Log page content diagnostics for the first category
    pub diagnose_first_category: bool,
}

impl CrawlerConfig {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout)
    }

    pub fn content_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.content_wait_timeout)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_assets_per_category: 50,
            page_load_timeout: 30,
            content_wait_timeout: 15,
            stall_limit: 25,
            consecutive_error_limit: 5,
            large_scroll_every: 4,
            navigation_attempts: 3,
            script_attempts: 2,
            scroll_distance: PixelRange { min: 300, max: 600 },
            diagnose_first_category: true,
        }
    }
}

/// Inclusive pixel range, written as `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "[u32; 2]")]
pub struct PixelRange {
    pub min: u32,
    pub max: u32,
}

impl From<[u32; 2]> for PixelRange {
    fn from([min, max]: [u32; 2]) -> Self {
        Self { min, max }
    }
}

/// Human-like delay ranges, all in milliseconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PacingConfig {
    /// After a successful navigation
    pub after_load: DelayRange,

    /// Between failed navigation attempts
    pub load_retry: DelayRange,

    /// Extra wait when no media element showed up in time
    pub content_fallback: DelayRange,

    /// Before the first scan of a category
    pub settle: DelayRange,

    /// After each small scroll
    pub scan: DelayRange,

    /// After a large scroll
    pub large_scroll: DelayRange,

    /// After a failed scan iteration
    pub recovery: DelayRange,

    /// Between two categories
    pub between_categories: DelayRange,

    /// Between failed page script attempts
    pub script_retry_backoff: DelayRange,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            after_load: DelayRange::new(2_000, 4_000),
            load_retry: DelayRange::new(3_000, 6_000),
            content_fallback: DelayRange::new(5_000, 8_000),
            settle: DelayRange::new(3_000, 5_000),
            scan: DelayRange::new(800, 1_500),
            large_scroll: DelayRange::new(2_000, 4_000),
            recovery: DelayRange::new(3_000, 5_000),
            between_categories: DelayRange::new(10_000, 20_000),
            script_retry_backoff: DelayRange::new(2_000, 2_000),
        }
    }
}

/// What counts as a media asset on the page
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractionConfig {
    /// Extension every accepted reference must carry (e.g. ".mp4")
    pub media_extension: String,

    /// Selector whose presence means media content has loaded
    pub content_selector: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            media_extension: ".mp4".to_string(),
            content_selector: "video".to_string(),
        }
    }
}

/// Headless browser settings (used by the `browser` feature)
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    pub headless: bool,
    pub user_agent: String,
    /// URL patterns blocked at the network layer (ads, trackers)
    pub blocked_urls: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            blocked_urls: [
                "*ads.stickyadstv.com*",
                "*cs.lkqd.net*",
                "*t.adx.opera.com*",
                "*doubleclick.net*",
                "*googlesyndication.com*",
                "*googletagmanager.com*",
                "*ad.360yield.com*",
                "*sync.search.spotxchange.com*",
                "*csync.loopme.me*",
                "*shb-sync.com*",
                "*measureadv.com*",
                "*/ad/*",
                "*/ads/*",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the append-only CSV history
    pub history_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            history_path: "./harvest_history.csv".to_string(),
        }
    }
}

/// A crawl target: one category feed page
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
    /// Category name, recorded with every accepted asset
    pub name: String,

    /// Feed page URL
    pub url: String,
}
