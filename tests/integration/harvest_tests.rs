//! Integration tests for the harvester
//!
//! These tests drive the full `Harvester` against a scripted feed site and a
//! real CSV history file, with tokio time paused so pacing delays are instant.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use sumi_harvest::config::{CategoryEntry, Config};
use sumi_harvest::crawler::{Harvester, EXTENT_SCRIPT};
use sumi_harvest::storage::{CsvHistoryStore, HistoryStore};
use sumi_harvest::{
    resolve_identity, HarvestError, PageSession, SessionError, SessionResult, StopReason,
};
use tempfile::TempDir;

const NESTED: &str = "video source[src$='.mp4']";

/// One cascade run on a feed page
#[derive(Debug, Clone)]
enum Scan {
    Found(Vec<&'static str>),
    Fail,
}

/// Observable side effects of a run
#[derive(Debug, Default)]
struct SiteLog {
    navigations: Vec<String>,
    closes: u32,
}

/// A fake site: each URL serves a fixed script of scans; the last one repeats
struct FeedSite {
    pages: HashMap<String, Vec<Scan>>,
    current: Mutex<Option<(String, usize)>>,
    log: Arc<Mutex<SiteLog>>,
}

impl FeedSite {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            current: Mutex::new(None),
            log: Arc::new(Mutex::new(SiteLog::default())),
        }
    }

    fn page(mut self, url: &str, scans: Vec<Scan>) -> Self {
        self.pages.insert(url.to_string(), scans);
        self
    }

    fn current_scan(&self) -> Option<Scan> {
        let current = self.current.lock().unwrap();
        let (url, taken) = current.as_ref()?;
        let scans = self.pages.get(url)?;
        let index = taken.saturating_sub(1).min(scans.len() - 1);
        Some(scans[index].clone())
    }
}

#[async_trait]
impl PageSession for FeedSite {
    type Element = String;

    async fn navigate(&self, url: &str) -> SessionResult<()> {
        self.log.lock().unwrap().navigations.push(url.to_string());
        if !self.pages.contains_key(url) {
            return Err(SessionError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        *self.current.lock().unwrap() = Some((url.to_string(), 0));
        Ok(())
    }

    async fn run_script(&self, code: &str) -> SessionResult<Value> {
        if code == EXTENT_SCRIPT {
            return Ok(Value::from(4_000));
        }
        Ok(Value::Null)
    }

    async fn query(&self, selector: &str) -> SessionResult<Vec<String>> {
        if selector == "video" {
            return Ok(vec!["video".to_string()]);
        }
        if selector == NESTED {
            if let Some((_, taken)) = self.current.lock().unwrap().as_mut() {
                *taken += 1;
            }
        }
        match self.current_scan() {
            Some(Scan::Found(found)) if selector == NESTED => {
                Ok(found.iter().map(|s| s.to_string()).collect())
            }
            Some(Scan::Found(_)) => Ok(Vec::new()),
            Some(Scan::Fail) | None => Err(SessionError::Query {
                selector: selector.to_string(),
                message: "execution context was destroyed".to_string(),
            }),
        }
    }

    async fn read_attribute(&self, element: &String, name: &str) -> SessionResult<Option<String>> {
        Ok((name == "src").then(|| element.clone()))
    }

    async fn close(&self) -> SessionResult<()> {
        self.log.lock().unwrap().closes += 1;
        Ok(())
    }
}

/// Creates a test configuration with the given categories
fn create_test_config(categories: &[(&str, &str)], history_path: &str, quota: usize) -> Config {
    let mut config = Config::default();
    config.crawler.max_assets_per_category = quota;
    config.crawler.diagnose_first_category = false;
    config.output.history_path = history_path.to_string();
    config.categories = categories
        .iter()
        .map(|(name, url)| CategoryEntry {
            name: name.to_string(),
            url: url.to_string(),
        })
        .collect();
    config
}

fn history_path(dir: &TempDir) -> String {
    dir.path().join("history.csv").display().to_string()
}

fn anime_and_gaming_site() -> FeedSite {
    FeedSite::new()
        .page(
            "https://example.com/interest/anime",
            vec![Scan::Found(vec![
                "https://cdn.example.com/photo/aE0jr5o_460sv.mp4",
                "https://cdn.example.com/photo/aE0jr5o_460svav1.mp4",
                "https://cdn.example.com/photo/bQ7xk2p_460sv.mp4",
            ])],
        )
        .page(
            "https://example.com/interest/gaming",
            vec![Scan::Found(vec![
                "https://cdn.example.com/photo/bQ7xk2p_460svav1.mp4",
                "https://cdn.example.com/photo/cZ9mm1q_460sv.mp4",
                "https://cdn.example.com/photo/aE0jr5o_460sv.mp4",
            ])],
        )
}

const TWO_CATEGORIES: [(&str, &str); 2] = [
    ("anime", "https://example.com/interest/anime"),
    ("gaming", "https://example.com/interest/gaming"),
];

#[tokio::test(start_paused = true)]
async fn test_harvest_never_records_duplicates() {
    let dir = TempDir::new().unwrap();
    let path = history_path(&dir);
    let config = create_test_config(&TWO_CATEGORIES, &path, 50);

    let summary = Harvester::new(config, anime_and_gaming_site(), CsvHistoryStore::new(&path))
        .run()
        .await
        .unwrap();

    let records = CsvHistoryStore::new(&path).records().unwrap();
    let pairs: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r.reference.as_str(), r.category.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("https://cdn.example.com/photo/aE0jr5o_460sv.mp4", "anime"),
            ("https://cdn.example.com/photo/bQ7xk2p_460sv.mp4", "anime"),
            ("https://cdn.example.com/photo/cZ9mm1q_460sv.mp4", "gaming"),
        ]
    );

    let references: HashSet<&str> = records.iter().map(|r| r.reference.as_str()).collect();
    let identities: HashSet<String> = records
        .iter()
        .filter_map(|r| resolve_identity(&r.reference))
        .collect();
    assert_eq!(references.len(), records.len());
    assert_eq!(identities.len(), records.len());

    assert_eq!(summary.total_collected(), 3);
    assert_eq!(summary.reports.len(), 2);
    assert!(summary
        .reports
        .iter()
        .all(|r| r.stop == StopReason::NoProgress && r.iterations <= 25));
}

#[tokio::test(start_paused = true)]
async fn test_history_header_written_once_across_runs() {
    let dir = TempDir::new().unwrap();
    let path = history_path(&dir);

    let config = create_test_config(&TWO_CATEGORIES[..1], &path, 50);
    Harvester::new(config.clone(), anime_and_gaming_site(), CsvHistoryStore::new(&path))
        .run()
        .await
        .unwrap();

    let site = FeedSite::new().page(
        "https://example.com/interest/anime",
        vec![Scan::Found(vec!["https://cdn.example.com/photo/dR4tt8w_460sv.mp4"])],
    );
    Harvester::new(config, site, CsvHistoryStore::new(&path))
        .run()
        .await
        .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "url,category,extraction_date");
    assert_eq!(
        lines.iter().filter(|l| l.starts_with("url,")).count(),
        1
    );
    assert_eq!(lines.len(), 1 + 3);
}

#[tokio::test(start_paused = true)]
async fn test_rerun_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = history_path(&dir);
    let config = create_test_config(&TWO_CATEGORIES, &path, 50);

    let first = Harvester::new(config.clone(), anime_and_gaming_site(), CsvHistoryStore::new(&path))
        .run()
        .await
        .unwrap();
    let seen_after_first = CsvHistoryStore::new(&path).load().unwrap();

    let second = Harvester::new(config, anime_and_gaming_site(), CsvHistoryStore::new(&path))
        .run()
        .await
        .unwrap();
    let seen_after_second = CsvHistoryStore::new(&path).load().unwrap();

    assert_eq!(first.total_collected(), 3);
    assert_eq!(second.total_collected(), 0);
    assert!(seen_after_first.reference_count() >= 3);
    assert_eq!(seen_after_first.identities(), seen_after_second.identities());
    assert_eq!(CsvHistoryStore::new(&path).records().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_quota_takes_first_in_scan_order() {
    let dir = TempDir::new().unwrap();
    let path = history_path(&dir);
    let config = create_test_config(&TWO_CATEGORIES[..1], &path, 3);
    let site = FeedSite::new().page(
        "https://example.com/interest/anime",
        vec![Scan::Found(vec![
            "https://cdn.example.com/v/e1_460sv.mp4",
            "https://cdn.example.com/v/e2_460sv.mp4",
            "https://cdn.example.com/v/e3_460sv.mp4",
            "https://cdn.example.com/v/e4_460sv.mp4",
            "https://cdn.example.com/v/e5_460sv.mp4",
        ])],
    );

    let summary = Harvester::new(config, site, CsvHistoryStore::new(&path))
        .run()
        .await
        .unwrap();

    let references: Vec<String> = CsvHistoryStore::new(&path)
        .records()
        .unwrap()
        .into_iter()
        .map(|r| r.reference)
        .collect();
    assert_eq!(
        references,
        vec![
            "https://cdn.example.com/v/e1_460sv.mp4",
            "https://cdn.example.com/v/e2_460sv.mp4",
            "https://cdn.example.com/v/e3_460sv.mp4",
        ]
    );
    assert_eq!(summary.reports[0].stop, StopReason::QuotaReached);
    assert_eq!(summary.reports[0].iterations, 1);
}

#[tokio::test(start_paused = true)]
async fn test_failing_category_writes_nothing_and_later_categories_run() {
    let dir = TempDir::new().unwrap();
    let path = history_path(&dir);
    let config = create_test_config(
        &[
            ("broken", "https://example.com/interest/broken"),
            ("unreachable", "https://example.com/interest/unreachable"),
            ("gaming", "https://example.com/interest/gaming"),
        ],
        &path,
        50,
    );
    let site = FeedSite::new()
        .page("https://example.com/interest/broken", vec![Scan::Fail])
        .page(
            "https://example.com/interest/gaming",
            vec![Scan::Found(vec!["https://cdn.example.com/photo/cZ9mm1q_460sv.mp4"])],
        );
    let log = Arc::clone(&site.log);

    let summary = Harvester::new(config, site, CsvHistoryStore::new(&path))
        .run()
        .await
        .unwrap();

    let broken = &summary.reports[0];
    assert_eq!(broken.stop, StopReason::ErrorBudgetExhausted);
    assert_eq!(broken.iterations, 5);
    assert_eq!(broken.collected, 0);

    let unreachable = &summary.reports[1];
    assert_eq!(unreachable.stop, StopReason::LoadFailed);

    assert_eq!(summary.reports[2].collected, 1);

    let records = CsvHistoryStore::new(&path).records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].category, "gaming");

    let log = log.lock().unwrap();
    let unreachable_attempts = log
        .navigations
        .iter()
        .filter(|url| url.ends_with("/unreachable"))
        .count();
    assert_eq!(unreachable_attempts, 3);
    assert_eq!(log.closes, 1);
}

#[tokio::test(start_paused = true)]
async fn test_session_closed_when_history_unreadable() {
    let dir = TempDir::new().unwrap();
    let path = history_path(&dir);
    std::fs::write(&path, "link,when\nhttps://cdn.example.com/a.mp4,2024-01-01\n").unwrap();

    let config = create_test_config(&TWO_CATEGORIES, &path, 50);
    let site = anime_and_gaming_site();
    let log = Arc::clone(&site.log);

    let result = Harvester::new(config, site, CsvHistoryStore::new(&path))
        .run()
        .await;

    assert!(result.is_err());
    let log = log.lock().unwrap();
    assert_eq!(log.closes, 1);
    assert!(log.navigations.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_config_rejected_before_any_navigation() {
    let dir = TempDir::new().unwrap();
    let path = history_path(&dir);

    let config = create_test_config(&[], &path, 50);
    let site = anime_and_gaming_site();
    let log = Arc::clone(&site.log);

    let result = Harvester::new(config, site, CsvHistoryStore::new(&path))
        .run()
        .await;

    assert!(matches!(result, Err(HarvestError::Config(_))));
    let log = log.lock().unwrap();
    assert_eq!(log.closes, 1);
    assert!(log.navigations.is_empty());
    assert!(!std::path::Path::new(&path).exists());
}
