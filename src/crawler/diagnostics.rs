//! Page content diagnostics
//!
//! Logs what the first loaded feed page actually contains so a layout change
//! on the site shows up in the logs before it shows up as an empty history.

use crate::session::PageSession;
use serde_json::Value;

/// What the diagnostics found on the current page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageDiagnostics {
    /// Occurrences of the media extension in the page source, if the source was readable
    pub extension_mentions: Option<usize>,

    /// Match counts per diagnostic selector; `None` where the query failed
    pub selector_counts: Vec<(String, Option<usize>)>,

    /// Number of `<script>` elements
    pub script_count: Option<usize>,
}

impl PageDiagnostics {
    pub fn log(&self) {
        tracing::info!("=== Page content diagnostics ===");
        match self.extension_mentions {
            Some(count) => tracing::info!("Media extension mentions in source: {}", count),
            None => tracing::info!("Media extension mentions in source: unavailable"),
        }
        for (selector, count) in &self.selector_counts {
            match count {
                Some(count) => tracing::info!("  {}: {} elements", selector, count),
                None => tracing::info!("  {}: query failed", selector),
            }
        }
        if let Some(count) = self.script_count {
            tracing::info!("Script elements: {}", count);
        }
    }
}

/// Selectors counted for a media extension, most specific first
pub fn diagnostic_selectors(extension: &str) -> Vec<String> {
    vec![
        format!("video source[src$='{}']", extension),
        "video source".to_string(),
        format!("source[src*='{}']", extension),
        "video".to_string(),
        "source[type='video/mp4']".to_string(),
    ]
}

/// Inspects the current page; individual check failures are recorded, never raised
pub async fn diagnose<S>(session: &S, extension: &str) -> PageDiagnostics
where
    S: PageSession + ?Sized,
{
    let extension_mentions = match session
        .run_script("document.documentElement.outerHTML")
        .await
    {
        Ok(Value::String(source)) => Some(source.matches(extension).count()),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Page source unavailable for diagnostics: {}", e);
            None
        }
    };

    let mut selector_counts = Vec::new();
    for selector in diagnostic_selectors(extension) {
        let count = session.query(&selector).await.ok().map(|found| found.len());
        selector_counts.push((selector, count));
    }

    let script_count = session.query("script").await.ok().map(|found| found.len());

    PageDiagnostics {
        extension_mentions,
        selector_counts,
        script_count,
    }
}
