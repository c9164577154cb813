//! Saved-HTML page session
//!
//! Serves static HTML documents through the `PageSession` surface so the
//! extraction cascade can run against a saved page (`--inspect`) or a test
//! fixture. Scripts are not executed.

use crate::session::PageSession;
use crate::{SessionError, SessionResult};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// An element captured from a snapshot: its attributes in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotElement {
    pub attributes: Vec<(String, String)>,
}

impl SnapshotElement {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Page session over a fixed set of HTML documents keyed by URL
#[derive(Debug, Default)]
pub struct SnapshotSession {
    pages: HashMap<String, String>,
    current: Mutex<Option<String>>,
}

impl SnapshotSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the document served for `url`
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// Creates a session with a saved HTML file already loaded
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let html = std::fs::read_to_string(path)?;
        let url = format!("file://{}", path.display());
        Ok(Self {
            pages: HashMap::from([(url, html.clone())]),
            current: Mutex::new(Some(html)),
        })
    }

    fn current_html(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl PageSession for SnapshotSession {
    type Element = SnapshotElement;

    async fn navigate(&self, url: &str) -> SessionResult<()> {
        let html = self
            .pages
            .get(url)
            .ok_or_else(|| SessionError::Navigation {
                url: url.to_string(),
                message: "no snapshot registered for this URL".to_string(),
            })?;

        *self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(html.clone());
        Ok(())
    }

    async fn run_script(&self, _code: &str) -> SessionResult<serde_json::Value> {
        Err(SessionError::Unsupported(
            "snapshot sessions do not execute scripts".to_string(),
        ))
    }

    async fn query(&self, selector: &str) -> SessionResult<Vec<SnapshotElement>> {
        let html = self.current_html().ok_or_else(|| SessionError::Query {
            selector: selector.to_string(),
            message: "no page loaded".to_string(),
        })?;
        select_elements(&html, selector)
    }

    async fn read_attribute(
        &self,
        element: &SnapshotElement,
        name: &str,
    ) -> SessionResult<Option<String>> {
        Ok(element.attribute(name).map(str::to_string))
    }
}

/// Parses `html` and captures every element matching `selector`
fn select_elements(html: &str, selector: &str) -> SessionResult<Vec<SnapshotElement>> {
    let parsed = Selector::parse(selector).map_err(|e| SessionError::Query {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })?;

    let document = Html::parse_document(html);
    Ok(document
        .select(&parsed)
        .map(|element| SnapshotElement {
            attributes: element
                .value()
                .attrs()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        })
        .collect())
}
