//! Media reference extraction
//!
//! Candidate asset references are read from the live page through an ordered
//! cascade of strategies. The first strategy that yields anything wins; later
//! strategies are fallbacks for page layouts the earlier ones miss, and their
//! results are never merged.

use crate::asset::AssetReference;
use crate::session::PageSession;
use crate::{SessionError, SessionResult};
use std::collections::HashSet;

/// One way of finding media references in the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    /// Short name used in logs
    pub name: String,

    /// CSS selector for candidate elements
    pub selector: String,

    /// Attributes read in order; the first non-empty one is used
    pub attributes: Vec<String>,

    /// Substring the value must contain, if any
    pub must_contain: Option<String>,
}

impl Strategy {
    pub fn new(name: &str, selector: String, attributes: &[&str], must_contain: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            selector,
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
            must_contain: must_contain.map(str::to_string),
        }
    }

    /// Returns true if `value` is an acceptable reference for this strategy
    pub fn accepts(&self, value: &str) -> bool {
        !value.is_empty()
            && self
                .must_contain
                .as_deref()
                .map_or(true, |needle| value.contains(needle))
    }

    /// Reads every matching element's reference, in document order
    ///
    /// A failed query is returned as an error. A single unreadable element is
    /// skipped so the rest of the scan still counts.
    pub async fn collect<S>(&self, session: &S) -> SessionResult<Vec<AssetReference>>
    where
        S: PageSession + ?Sized,
    {
        let elements = session.query(&self.selector).await?;
        let mut found = Vec::new();

        for element in &elements {
            match self.read_reference(session, element).await {
                Ok(Some(value)) if self.accepts(&value) => found.push(value),
                Ok(_) => {}
                Err(e) => {
                    tracing::trace!("Skipping unreadable element ({}): {}", self.name, e);
                }
            }
        }

        Ok(found)
    }

    async fn read_reference<S>(
        &self,
        session: &S,
        element: &S::Element,
    ) -> SessionResult<Option<String>>
    where
        S: PageSession + ?Sized,
    {
        for attribute in &self.attributes {
            if let Some(value) = session.read_attribute(element, attribute).await? {
                let value = value.trim();
                if !value.is_empty() {
                    return Ok(Some(value.to_string()));
                }
            }
        }
        Ok(None)
    }
}

/// Ordered list of extraction strategies
#[derive(Debug, Clone)]
pub struct ExtractionCascade {
    strategies: Vec<Strategy>,
}

impl ExtractionCascade {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    /// The standard cascade for media files ending in `extension`
    ///
    /// # Strategies
    ///
    /// 1. `nested`: `<source>` inside `<video>` whose `src` ends with the extension
    /// 2. `loose`: any `<source>` whose `src` contains the extension
    /// 3. `data-src`: `<source>` inside `<video>`, reading `data-src` then `src`
    pub fn for_extension(extension: &str) -> Self {
        Self::new(vec![
            Strategy::new(
                "nested",
                format!("video source[src$='{}']", extension),
                &["src"],
                None,
            ),
            Strategy::new(
                "loose",
                format!("source[src*='{}']", extension),
                &["src"],
                Some(extension),
            ),
            Strategy::new(
                "data-src",
                "video source".to_string(),
                &["data-src", "src"],
                Some(extension),
            ),
        ])
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Returns the current candidate references, de-duplicated in first-seen order
    ///
    /// A strategy whose query fails is skipped. The scan fails only when
    /// every strategy's query failed.
    pub async fn extract<S>(&self, session: &S) -> SessionResult<Vec<AssetReference>>
    where
        S: PageSession + ?Sized,
    {
        let mut last_error: Option<SessionError> = None;
        let mut failures = 0;

        for strategy in &self.strategies {
            match strategy.collect(session).await {
                Ok(found) if !found.is_empty() => {
                    tracing::trace!("Strategy {} found {} references", strategy.name, found.len());
                    return Ok(dedup_in_order(found));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("Strategy {} failed: {}", strategy.name, e);
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if failures == self.strategies.len() => Err(e),
            _ => Ok(Vec::new()),
        }
    }
}

fn dedup_in_order(references: Vec<AssetReference>) -> Vec<AssetReference> {
    let mut seen = HashSet::new();
    references
        .into_iter()
        .filter(|r| seen.insert(r.clone()))
        .collect()
}
