//! Page session capability surface
//!
//! The harvester never talks to a rendering engine directly. It needs only:
//! - navigate to a URL
//! - run a page script and read its result
//! - query elements by CSS selector and read their attributes
//! - wait until a condition holds or a timeout passes
//!
//! `PageSession` captures the first three; `wait_until` and
//! `wait_for_selector` build the last one on top of them.

#[cfg(feature = "browser")]
mod browser;
mod snapshot;

#[cfg(feature = "browser")]
pub use browser::ChromeSession;
pub use snapshot::{SnapshotElement, SnapshotSession};

use crate::SessionResult;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Interval between condition checks in `wait_until`
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A live, rendered page the harvester can drive
///
/// Implementations are driven serially by a single crawl; `&self` methods
/// never run concurrently with each other.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Handle to one element returned by `query`
    type Element: Send + Sync;

    /// Loads `url` in the session, bounded by the session's page-load timeout
    async fn navigate(&self, url: &str) -> SessionResult<()>;

    /// Evaluates a JavaScript expression in the page and returns its value
    ///
    /// Expressions without a value (e.g. `window.scrollBy(..)`) yield `Null`.
    async fn run_script(&self, code: &str) -> SessionResult<serde_json::Value>;

    /// Returns the elements matching `selector`, in document order
    async fn query(&self, selector: &str) -> SessionResult<Vec<Self::Element>>;

    /// Reads one attribute of an element; `Ok(None)` if it is absent
    async fn read_attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> SessionResult<Option<String>>;

    /// Releases the underlying engine; called once at the end of a run
    async fn close(&self) -> SessionResult<()> {
        Ok(())
    }
}

/// Result of waiting on a page condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Satisfied,
    TimedOut,
}

/// Polls `condition` until it returns true or `timeout` elapses
pub async fn wait_until<F, Fut>(timeout: Duration, mut condition: F) -> WaitOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let poll = async {
        loop {
            if condition().await {
                return;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    };

    match tokio::time::timeout(timeout, poll).await {
        Ok(()) => WaitOutcome::Satisfied,
        Err(_) => WaitOutcome::TimedOut,
    }
}

/// Waits for a shutting-down engine to exit, giving up after `timeout`
pub async fn wait_for_exit<Fut>(timeout: Duration, exit: Fut) -> WaitOutcome
where
    Fut: Future,
{
    match tokio::time::timeout(timeout, exit).await {
        Ok(_) => WaitOutcome::Satisfied,
        Err(_) => WaitOutcome::TimedOut,
    }
}

/// Waits until at least one element matches `selector`
///
/// Query failures count as "not present yet".
pub async fn wait_for_selector<S>(session: &S, selector: &str, timeout: Duration) -> WaitOutcome
where
    S: PageSession + ?Sized,
{
    wait_until(timeout, move || async move {
        session
            .query(selector)
            .await
            .map(|elements| !elements.is_empty())
            .unwrap_or(false)
    })
    .await
}
