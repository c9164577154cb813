//! Headless Chrome page session (feature `browser`)

use crate::config::BrowserConfig;
use crate::session::{wait_for_exit, PageSession, WaitOutcome};
use crate::{SessionError, SessionResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, SetBlockedUrLsParams};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Hides the automation flag from page scripts
const HIDE_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// How long `close` waits for the Chrome process to exit
const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Page session backed by one Chrome tab
pub struct ChromeSession {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    page_load_timeout: Duration,
}

impl ChromeSession {
    /// Launches Chrome and opens the tab used for the whole run
    ///
    /// Failure here is fatal to the run: there is nothing to crawl with.
    pub async fn launch(config: &BrowserConfig, page_load_timeout: Duration) -> SessionResult<Self> {
        let mut builder = LaunchConfig::builder()
            .request_timeout(page_load_timeout)
            .arg(format!("--user-agent={}", config.user_agent))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-notifications")
            .arg("--disable-infobars")
            .arg("--ignore-certificate-errors")
            .arg("--incognito")
            .arg("--disable-application-cache")
            .arg("--disk-cache-size=0")
            .arg("--log-level=3");
        if !config.headless {
            builder = builder.with_head();
        }
        let launch_config = builder.build().map_err(SessionError::Launch)?;

        let (browser, mut handler) = Browser::launch(launch_config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        page.evaluate_on_new_document(HIDE_WEBDRIVER_SCRIPT)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        if !config.blocked_urls.is_empty() {
            page.execute(SetBlockedUrLsParams::new(config.blocked_urls.clone()))
                .await
                .map_err(|e| SessionError::Launch(e.to_string()))?;
            page.execute(EnableParams::default())
                .await
                .map_err(|e| SessionError::Launch(e.to_string()))?;
            tracing::info!("Blocking {} ad/tracker URL patterns", config.blocked_urls.len());
        }

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
            page_load_timeout,
        })
    }
}

#[async_trait]
impl PageSession for ChromeSession {
    type Element = Element;

    async fn navigate(&self, url: &str) -> SessionResult<()> {
        match tokio::time::timeout(self.page_load_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(SessionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(SessionError::Timeout {
                operation: format!("navigation to {}", url),
                timeout: self.page_load_timeout,
            }),
        }
    }

    async fn run_script(&self, code: &str) -> SessionResult<serde_json::Value> {
        let result = self
            .page
            .evaluate(code)
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn query(&self, selector: &str) -> SessionResult<Vec<Element>> {
        self.page
            .find_elements(selector)
            .await
            .map_err(|e| SessionError::Query {
                selector: selector.to_string(),
                message: e.to_string(),
            })
    }

    async fn read_attribute(&self, element: &Element, name: &str) -> SessionResult<Option<String>> {
        element
            .attribute(name)
            .await
            .map_err(|e| SessionError::Element(e.to_string()))
    }

    async fn close(&self) -> SessionResult<()> {
        let mut browser = self.browser.lock().await;
        let result = browser.close().await;

        if let Err(e) = &result {
            // The process never got the close command, so waiting on it would hang
            tracing::warn!("Browser did not accept close ({}), killing it", e);
            if let Some(Err(kill_error)) = browser.kill().await {
                tracing::warn!("Failed to kill browser: {}", kill_error);
            }
        } else if wait_for_exit(CLOSE_TIMEOUT, browser.wait()).await == WaitOutcome::TimedOut {
            tracing::warn!(
                "Browser still running {}s after close, killing it",
                CLOSE_TIMEOUT.as_secs()
            );
            if let Some(Err(kill_error)) = browser.kill().await {
                tracing::warn!("Failed to kill browser: {}", kill_error);
            }
        }

        self.handler.abort();
        result
            .map(|_| ())
            .map_err(|e| SessionError::Launch(format!("failed to close browser: {}", e)))
    }
}
