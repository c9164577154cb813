//! Retry policies for page session calls
//!
//! Failures are surfaced as explicit `Attempt` values; the caller owns the
//! attempt budget and decides what exhaustion means.
//!
//! | Operation | Budget | Between attempts | On exhaustion |
//! |-----------|--------|------------------|---------------|
//! | Navigation | `navigation-attempts` | `pacing.load-retry` | category abandoned |
//! | Page script | `script-attempts` | `pacing.script-retry-backoff` | caller default used |

use crate::crawler::pacing::DelayRange;
use crate::session::PageSession;
use crate::SessionError;
use serde_json::Value;

/// Outcome of a retried operation
#[derive(Debug)]
pub enum Attempt<T> {
    /// The operation succeeded on attempt number `attempts`
    Succeeded { value: T, attempts: u32 },

    /// Every attempt failed; `last_error` is the final failure
    Exhausted {
        last_error: SessionError,
        attempts: u32,
    },
}

impl<T> Attempt<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    /// Returns the value, or `default` if every attempt failed
    pub fn value_or(self, default: T) -> T {
        match self {
            Self::Succeeded { value, .. } => value,
            Self::Exhausted { .. } => default,
        }
    }
}

/// Navigates to `url`, retrying with a recovery delay after each failure
pub async fn navigate_with_retry<S>(
    session: &S,
    url: &str,
    max_attempts: u32,
    recovery: &DelayRange,
) -> Attempt<()>
where
    S: PageSession + ?Sized,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match session.navigate(url).await {
            Ok(()) => {
                return Attempt::Succeeded {
                    value: (),
                    attempts: attempt,
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Error loading {} (attempt {}/{}): {}",
                    url,
                    attempt,
                    max_attempts,
                    e
                );
                recovery.pause().await;
                if attempt >= max_attempts {
                    return Attempt::Exhausted {
                        last_error: e,
                        attempts: attempt,
                    };
                }
                attempt += 1;
            }
        }
    }
}

/// Runs a page script, backing off between failed attempts
pub async fn run_script_with_retry<S>(
    session: &S,
    code: &str,
    max_attempts: u32,
    backoff: &DelayRange,
) -> Attempt<Value>
where
    S: PageSession + ?Sized,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match session.run_script(code).await {
            Ok(value) => {
                return Attempt::Succeeded {
                    value,
                    attempts: attempt,
                }
            }
            Err(e) if attempt < max_attempts => {
                tracing::warn!("Script failed (retry {}): {}", attempt, e);
                backoff.pause().await;
                attempt += 1;
            }
            Err(e) => {
                tracing::warn!("Script failed after {} attempts: {}", attempt, e);
                return Attempt::Exhausted {
                    last_error: e,
                    attempts: attempt,
                };
            }
        }
    }
}

/// Runs a page script, substituting `default` once retries are exhausted
pub async fn run_script_or<S>(
    session: &S,
    code: &str,
    default: Value,
    max_attempts: u32,
    backoff: &DelayRange,
) -> Value
where
    S: PageSession + ?Sized,
{
    run_script_with_retry(session, code, max_attempts, backoff)
        .await
        .value_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Session whose first `failures` calls fail
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }

        fn tick(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst) >= self.failures
        }
    }

    #[async_trait]
    impl PageSession for Flaky {
        type Element = ();

        async fn navigate(&self, url: &str) -> SessionResult<()> {
            if self.tick() {
                Ok(())
            } else {
                Err(SessionError::Navigation {
                    url: url.to_string(),
                    message: "connection reset".to_string(),
                })
            }
        }

        async fn run_script(&self, _code: &str) -> SessionResult<Value> {
            if self.tick() {
                Ok(Value::from(4200))
            } else {
                Err(SessionError::Script("detached frame".to_string()))
            }
        }

        async fn query(&self, _selector: &str) -> SessionResult<Vec<()>> {
            Ok(Vec::new())
        }

        async fn read_attribute(
            &self,
            _element: &(),
            _name: &str,
        ) -> SessionResult<Option<String>> {
            Ok(None)
        }
    }

    const DELAY: DelayRange = DelayRange::new(3_000, 6_000);

    #[tokio::test(start_paused = true)]
    async fn test_navigation_succeeds_after_retry() {
        let session = Flaky::new(2);
        let outcome = navigate_with_retry(&session, "https://example.com", 3, &DELAY).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_exhausted() {
        let session = Flaky::new(10);
        let outcome = navigate_with_retry(&session, "https://example.com", 3, &DELAY).await;
        assert!(matches!(
            outcome,
            Attempt::Exhausted {
                last_error: SessionError::Navigation { .. },
                attempts: 3
            }
        ));
        assert_eq!(session.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_script_default_on_exhaustion() {
        let session = Flaky::new(5);
        let value = run_script_or(
            &session,
            "document.body.scrollHeight",
            Value::from(7),
            2,
            &DELAY,
        )
        .await;
        assert_eq!(value, Value::from(7));
        assert_eq!(session.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_script_recovers_within_budget() {
        let session = Flaky::new(1);
        let value = run_script_or(
            &session,
            "document.body.scrollHeight",
            Value::Null,
            2,
            &DELAY,
        )
        .await;
        assert_eq!(value, Value::from(4200));
    }
}
