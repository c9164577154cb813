//! Human-like pacing delays

use crate::config::PixelRange;
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;

/// Inclusive delay range in milliseconds, written as `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "[u64; 2]")]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Draws a uniformly random delay from the range
    pub fn sample(&self) -> Duration {
        let ms = if self.min_ms >= self.max_ms {
            self.min_ms
        } else {
            rand::rng().random_range(self.min_ms..=self.max_ms)
        };
        Duration::from_millis(ms)
    }

    /// Sleeps for a sampled delay
    pub async fn pause(&self) {
        let delay = self.sample();
        tracing::trace!("Pausing {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}

impl From<[u64; 2]> for DelayRange {
    fn from([min_ms, max_ms]: [u64; 2]) -> Self {
        Self { min_ms, max_ms }
    }
}

/// Draws a scroll distance in pixels
pub fn scroll_distance(range: &PixelRange) -> u32 {
    if range.min >= range.max {
        range.min
    } else {
        rand::rng().random_range(range.min..=range.max)
    }
}
