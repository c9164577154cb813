/// Phase definitions for the per-category crawl state machine
use std::fmt;

/// Where a category crawl currently is
///
/// `Loading -> WaitingForContent -> Scanning -> Done`, with `Loading -> Done`
/// when every navigation attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Navigating to the category feed page
    Loading,

    /// Polling for the first media element
    WaitingForContent,

    /// Scroll-extract-accept loop
    Scanning,

    /// Category finished; see the `StopReason`
    Done,
}

impl CrawlPhase {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Loading, Self::WaitingForContent)
                | (Self::Loading, Self::Done)
                | (Self::WaitingForContent, Self::Scanning)
                | (Self::Scanning, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::WaitingForContent => "waiting_for_content",
            Self::Scanning => "scanning",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a category crawl reached `Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The per-category quota was filled
    QuotaReached,

    /// The stall counter reached its limit
    NoProgress,

    /// Too many consecutive failed iterations
    ErrorBudgetExhausted,

    /// The recovery scroll after a failed iteration failed too
    RecoveryFailed,

    /// Every navigation attempt failed
    LoadFailed,
}

impl StopReason {
    /// Returns true if the category ended because of faults rather than normally
    pub fn is_abandoned(&self) -> bool {
        matches!(
            self,
            Self::ErrorBudgetExhausted | Self::RecoveryFailed | Self::LoadFailed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuotaReached => "quota_reached",
            Self::NoProgress => "no_progress",
            Self::ErrorBudgetExhausted => "error_budget_exhausted",
            Self::RecoveryFailed => "recovery_failed",
            Self::LoadFailed => "load_failed",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Counters that decide when a category scan ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanCounters {
    /// Candidates accepted in this category
    pub collected: usize,

    /// Iterations without progress (no acceptance and/or no page growth)
    pub stall_count: u32,

    /// Failed iterations since the last productive one
    pub consecutive_errors: u32,

    /// Scan iterations started
    pub iterations: u32,

    /// Page extent at the last measurement
    pub last_extent: u64,
}

impl ScanCounters {
    pub fn new(initial_extent: u64) -> Self {
        Self {
            last_extent: initial_extent,
            ..Self::default()
        }
    }

    /// Applies the acceptance signal of one completed scan
    pub fn record_scan(&mut self, accepted: usize) {
        if accepted == 0 {
            self.stall_count += 1;
        } else {
            self.stall_count = 0;
            self.consecutive_errors = 0;
        }
    }

    /// Applies the page-growth signal; returns true if the page grew
    ///
    /// An unchanged extent counts as a stall on top of any stall already
    /// recorded for the same iteration.
    pub fn record_extent(&mut self, extent: u64) -> bool {
        if extent == self.last_extent {
            self.stall_count += 1;
            false
        } else {
            self.last_extent = extent;
            true
        }
    }

    /// Counts a failed iteration and returns the new consecutive total
    pub fn record_error(&mut self) -> u32 {
        self.consecutive_errors += 1;
        self.consecutive_errors
    }

    pub fn quota_reached(&self, quota: usize) -> bool {
        self.collected >= quota
    }

    /// True on every `every`th stall
    pub fn wants_large_scroll(&self, every: u32) -> bool {
        every > 0 && self.stall_count > 0 && self.stall_count % every == 0
    }

    pub fn stalled_out(&self, limit: u32) -> bool {
        self.stall_count >= limit
    }

    pub fn errors_exhausted(&self, limit: u32) -> bool {
        self.consecutive_errors >= limit
    }
}
