use std::fmt;
use std::time::{Duration, Instant};

/// Step of a search attempt that can fail and be retried independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    Capture,
    Match,
}

impl FailureCategory {
    pub const ALL: [FailureCategory; 2] = [FailureCategory::Capture, FailureCategory::Match];

    fn index(self) -> usize {
        match self {
            FailureCategory::Capture => 0,
            FailureCategory::Match => 1,
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCategory::Capture => f.write_str("capture"),
            FailureCategory::Match => f.write_str("match"),
        }
    }
}

/// Bounded retry parameters shared by every failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryConfig {
    /// Retries allowed before a category is declared terminal.
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(500),
            backoff_max: Duration::from_secs(8),
        }
    }
}

impl RecoveryConfig {
    /// Delay before retrying after the `failures`-th consecutive failure.
    pub fn backoff(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1);
        let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.backoff_base
            .saturating_mul(factor)
            .min(self.backoff_max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryDecision {
    Retry { attempt: u32, delay: Duration },
    GiveUp { attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct CategoryCounter {
    failures: u32,
    last_failure: Option<Instant>,
}

/// Consecutive-failure counters, one per [`FailureCategory`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecoveryTracker {
    counters: [CategoryCounter; 2],
}

impl RecoveryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_failure(
        &mut self,
        category: FailureCategory,
        now: Instant,
        config: &RecoveryConfig,
    ) -> RecoveryDecision {
        let counter = &mut self.counters[category.index()];
        counter.failures = counter.failures.saturating_add(1);
        counter.last_failure = Some(now);

        if counter.failures > config.max_attempts {
            RecoveryDecision::GiveUp {
                attempts: counter.failures,
            }
        } else {
            RecoveryDecision::Retry {
                attempt: counter.failures,
                delay: config.backoff(counter.failures),
            }
        }
    }

    pub fn record_success(&mut self, category: FailureCategory) {
        self.counters[category.index()].failures = 0;
    }

    pub fn reset(&mut self) {
        self.counters = Default::default();
    }

    pub fn failures(&self, category: FailureCategory) -> u32 {
        self.counters[category.index()].failures
    }

    pub fn last_failure(&self, category: FailureCategory) -> Option<Instant> {
        self.counters[category.index()].last_failure
    }
}
