//! Retry delay policies

use std::fmt;
use std::time::Duration;

/// Delay to wait after a failed attempt.
///
/// `attempt` is the 1-based index of the attempt that just failed.
pub trait BackoffPolicy: fmt::Debug + Send + Sync {
    fn delay(&self, attempt: u32) -> Duration;
}

/// `attempt × unit`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBackoff {
    pub unit: Duration,
}

impl LinearBackoff {
    pub fn new(unit: Duration) -> Self {
        Self { unit }
    }
}

impl Default for LinearBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl BackoffPolicy for LinearBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        self.unit.saturating_mul(attempt)
    }
}

/// `base × 2^(attempt-1)`, capped at `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    pub base: Duration,
    pub max: Duration,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base.saturating_mul(factor).min(self.max)
    }
}
