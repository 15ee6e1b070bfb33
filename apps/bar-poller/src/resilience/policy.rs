//! Retry Policy
//!
//! Exponential backoff. The delay before retry `n`
//! (zero-based) is `initial_backoff * multiplier^n`, capped at `max_backoff`.

use std::time::Duration;

/// Retry and backoff configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::token_refresh()
    }
}

impl RetryPolicy {
    /// Policy used for the refresh-token grant: 2 retries, 1 s then 2 s.
    #[must_use]
    pub const fn token_refresh() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_secs(1),
            multiplier: 2.0,
            max_backoff: Duration::from_secs(60),
        }
    }

    /// Doubling policy capped at one minute per delay.
    #[must_use]
    pub const fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            multiplier: 2.0,
            max_backoff: Duration::from_secs(60),
        }
    }

    /// Total attempts allowed, including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait before retry number `retry` (zero-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let scaled = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        if scaled.is_finite() && scaled > 0.0 {
            Duration::from_secs_f64(scaled.min(self.max_backoff.as_secs_f64()))
        } else if scaled > 0.0 {
            self.max_backoff
        } else {
            Duration::ZERO
        }
    }

    /// Cumulative delay spent waiting if every attempt fails.
    #[must_use]
    pub fn worst_case_delay(&self) -> Duration {
        (0..self.max_retries).map(|retry| self.delay_for(retry)).sum()
    }
}
