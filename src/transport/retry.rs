// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Bounded retry with exponential backoff for aggregated batch calls.
//!
//! The policy is applied by the [`MulticallExecutor`](crate::MulticallExecutor)
//! to a whole batch: every transport failure (delivery error, envelope decode
//! error, outcome count mismatch or per-attempt timeout) consumes one attempt.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of attempts, including the first one.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default base delay for exponential backoff (100ms).
const DEFAULT_BASE_DELAY_MS: u64 = 100;
/// Default growth factor applied per retry.
const DEFAULT_MULTIPLIER: u32 = 2;
/// Default maximum delay between attempts (30 seconds).
const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Retry policy for batch execution.
///
/// The delay before retry `n` (zero-based) is:
///
/// ```text
/// delay = min(base_delay * multiplier^n, max_delay)
/// ```
///
/// # Example
///
/// ```rust
/// use farmscan::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default()
///     .with_max_attempts(5)
///     .with_base_delay(Duration::from_millis(200));
///
/// assert_eq!(policy.backoff(0), Duration::from_millis(200));
/// assert_eq!(policy.backoff(1), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per batch, including the first. Never less than one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Factor the delay grows by on every further retry.
    pub multiplier: u32,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            multiplier: DEFAULT_MULTIPLIER,
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes a single attempt and never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Quick retries for latency-sensitive reads: 5 attempts, 50ms base, 10s cap.
    pub fn aggressive() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(50),
            multiplier: 2,
            max_delay: Duration::from_secs(10),
        }
    }

    /// Slow retries for endpoints that need time to recover: 3 attempts, 500ms base, 60s cap.
    pub fn conservative() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            multiplier: 2,
            max_delay: Duration::from_secs(60),
        }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    #[must_use]
    pub fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Attempts actually allowed, treating a zero configuration as one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after failed attempt `retry` (zero-based) before the next one.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = u128::from(self.multiplier).saturating_pow(retry);
        let delay_ms = self.base_delay.as_millis().saturating_mul(factor);
        let capped_ms = delay_ms.min(self.max_delay.as_millis());
        Duration::from_millis(u64::try_from(capped_ms).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(policy.base_delay, Duration::from_millis(DEFAULT_BASE_DELAY_MS));
        assert_eq!(policy.multiplier, DEFAULT_MULTIPLIER);
        assert_eq!(policy.max_delay, Duration::from_millis(DEFAULT_MAX_DELAY_MS));
    }

    #[test]
    fn test_presets() {
        assert_eq!(RetryPolicy::no_retry().attempts(), 1);
        assert_eq!(RetryPolicy::aggressive().max_attempts, 5);
        assert_eq!(RetryPolicy::conservative().base_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..Default::default()
        };
        assert_eq!(policy.attempts(), 1);
        assert_eq!(RetryPolicy::default().with_max_attempts(0).max_attempts, 1);
    }

    #[test]
    fn test_backoff_grows_by_multiplier() {
        let policy = RetryPolicy::default()
            .with_base_delay(Duration::from_millis(100))
            .with_multiplier(3)
            .with_max_delay(Duration::from_secs(10));

        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(300));
        assert_eq!(policy.backoff(2), Duration::from_millis(900));
    }

    #[test]
    fn test_backoff_capped() {
        let policy = RetryPolicy::default()
            .with_base_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(500));

        // 100ms * 2^3 = 800ms, capped at 500ms
        assert_eq!(policy.backoff(3), Duration::from_millis(500));
        assert_eq!(policy.backoff(10), Duration::from_millis(500));
    }

    #[test]
    fn test_backoff_overflow_protection() {
        let policy = RetryPolicy::default()
            .with_base_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(60));

        assert_eq!(policy.backoff(200), Duration::from_secs(60));
    }

    #[test]
    fn test_constant_backoff_with_unit_multiplier() {
        let policy = RetryPolicy::default().with_multiplier(1);
        assert_eq!(policy.backoff(0), policy.backoff(7));
    }
}
