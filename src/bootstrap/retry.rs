//! Backoff schedule for the startup connection loop.

use std::time::Duration;

/// Exponential backoff with a ceiling.
///
/// The delay after failed attempt `n` (0-based) is
/// `min(initial_delay * multiplier^n, max_delay)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first; 0 retries until cancelled
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Retry forever at a fixed interval; only cancellation stops it.
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: 0,
            initial_delay: delay,
            max_delay: delay,
            multiplier: 1.0,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Whether another attempt may follow `attempts_made` failures.
    pub fn allows_retry(&self, attempts_made: u32) -> bool {
        self.max_attempts == 0 || attempts_made < self.max_attempts
    }

    /// Delay to wait after failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        // 0 * inf is NaN once the exponent overflows
        if self.initial_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(5));
        assert_eq!(policy.delay_for(1), Duration::from_secs(10));
        assert_eq!(policy.delay_for(2), Duration::from_secs(20));
        assert_eq!(policy.delay_for(3), Duration::from_secs(40));
        assert_eq!(policy.delay_for(4), Duration::from_secs(60));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_initial_delay_stays_zero() {
        let policy = RetryPolicy {
            max_attempts: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::from_secs(30),
            multiplier: 10.0,
        };
        assert_eq!(policy.delay_for(0), Duration::ZERO);
        assert_eq!(policy.delay_for(400), Duration::ZERO);
        assert_eq!(policy.delay_for(u32::MAX), Duration::ZERO);
    }

    #[test]
    fn test_allows_retry() {
        let policy = RetryPolicy::default().with_max_attempts(3);
        assert!(policy.allows_retry(1));
        assert!(policy.allows_retry(2));
        assert!(!policy.allows_retry(3));

        let forever = RetryPolicy::unbounded(Duration::from_secs(5));
        assert!(forever.allows_retry(u32::MAX));
        assert_eq!(forever.delay_for(100), Duration::from_secs(5));
    }

    proptest! {
        #[test]
        fn prop_delay_is_monotonic_and_capped(
            initial_ms in 0u64..10_000,
            extra_ms in 0u64..120_000,
            multiplier in 1.0f64..4.0,
            attempt in 0u32..64,
        ) {
            let policy = RetryPolicy {
                max_attempts: 0,
                initial_delay: Duration::from_millis(initial_ms),
                max_delay: Duration::from_millis(initial_ms + extra_ms),
                multiplier,
            };
            let current = policy.delay_for(attempt);
            let next = policy.delay_for(attempt + 1);
            prop_assert!(current <= policy.max_delay);
            prop_assert!(next >= current);
        }
    }
}
