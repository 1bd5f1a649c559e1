//! Reconnect delay policy.
//!
//! Classic exponential backoff: start at the initial interval, double
//! after every failed or closed cycle, cap at the maximum, reset on a
//! successful connection. No jitter, no retry limit.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Backoff
// ============================================================================

/// Exponential backoff state for one transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    /// Delay used after a successful connection.
    initial: Duration,
    /// Upper bound for any delay.
    max: Duration,
    /// Delay for the next scheduled attempt.
    current: Duration,
}

impl Backoff {
    /// Creates a backoff starting at `initial` and capped at `max`.
    #[inline]
    #[must_use]
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial.min(max),
        }
    }

    /// Returns the delay for the next attempt without advancing.
    #[inline]
    #[must_use]
    pub fn peek(&self) -> Duration {
        self.current
    }

    /// Returns the delay for the next attempt and doubles it for the one after.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self
            .current
            .checked_mul(2)
            .map_or(self.max, |doubled| doubled.min(self.max));
        delay
    }

    /// Resets to the initial delay after a successful connection.
    #[inline]
    pub fn reset(&mut self) {
        self.current = self.initial.min(self.max);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_doubles_until_cap() {
        let mut backoff = Backoff::new(Duration::from_millis(1000), Duration::from_millis(5000));

        let delays: Vec<u128> = (0..5).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 5000, 5000]);
    }

    #[test]
    fn test_reset_returns_to_initial() {
        let mut backoff = Backoff::new(Duration::from_millis(1000), Duration::from_secs(30));
        backoff.next_delay();
        backoff.next_delay();
        assert_eq!(backoff.peek(), Duration::from_millis(4000));

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_initial_above_max_is_capped() {
        let mut backoff = Backoff::new(Duration::from_secs(10), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_huge_values_saturate() {
        let mut backoff = Backoff::new(Duration::MAX / 2 + Duration::from_secs(1), Duration::MAX);
        backoff.next_delay();
        assert_eq!(backoff.peek(), Duration::MAX);
    }

    proptest! {
        #[test]
        fn prop_delay_after_n_failures(initial_ms in 1u64..5_000, max_ms in 5_000u64..120_000, n in 0u32..20) {
            let initial = Duration::from_millis(initial_ms);
            let max = Duration::from_millis(max_ms);
            let mut backoff = Backoff::new(initial, max);

            for _ in 0..n {
                backoff.next_delay();
            }

            let expected = initial_ms.saturating_mul(1u64 << n).min(max_ms);
            prop_assert_eq!(backoff.next_delay(), Duration::from_millis(expected));
        }
    }
}
