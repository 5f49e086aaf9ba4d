//! # Reconnect Policy
//!
//! Bounded exponential backoff between transport reconnect attempts.

use std::time::Duration;

use tracing::warn;

use crate::error::{Result, RoastLoggerError};

/// Delay before the first reconnect attempt
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 2000;
/// Cap on the delay between attempts
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
/// Attempts before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// Doubles the delay after each failed attempt, up to a cap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    initial_delay: Duration,
    max_delay: Duration,
    max_attempts: u32,
    attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            DEFAULT_MAX_ATTEMPTS,
        )
    }
}

impl ReconnectPolicy {
    pub fn new(initial_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_attempts,
            attempts: 0,
        }
    }

    /// Delay before the next attempt, counting it as made
    ///
    /// # Errors
    ///
    /// Returns `ReconnectExhausted` once `max_attempts` have been used.
    pub fn next_delay(&mut self) -> Result<Duration> {
        if self.attempts >= self.max_attempts {
            return Err(RoastLoggerError::ReconnectExhausted {
                attempts: self.attempts,
            });
        }

        let factor = 1u32.checked_shl(self.attempts).unwrap_or(u32::MAX);
        let delay = self
            .initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay));

        self.attempts += 1;
        warn!(
            "Reconnect attempt {}/{} in {} ms",
            self.attempts,
            self.max_attempts,
            delay.as_millis()
        );
        Ok(delay)
    }

    /// Attempts used since the last reset
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Forget previous failures after a successful connect
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy::new(Duration::from_millis(2000), Duration::from_millis(10_000), max_attempts)
    }

    #[test]
    fn test_delay_doubles_up_to_cap() {
        let mut policy = policy(6);
        let delays: Vec<u128> = (0..5).map(|_| policy.next_delay().unwrap().as_millis()).collect();
        assert_eq!(delays, vec![2000, 4000, 8000, 10_000, 10_000]);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let mut policy = policy(2);
        policy.next_delay().unwrap();
        policy.next_delay().unwrap();

        match policy.next_delay() {
            Err(RoastLoggerError::ReconnectExhausted { attempts }) => assert_eq!(attempts, 2),
            other => panic!("Expected ReconnectExhausted, got: {:?}", other),
        }
    }

    #[test]
    fn test_reset_restarts_backoff() {
        let mut policy = policy(3);
        policy.next_delay().unwrap();
        policy.next_delay().unwrap();
        assert_eq!(policy.attempts(), 2);

        policy.reset();
        assert_eq!(policy.attempts(), 0);
        assert_eq!(policy.next_delay().unwrap(), Duration::from_millis(2000));
    }

    #[test]
    fn test_large_attempt_counts_do_not_overflow() {
        let mut policy = policy(100);
        for _ in 0..99 {
            assert!(policy.next_delay().unwrap() <= Duration::from_millis(10_000));
        }
    }

    #[test]
    fn test_default_first_delay() {
        let mut policy = ReconnectPolicy::default();
        assert_eq!(policy.next_delay().unwrap(), Duration::from_millis(DEFAULT_INITIAL_DELAY_MS));
    }
}
