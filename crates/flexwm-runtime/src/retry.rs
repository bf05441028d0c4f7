//! Bounded retry passes for commands the host rejected.
//!
//! Backoff delays use fixed formulas with no jitter, so a replayed session
//! waits exactly as long as the first run.
//!
//! ```
//! use flexwm_runtime::retry::{BackoffStrategy, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(3, BackoffStrategy::Exponential {
//!     base_ms: 10,
//!     max_ms: 30,
//! });
//!
//! assert_eq!(policy.delay(0), Duration::from_millis(10));
//! assert_eq!(policy.delay(1), Duration::from_millis(20));
//! assert_eq!(policy.delay(2), Duration::from_millis(30));
//! ```

use std::time::Duration;

/// Backoff strategy between retry passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Same delay before every pass.
    Fixed {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// `base_ms * 2^attempt`, capped at `max_ms`.
    Exponential {
        /// Base delay in milliseconds.
        base_ms: u64,
        /// Maximum delay in milliseconds.
        max_ms: u64,
    },
    /// `base_ms * (attempt + 1)`, capped at `max_ms`.
    Linear {
        /// Base delay in milliseconds.
        base_ms: u64,
        /// Maximum delay in milliseconds.
        max_ms: u64,
    },
}

/// How many retry passes to make over failed commands, and how long to wait
/// before each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Passes after the initial attempt (0 = no retries).
    pub max_retries: u32,
    /// Wait before each retry pass.
    pub backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    /// Three immediate passes.
    fn default() -> Self {
        Self::new(3, BackoffStrategy::Fixed { delay_ms: 0 })
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u32, backoff: BackoffStrategy) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Execute once, never retry.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self::new(0, BackoffStrategy::Fixed { delay_ms: 0 })
    }

    /// Delay before the given retry pass (0-indexed).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match self.backoff {
            BackoffStrategy::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            BackoffStrategy::Exponential { base_ms, max_ms } => {
                let multiplier = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
                Duration::from_millis(base_ms.saturating_mul(multiplier).min(max_ms))
            }
            BackoffStrategy::Linear { base_ms, max_ms } => {
                let delay = base_ms.saturating_mul(u64::from(attempt) + 1);
                Duration::from_millis(delay.min(max_ms))
            }
        }
    }

    /// Sum of every delay the policy can wait.
    #[must_use]
    pub fn total_max_delay(&self) -> Duration {
        (0..self.max_retries).map(|attempt| self.delay(attempt)).sum()
    }

    /// Run `pass` over `pending` up to `max_retries` more times.
    ///
    /// `pass` keeps the entries that still fail. Returns the number of
    /// retry attempts made across all entries; whatever is left in `pending`
    /// afterwards has exhausted the policy.
    pub fn run<T>(&self, pending: &mut Vec<T>, mut pass: impl FnMut(u32, &T) -> bool) -> usize {
        let mut attempts = 0;
        for attempt in 0..self.max_retries {
            if pending.is_empty() {
                break;
            }
            let delay = self.delay(attempt);
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            attempts += pending.len();
            pending.retain(|entry| pass(attempt, entry));
        }
        attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_backoff_is_constant() {
        let policy = RetryPolicy::new(3, BackoffStrategy::Fixed { delay_ms: 5 });
        assert_eq!(policy.delay(0), Duration::from_millis(5));
        assert_eq!(policy.delay(7), Duration::from_millis(5));
        assert_eq!(policy.total_max_delay(), Duration::from_millis(15));
    }

    #[test]
    fn linear_backoff_caps() {
        let policy = RetryPolicy::new(
            4,
            BackoffStrategy::Linear {
                base_ms: 10,
                max_ms: 25,
            },
        );
        assert_eq!(policy.delay(0), Duration::from_millis(10));
        assert_eq!(policy.delay(1), Duration::from_millis(20));
        assert_eq!(policy.delay(2), Duration::from_millis(25));
    }

    #[test]
    fn exponential_backoff_saturates() {
        let policy = RetryPolicy::new(
            1,
            BackoffStrategy::Exponential {
                base_ms: 1,
                max_ms: u64::MAX,
            },
        );
        assert_eq!(policy.delay(100), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn run_stops_once_everything_succeeds() {
        let policy = RetryPolicy::default();
        let mut pending = vec!["a", "b"];
        let mut seen = Vec::new();
        let attempts = policy.run(&mut pending, |attempt, entry| {
            seen.push((attempt, *entry));
            // "b" succeeds on the second pass.
            *entry == "b" && attempt == 0
        });
        assert!(pending.is_empty());
        assert_eq!(attempts, 3);
        assert_eq!(seen, vec![(0, "a"), (0, "b"), (1, "b")]);
    }

    #[test]
    fn run_leaves_exhausted_entries() {
        let policy = RetryPolicy::default();
        let mut pending = vec![1, 2];
        let attempts = policy.run(&mut pending, |_, entry| *entry == 2);
        assert_eq!(pending, vec![2]);
        assert_eq!(attempts, 2 + 1 + 1);
    }

    #[test]
    fn no_retry_never_calls_pass() {
        let mut pending = vec![1];
        let attempts = RetryPolicy::no_retry().run(&mut pending, |_, _| unreachable!());
        assert_eq!(attempts, 0);
        assert_eq!(pending, vec![1]);
    }
}
