//! Bounded retry with exponential backoff.
//!
//! Attempt `k` (1-based) that fails with attempts remaining waits
//! `unit * 2^k` before attempt `k + 1`. The last attempt never waits.
use std::fmt::Display;
use std::time::Duration;

/// Default number of attempts per batch.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default backoff unit; with it the waits are 2s, 4s, 8s, 16s.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.backoff_unit.saturating_mul(factor)
    }
}

/// Blocking suspension between attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Terminal state of the retry loop.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Succeeded { value: T, attempts: u32 },
    Exhausted { last: E, attempts: u32 },
}

/// Run `attempt` until it succeeds or the policy runs out of attempts.
///
/// Failures are logged here and never escape individually; the caller only
/// sees the value or the last error.
pub fn run_with_retry<T, E, F>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut attempt: F,
) -> RetryOutcome<T, E>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut k = 1;
    loop {
        tracing::info!(attempt = k, max_attempts, "attempt started");
        let err = match attempt(k) {
            Ok(value) => {
                tracing::info!(attempt = k, "attempt succeeded");
                return RetryOutcome::Succeeded { value, attempts: k };
            }
            Err(err) => err,
        };
        tracing::warn!(attempt = k, max_attempts, error = %err, "attempt failed");
        if k >= max_attempts {
            return RetryOutcome::Exhausted {
                last: err,
                attempts: k,
            };
        }
        let delay = policy.delay_after(k);
        tracing::info!(delay_ms = millis(delay), "waiting before next attempt");
        sleeper.sleep(delay);
        k += 1;
    }
}

/// Whole milliseconds in `delay`, clamped to `u64::MAX`.
fn millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}
