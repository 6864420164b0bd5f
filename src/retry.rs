//! Retry logic for provider calls.
//!
//! Search providers sometimes answer a valid query with nothing at all. The
//! helpers here repeat a call until its output is acceptable, pausing between
//! attempts. Errors are never retried; they go straight back to the caller.

use std::future::Future;
use std::time::Duration;
use rand::Rng;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, the first call included.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Maximum delay between attempts.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    /// Constant delay between a bounded number of attempts.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            max_delay: delay,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    /// Create a policy that calls exactly once.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Calculate the delay after a given (zero-based) failed attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_delay = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let capped_delay = base_delay.min(self.max_delay.as_millis() as f64);

        let final_delay = if self.jitter {
            let jitter_factor = rand::thread_rng().gen_range(0.5..1.5);
            capped_delay * jitter_factor
        } else {
            capped_delay
        };

        Duration::from_millis(final_delay as u64)
    }
}

/// Outcome of [`retry_until`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOutcome<T> {
    /// Output of the last attempt.
    pub value: T,
    /// Number of calls made.
    pub attempts: u32,
    /// Whether the last output was accepted.
    pub accepted: bool,
}

/// Call `operation` until `accept` approves its output or the policy runs out
/// of attempts.
///
/// The policy pauses between attempts but not after the last one. An error
/// from `operation` ends the loop immediately.
pub async fn retry_until<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    mut operation: F,
    accept: P,
) -> Result<RetryOutcome<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&T) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        let value = operation().await?;
        attempts += 1;

        if accept(&value) {
            return Ok(RetryOutcome { value, attempts, accepted: true });
        }
        if attempts >= max_attempts {
            return Ok(RetryOutcome { value, attempts, accepted: false });
        }

        let delay = policy.delay_for_attempt(attempts - 1);
        tracing::debug!(
            "Attempt {} of {} not accepted, retrying after {:?}",
            attempts,
            max_attempts,
            delay
        );
        tokio::time::sleep(delay).await;
    }
}
