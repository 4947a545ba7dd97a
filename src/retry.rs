//! Bounded retry with exponential backoff.
//!
//! [`RetryPolicy::execute`] runs an arbitrary fallible async operation up to
//! `max_attempts` times, sleeping between failed attempts. It knows nothing
//! about what the operation does - the orchestrator reuses it identically
//! for the primary and secondary transports.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

/// Retry configuration: attempt ceiling and backoff curve.
///
/// Constructed once (from [`EmailConfig`](crate::config::EmailConfig)) and
/// shared read-only across orchestrations.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    backoff_multiplier: f64,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1000, 2.0, 30_000)
    }
}

/// Outcome of a retry run.
///
/// `errors` holds one `"Attempt {n}: {message}"` entry per failed attempt,
/// in order - also on success, when earlier attempts failed.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    /// The operation's value, if any attempt succeeded.
    pub result: Option<T>,
    /// Number of attempts actually made.
    pub attempts: u32,
    /// Ordered messages of every failed attempt.
    pub errors: Vec<String>,
}

impl<T> RetryOutcome<T> {
    /// Whether any attempt succeeded.
    pub fn succeeded(&self) -> bool {
        self.result.is_some()
    }
}

impl RetryPolicy {
    /// Create a policy.
    ///
    /// `max_attempts` is clamped to at least 1 and `backoff_multiplier` to at
    /// least 1.0; config-level validation rejects out-of-range values before
    /// this point.
    pub fn new(
        max_attempts: u32,
        base_delay_ms: u64,
        backoff_multiplier: f64,
        max_delay_ms: u64,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(base_delay_ms),
            backoff_multiplier: backoff_multiplier.max(1.0),
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    /// The attempt ceiling.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff delay before the attempt following `attempt` (1-based).
    ///
    /// `min(base * multiplier^(attempt - 1), max_delay)`. The clamp is
    /// applied in f64 milliseconds, so large attempt numbers saturate at
    /// `max_delay` instead of overflowing `Duration`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let delay_ms = (self.base_delay.as_millis() as f64 * factor)
            .min(self.max_delay.as_millis() as f64);
        Duration::from_millis(delay_ms as u64)
    }

    /// Run `operation` up to `max_attempts` times.
    ///
    /// Returns immediately after the first success, carrying the errors
    /// accumulated so far. Per-attempt errors are fully absorbed into the
    /// outcome; this method never short-circuits with an error itself.
    /// `context` labels the run in log output.
    pub async fn execute<T, E, F, Fut>(&self, mut operation: F, context: &str) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut errors = Vec::new();

        for attempt in 1..=self.max_attempts {
            tracing::debug!(context, attempt, max_attempts = self.max_attempts, "Attempting");

            match operation().await {
                Ok(result) => {
                    tracing::info!(context, attempt, "Succeeded");
                    return RetryOutcome {
                        result: Some(result),
                        attempts: attempt,
                        errors,
                    };
                }
                Err(err) => {
                    let message = err.to_string();
                    tracing::warn!(context, attempt, error = %message, "Attempt failed");
                    errors.push(format!("Attempt {}: {}", attempt, message));

                    if attempt < self.max_attempts {
                        let delay = self.delay_for(attempt);
                        tracing::debug!(context, delay_ms = delay.as_millis() as u64, "Backing off");
                        sleep(delay).await;
                    }
                }
            }
        }

        tracing::error!(context, attempts = self.max_attempts, "All attempts failed");

        RetryOutcome {
            result: None,
            attempts: self.max_attempts,
            errors,
        }
    }
}
