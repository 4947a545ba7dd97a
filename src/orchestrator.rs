//! Send orchestration: test-mode bypass, retry, and provider fallback.
//!
//! One orchestration drives a single email to a terminal outcome:
//!
//! - test mode: exactly one direct send via the test transport - no retry,
//!   no fallback. Sandbox transports are assumed reliable; retrying them
//!   only slows feedback loops.
//! - production: the primary transport wrapped in the retry policy, then -
//!   only once primary's whole budget is exhausted - the secondary transport
//!   wrapped identically. No interleaving, no early switch.
//!
//! Every failed attempt's message is preserved and attributed to its
//! provider, both in the success report and in the terminal error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::email::Email;
use crate::error::DispatchError;
use crate::registry::ProviderRegistry;
use crate::retry::{RetryOutcome, RetryPolicy};
use crate::transport::{DeliveryResult, ProviderId, Transport};

/// Terminal outcome of one successful orchestration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReport {
    /// Message ID assigned by the provider that delivered the email
    pub message_id: String,
    /// Identity of the delivering provider
    pub provider: ProviderId,
    /// Total attempts made across all providers
    pub attempts: u32,
    /// Whether the secondary provider delivered the email
    pub used_fallback: bool,
    /// Ordered messages of every failed attempt along the way
    pub errors: Vec<String>,
}

/// Coordinates transports, retry, and fallback for one send at a time.
///
/// Holds only shared read-only state, so a single instance serves any number
/// of concurrent orchestrations.
pub struct Orchestrator {
    registry: Arc<ProviderRegistry>,
    retry: RetryPolicy,
}

impl Orchestrator {
    /// Create an orchestrator over the given registry and retry policy.
    pub fn new(registry: Arc<ProviderRegistry>, retry: RetryPolicy) -> Self {
        Self { registry, retry }
    }

    /// Deliver `email` via retry-then-fallback.
    ///
    /// Returns a [`DispatchReport`] on success. Fails with
    /// [`DispatchError::TestProviderFailed`] when the single test-mode send
    /// is rejected, or [`DispatchError::AllProvidersFailed`] when both
    /// production retry budgets are exhausted.
    pub async fn send_with_fallback(&self, email: &Email) -> Result<DispatchReport, DispatchError> {
        if self.registry.is_test_mode() {
            return self.send_via_test(email).await;
        }

        let primary_id = self.registry.primary_id();
        let primary = self.registry.primary()?;

        tracing::info!(provider = %primary_id, "Attempting to send email via primary provider");

        let primary_run = self.run_with_retry(primary.as_ref(), primary_id, email).await;

        if let Some(delivery) = primary_run.result {
            return Ok(DispatchReport {
                message_id: delivery.message_id,
                provider: primary_id,
                attempts: primary_run.attempts,
                used_fallback: false,
                errors: primary_run.errors,
            });
        }

        let mut all_errors = attribute(primary_id, &primary_run.errors);

        let secondary_id = self.registry.secondary_id();
        let secondary = self.registry.secondary()?;

        tracing::warn!(
            primary = %primary_id,
            secondary = %secondary_id,
            "Primary provider failed. Falling back to secondary"
        );

        let secondary_run = self
            .run_with_retry(secondary.as_ref(), secondary_id, email)
            .await;

        if let Some(delivery) = secondary_run.result {
            all_errors.extend(attribute(secondary_id, &secondary_run.errors));
            return Ok(DispatchReport {
                message_id: delivery.message_id,
                provider: secondary_id,
                attempts: primary_run.attempts + secondary_run.attempts,
                used_fallback: true,
                errors: all_errors,
            });
        }

        all_errors.extend(attribute(secondary_id, &secondary_run.errors));

        tracing::error!(
            primary = %primary_id,
            secondary = %secondary_id,
            "Both primary and secondary providers failed"
        );

        Err(DispatchError::AllProvidersFailed {
            primary: primary_id,
            secondary: secondary_id,
            total_attempts: primary_run.attempts + secondary_run.attempts,
            errors: all_errors,
        })
    }

    async fn run_with_retry(
        &self,
        transport: &dyn Transport,
        id: ProviderId,
        email: &Email,
    ) -> RetryOutcome<DeliveryResult> {
        let context = format!("provider[{}]", id);
        self.retry
            .execute(|| transport.send(email), &context)
            .await
    }

    /// Single direct send via the test transport. Fatal on failure: there is
    /// no tertiary transport to fall back to in test mode.
    async fn send_via_test(&self, email: &Email) -> Result<DispatchReport, DispatchError> {
        let test_id = self.registry.test_id();
        let test = self.registry.test()?;

        tracing::info!(provider = %test_id, "Test mode enabled. Sending via test provider");

        match test.send(email).await {
            Ok(delivery) => Ok(DispatchReport {
                message_id: delivery.message_id,
                provider: test_id,
                attempts: 1,
                used_fallback: false,
                errors: Vec::new(),
            }),
            Err(err) => {
                tracing::error!(provider = %test_id, error = %err, "Test provider failed");
                Err(DispatchError::TestProviderFailed {
                    provider: test_id,
                    error: err.to_string(),
                })
            }
        }
    }
}

/// Prefix each retry-run error with its provider identity.
fn attribute(id: ProviderId, errors: &[String]) -> Vec<String> {
    errors.iter().map(|e| format!("[{}] {}", id, e)).collect()
}
