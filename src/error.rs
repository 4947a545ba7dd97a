//! Error types for relaio.

use thiserror::Error;

use crate::transport::ProviderId;

/// Errors that can occur when dispatching emails.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// Configuration error (missing env var, invalid value, etc.)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Missing required field (e.g., recipient list).
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Invalid email address format.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Error building the outbound message.
    #[error("Build error: {0}")]
    BuildError(String),

    /// Error sending the email.
    #[error("Send error: {0}")]
    SendError(String),

    /// Provider-specific error with details.
    #[error("Provider error ({provider}): {message}")]
    ProviderError {
        provider: ProviderId,
        message: String,
        /// Optional HTTP status code
        status: Option<u16>,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(String),

    /// A configured role points at a provider with no bound transport.
    ///
    /// This is a deployment misconfiguration, never a transient condition,
    /// and is never retried.
    #[error("{role} provider {requested} is not configured (available: {})", format_ids(.available))]
    ProviderNotConfigured {
        role: &'static str,
        requested: ProviderId,
        available: Vec<ProviderId>,
    },

    /// The test transport rejected the single direct send in test mode.
    #[error("Test provider {provider} failed: {error}")]
    TestProviderFailed { provider: ProviderId, error: String },

    /// Primary and secondary retry budgets are both exhausted.
    #[error("All providers failed: {primary} and {secondary} exhausted after {total_attempts} attempts")]
    AllProvidersFailed {
        primary: ProviderId,
        secondary: ProviderId,
        total_attempts: u32,
        /// Every failed attempt, in order, attributed to its provider.
        errors: Vec<String>,
    },

    /// Error recording the delivery outcome.
    #[error("Delivery log error: {0}")]
    DeliveryLog(String),
}

fn format_ids(ids: &[ProviderId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl DispatchError {
    /// Create a provider-specific error.
    pub fn provider(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::ProviderError {
            provider,
            message: message.into(),
            status: None,
        }
    }

    /// Create a provider error with HTTP status.
    pub fn provider_with_status(
        provider: ProviderId,
        message: impl Into<String>,
        status: u16,
    ) -> Self {
        Self::ProviderError {
            provider,
            message: message.into(),
            status: Some(status),
        }
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<lettre::error::Error> for DispatchError {
    fn from(err: lettre::error::Error) -> Self {
        Self::BuildError(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for DispatchError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Self::SendError(err.to_string())
    }
}

impl From<lettre::address::AddressError> for DispatchError {
    fn from(err: lettre::address::AddressError) -> Self {
        Self::InvalidAddress(err.to_string())
    }
}
