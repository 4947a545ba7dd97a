//! Transport trait, provider identities, and delivery result types.
//!
//! This module uses `#[async_trait]` instead of native async traits because
//! the registry holds transports as `Arc<dyn Transport>` - runtime selection
//! of primary/secondary/test providers needs dynamic dispatch, and native
//! async traits are not object-safe. Email sending is I/O-bound, so the one
//! boxed future per call is noise next to network latency.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::email::Email;
use crate::error::DispatchError;

/// Identity of a concrete email gateway.
///
/// This is a closed set: [`Mailjet`](ProviderId::Mailjet) and
/// [`Resend`](ProviderId::Resend) are the production gateways,
/// [`Mailpit`](ProviderId::Mailpit) is the local SMTP sandbox used in test
/// mode. Configuration binds the primary/secondary/test roles to members of
/// this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Mailpit local SMTP sandbox (test only)
    Mailpit,
    /// Mailjet Send API v3.1
    Mailjet,
    /// Resend API
    Resend,
}

impl ProviderId {
    /// The lowercase wire/config name of this provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Mailpit => "mailpit",
            ProviderId::Mailjet => "mailjet",
            ProviderId::Resend => "resend",
        }
    }

    /// Whether this provider may be bound to the primary/secondary roles.
    pub fn is_production(&self) -> bool {
        matches!(self, ProviderId::Mailjet | ProviderId::Resend)
    }

    /// All production provider identities.
    pub fn production_set() -> &'static [ProviderId] {
        &[ProviderId::Mailjet, ProviderId::Resend]
    }

    /// All test provider identities.
    pub fn test_set() -> &'static [ProviderId] {
        &[ProviderId::Mailpit]
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mailpit" => Ok(ProviderId::Mailpit),
            "mailjet" => Ok(ProviderId::Mailjet),
            "resend" => Ok(ProviderId::Resend),
            other => Err(DispatchError::Configuration(format!(
                "Unknown email provider: {}. Valid providers are: mailpit, mailjet, resend",
                other
            ))),
        }
    }
}

/// Result of a successful email delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryResult {
    /// Message ID assigned by the provider
    pub message_id: String,
}

impl DeliveryResult {
    /// Create a new delivery result with the provider-assigned message ID.
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
        }
    }
}

/// Trait for single-shot email transports.
///
/// A transport encapsulates exactly one external gateway's protocol and auth
/// details. No retry or fallback logic lives here - the orchestrator owns
/// that. Implementations must be safe for concurrent use: `send` takes
/// `&self` and must not mutate per-call state.
///
/// # Error contract
///
/// `send` returns every failure - remote rejection, auth error, network
/// error - as an `Err` value. Nothing panics across this boundary, so the
/// retry executor always sees a uniform result type.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Attempt one delivery.
    ///
    /// Returns the provider-assigned message ID on success.
    async fn send(&self, email: &Email) -> Result<DeliveryResult, DispatchError>;

    /// Best-effort liveness probe (credentials/connectivity).
    ///
    /// Returns `false` on any failure; never errors.
    async fn health_check(&self) -> bool;

    /// Identity of this transport.
    fn id(&self) -> ProviderId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_id_round_trips_through_str() {
        for id in [ProviderId::Mailpit, ProviderId::Mailjet, ProviderId::Resend] {
            assert_eq!(id.as_str().parse::<ProviderId>().unwrap(), id);
        }
    }

    #[test]
    fn unknown_provider_is_a_configuration_error() {
        let err = "sendmail".parse::<ProviderId>().unwrap_err();
        assert!(matches!(err, DispatchError::Configuration(_)));
        assert!(err.to_string().contains("sendmail"));
    }

    #[test]
    fn production_set_excludes_mailpit() {
        assert!(!ProviderId::Mailpit.is_production());
        assert!(ProviderId::Mailjet.is_production());
        assert!(ProviderId::Resend.is_production());
        assert!(!ProviderId::production_set().contains(&ProviderId::Mailpit));
    }
}
