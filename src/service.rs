//! Dispatch service: validation, default sender, and delivery logging.
//!
//! [`DispatchService`] is the seam between a message consumer and the
//! orchestrator. It fills in the configured sender, validates the request,
//! assigns an internal email id, and records the terminal outcome through
//! the [`DeliveryLog`] collaborator - persistence itself lives outside this
//! crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use crate::address::Address;
use crate::config::EmailConfig;
use crate::email::Email;
use crate::error::DispatchError;
use crate::orchestrator::Orchestrator;
use crate::registry::ProviderRegistry;
use crate::transport::ProviderId;

/// Severity attached to a delivery record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    Info,
    Warning,
    Error,
}

impl LogSeverity {
    /// The lowercase wire/config name of this severity.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogSeverity::Info => "info",
            LogSeverity::Warning => "warning",
            LogSeverity::Error => "error",
        }
    }
}

impl FromStr for LogSeverity {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(LogSeverity::Info),
            "warning" => Ok(LogSeverity::Warning),
            "error" => Ok(LogSeverity::Error),
            other => Err(DispatchError::Configuration(format!(
                "Unknown log severity: {}. Valid severities are: info, warning, error",
                other
            ))),
        }
    }
}

/// Terminal status of a send request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// Outcome handed to the [`DeliveryLog`] after every orchestration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    /// Internal id assigned to this send request
    pub email_id: String,
    pub status: DeliveryStatus,
    pub severity: LogSeverity,
    /// Delivering provider, or the test provider on a test-mode failure.
    /// `None` when both production providers were exhausted.
    pub provider: Option<ProviderId>,
    /// Message id assigned by the delivering provider
    pub provider_message_id: Option<String>,
    /// Ordered, provider-attributed messages of every failed attempt
    pub error_details: Vec<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Collaborator that persists delivery outcomes.
///
/// Implementations typically write an email record and a delivery log row;
/// this crate only defines the contract and a tracing-backed default.
#[async_trait]
pub trait DeliveryLog: Send + Sync {
    /// Record one terminal outcome.
    async fn record(&self, record: DeliveryRecord) -> Result<(), DispatchError>;
}

/// Delivery log that emits records as structured tracing events.
///
/// Useful as a default in development, or wherever persistence is handled
/// further up the stack.
#[derive(Debug, Default)]
pub struct TracingDeliveryLog;

#[async_trait]
impl DeliveryLog for TracingDeliveryLog {
    async fn record(&self, record: DeliveryRecord) -> Result<(), DispatchError> {
        match record.severity {
            LogSeverity::Info => tracing::info!(
                email_id = %record.email_id,
                status = ?record.status,
                provider = ?record.provider,
                provider_message_id = ?record.provider_message_id,
                "Delivery recorded"
            ),
            LogSeverity::Warning => tracing::warn!(
                email_id = %record.email_id,
                status = ?record.status,
                provider = ?record.provider,
                provider_message_id = ?record.provider_message_id,
                errors = ?record.error_details,
                "Delivery recorded"
            ),
            LogSeverity::Error => tracing::error!(
                email_id = %record.email_id,
                status = ?record.status,
                provider = ?record.provider,
                errors = ?record.error_details,
                "Delivery recorded"
            ),
        }
        Ok(())
    }
}

/// Receipt returned to the caller after a successful send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReceipt {
    /// Internal id assigned to this send request
    pub email_id: String,
    /// Message id assigned by the delivering provider
    pub provider_message_id: String,
}

/// Validates, dispatches, and records one email per call.
pub struct DispatchService {
    orchestrator: Orchestrator,
    delivery_log: Arc<dyn DeliveryLog>,
    default_from: Address,
    fallback_severity: LogSeverity,
}

impl DispatchService {
    /// Create a service over a prepared registry.
    pub fn new(
        config: &EmailConfig,
        registry: Arc<ProviderRegistry>,
        delivery_log: Arc<dyn DeliveryLog>,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::new(registry, config.retry_policy()),
            delivery_log,
            default_from: config.from.clone(),
            fallback_severity: config.fallback_log_severity,
        }
    }

    /// Dispatch one email and record its terminal outcome.
    ///
    /// The outcome - success or failure - is recorded through the delivery
    /// log before this method returns; on failure the original error is then
    /// propagated so the caller can NACK or dead-letter the originating
    /// message.
    pub async fn send(&self, email: Email) -> Result<SendReceipt, DispatchError> {
        let mut email = email;
        if email.from.is_none() {
            email.from = Some(self.default_from.clone());
        }

        if email.to.is_empty() {
            return Err(DispatchError::MissingField("to"));
        }
        if email.subject.is_empty() {
            return Err(DispatchError::MissingField("subject"));
        }
        if email.html_body.is_none() {
            return Err(DispatchError::MissingField("html"));
        }

        let email_id = uuid::Uuid::new_v4().to_string();

        match self.orchestrator.send_with_fallback(&email).await {
            Ok(report) => {
                let severity = if report.used_fallback {
                    tracing::warn!(
                        email_id = %email_id,
                        provider = %report.provider,
                        "Email sent via fallback provider"
                    );
                    self.fallback_severity
                } else {
                    LogSeverity::Info
                };

                self.delivery_log
                    .record(DeliveryRecord {
                        email_id: email_id.clone(),
                        status: DeliveryStatus::Sent,
                        severity,
                        provider: Some(report.provider),
                        provider_message_id: Some(report.message_id.clone()),
                        error_details: report.errors,
                        recorded_at: Utc::now(),
                    })
                    .await?;

                Ok(SendReceipt {
                    email_id,
                    provider_message_id: report.message_id,
                })
            }
            Err(err) => {
                let (provider, error_details) = match &err {
                    DispatchError::TestProviderFailed { provider, error } => {
                        (Some(*provider), vec![error.clone()])
                    }
                    DispatchError::AllProvidersFailed { errors, .. } => (None, errors.clone()),
                    other => (None, vec![other.to_string()]),
                };

                self.delivery_log
                    .record(DeliveryRecord {
                        email_id: email_id.clone(),
                        status: DeliveryStatus::Failed,
                        severity: LogSeverity::Error,
                        provider,
                        provider_message_id: None,
                        error_details,
                        recorded_at: Utc::now(),
                    })
                    .await?;

                Err(err)
            }
        }
    }
}
