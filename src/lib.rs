//! # Relaio
//!
//! Email dispatch core with retry, exponential backoff, and provider
//! fallback.
//!
//! Relaio takes an already-rendered email, tries the configured primary
//! gateway with bounded exponential-backoff retries, falls back to the
//! secondary gateway once the primary's budget is exhausted, and hands a
//! truthful record of every attempt to a delivery-log collaborator. A test
//! mode routes everything to a local Mailpit sandbox with no retries.
//!
//! ## Quick Start
//!
//! Set environment variables:
//! ```bash
//! EMAIL_FROM=noreply@example.com
//! EMAIL_PROVIDER_PRIMARY=mailjet
//! EMAIL_PROVIDER_SECONDARY=resend
//! MAILJET_API_KEY=xxxxx
//! MAILJET_API_SECRET=xxxxx
//! RESEND_API_KEY=re_xxxxx
//! ```
//!
//! Then wire up the service once at startup:
//! ```rust,ignore
//! use std::sync::Arc;
//! use relaio::{DispatchService, Email, EmailConfig, ProviderRegistry, TracingDeliveryLog};
//!
//! let config = EmailConfig::from_env()?;
//! let registry = Arc::new(ProviderRegistry::from_config(&config));
//! let service = DispatchService::new(&config, registry, Arc::new(TracingDeliveryLog));
//!
//! let email = Email::new()
//!     .to("user@example.com")
//!     .subject("Welcome!")
//!     .html_body("<h1>Hello</h1>");
//!
//! let receipt = service.send(email).await?;
//! println!("Sent as {}", receipt.provider_message_id);
//! ```
//!
//! The full environment variable table lives on
//! [`EmailConfig`](crate::EmailConfig).
//!
//! ## Orchestration
//!
//! One send runs one state machine to completion:
//!
//! - test mode: one direct send via the test transport, no retry, no
//!   fallback; failure is fatal ([`DispatchError::TestProviderFailed`]).
//! - production: primary transport under the retry policy; only after its
//!   whole budget is exhausted, the secondary transport under the same
//!   policy; both exhausted is fatal
//!   ([`DispatchError::AllProvidersFailed`]) and carries every attempt's
//!   error, in order, attributed to its provider.
//!
//! Concurrent sends are independent: the registry and transports are shared
//! read-only, and backoff sleeps suspend without blocking other in-flight
//! orchestrations.

/// The version of the relaio crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod address;
mod config;
mod email;
mod error;
mod orchestrator;
mod registry;
mod retry;
mod service;
mod transport;

pub mod providers;

// Re-exports
pub use address::{Address, ToAddress};
pub use config::{EmailConfig, RetryConfig, MAX_RETRY_DELAY_MS};
pub use email::Email;
pub use error::DispatchError;
pub use orchestrator::{DispatchReport, Orchestrator};
pub use registry::ProviderRegistry;
pub use retry::{RetryOutcome, RetryPolicy};
pub use service::{
    DeliveryLog, DeliveryRecord, DeliveryStatus, DispatchService, LogSeverity, SendReceipt,
    TracingDeliveryLog,
};
pub use transport::{DeliveryResult, ProviderId, Transport};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::Address;
    pub use crate::DeliveryResult;
    pub use crate::DispatchError;
    pub use crate::DispatchReport;
    pub use crate::DispatchService;
    pub use crate::Email;
    pub use crate::EmailConfig;
    pub use crate::Orchestrator;
    pub use crate::ProviderId;
    pub use crate::ProviderRegistry;
    pub use crate::RetryPolicy;
    pub use crate::ToAddress;
    pub use crate::Transport;
}
