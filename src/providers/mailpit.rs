//! Mailpit sandbox transport (plain SMTP via lettre).
//!
//! Mailpit is a local SMTP catch-all used in test mode; it accepts anything
//! on port 1025 without TLS or auth, so this transport deliberately uses
//! `builder_dangerous`.
//!
//! # Example
//!
//! ```rust,ignore
//! use relaio::providers::MailpitTransport;
//!
//! let transport = MailpitTransport::new("localhost", 1025);
//! ```

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::address::Address;
use crate::email::Email;
use crate::error::DispatchError;
use crate::transport::{DeliveryResult, ProviderId, Transport};

/// Local SMTP sandbox transport.
pub struct MailpitTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl MailpitTransport {
    /// Connect to a Mailpit instance at the given host and port.
    pub fn new(host: &str, port: u16) -> Self {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .build();

        Self { transport }
    }

    /// Connect to Mailpit on localhost:1025 (its default SMTP listener).
    pub fn localhost() -> Self {
        Self::new("localhost", 1025)
    }

    /// Build a lettre Message from our Email struct.
    fn build_message(&self, email: &Email) -> Result<Message, DispatchError> {
        let from = email.from.as_ref().ok_or(DispatchError::MissingField("from"))?;

        if email.to.is_empty() {
            return Err(DispatchError::MissingField("to"));
        }

        let html = email
            .html_body
            .as_ref()
            .ok_or(DispatchError::MissingField("html"))?;

        let mut builder = Message::builder()
            .from(address_to_mailbox(from)?)
            .subject(email.subject.clone());

        for to in &email.to {
            builder = builder.to(address_to_mailbox(to)?);
        }
        for cc in &email.cc {
            builder = builder.cc(address_to_mailbox(cc)?);
        }
        for bcc in &email.bcc {
            builder = builder.bcc(address_to_mailbox(bcc)?);
        }

        Ok(builder.header(ContentType::TEXT_HTML).body(html.clone())?)
    }
}

#[async_trait]
impl Transport for MailpitTransport {
    async fn send(&self, email: &Email) -> Result<DeliveryResult, DispatchError> {
        let message = self.build_message(email)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| DispatchError::SendError(e.to_string()))?;

        // Extract message ID from the SMTP response, or generate one
        let message_id = response
            .message()
            .next()
            .and_then(|m| m.lines().next())
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(DeliveryResult::new(message_id))
    }

    async fn health_check(&self) -> bool {
        match self.transport.test_connection().await {
            Ok(alive) => alive,
            Err(err) => {
                tracing::warn!(error = %err, "Mailpit health check failed");
                false
            }
        }
    }

    fn id(&self) -> ProviderId {
        ProviderId::Mailpit
    }
}

/// Convert our Address to lettre's Mailbox.
fn address_to_mailbox(addr: &Address) -> Result<Mailbox, DispatchError> {
    let email = addr
        .email
        .parse()
        .map_err(|e: lettre::address::AddressError| DispatchError::InvalidAddress(e.to_string()))?;

    Ok(Mailbox::new(addr.name.clone(), email))
}
