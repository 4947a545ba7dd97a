//! Mailjet Send API transport.
//!
//! For reference: [Mailjet API docs](https://dev.mailjet.com/guides/#send-api-v3-1)
//!
//! # Example
//!
//! ```rust,ignore
//! use relaio::providers::MailjetTransport;
//!
//! let transport = MailjetTransport::new("api_key", "api_secret");
//! ```

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::email::Email;
use crate::error::DispatchError;
use crate::transport::{DeliveryResult, ProviderId, Transport};

const MAILJET_API_URL: &str = "https://api.mailjet.com";

/// Mailjet API email transport.
pub struct MailjetTransport {
    api_key: String,
    secret_key: String,
    client: Client,
    base_url: String,
}

impl MailjetTransport {
    /// Create a new Mailjet transport with the given API key and secret key.
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            client: Client::new(),
            base_url: MAILJET_API_URL.to_string(),
        }
    }

    /// Set a custom base URL (for testing).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn auth_header(&self) -> String {
        let credentials = format!("{}:{}", self.api_key, self.secret_key);
        format!("Basic {}", BASE64.encode(credentials.as_bytes()))
    }

    fn build_request(&self, email: &Email) -> Result<MailjetRequest, DispatchError> {
        let from = email.from.as_ref().ok_or(DispatchError::MissingField("from"))?;

        if email.to.is_empty() {
            return Err(DispatchError::MissingField("to"));
        }

        Ok(MailjetRequest {
            messages: vec![MailjetMessage {
                from: mailjet_address(from),
                to: email.to.iter().map(mailjet_address).collect(),
                cc: if email.cc.is_empty() {
                    None
                } else {
                    Some(email.cc.iter().map(mailjet_address).collect())
                },
                bcc: if email.bcc.is_empty() {
                    None
                } else {
                    Some(email.bcc.iter().map(mailjet_address).collect())
                },
                subject: email.subject.clone(),
                html_part: email.html_body.clone(),
            }],
        })
    }
}

#[async_trait]
impl Transport for MailjetTransport {
    async fn send(&self, email: &Email) -> Result<DeliveryResult, DispatchError> {
        let request = self.build_request(email)?;

        let url = format!("{}/v3.1/send", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            let result: MailjetResponse = response.json().await?;
            let message_id = result
                .messages
                .first()
                .and_then(|m| m.to.first())
                .map(|t| t.message_id.to_string())
                .ok_or_else(|| {
                    DispatchError::provider(ProviderId::Mailjet, "Response contained no message ID")
                })?;

            Ok(DeliveryResult::new(message_id))
        } else {
            let error: MailjetError = response.json().await.unwrap_or(MailjetError {
                error_message: "Unknown error".to_string(),
            });
            Err(DispatchError::provider_with_status(
                ProviderId::Mailjet,
                error.error_message,
                status.as_u16(),
            ))
        }
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/v3/REST/user", self.base_url);
        match self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::warn!(error = %err, "Mailjet health check failed");
                false
            }
        }
    }

    fn id(&self) -> ProviderId {
        ProviderId::Mailjet
    }
}

fn mailjet_address(addr: &Address) -> MailjetAddress {
    MailjetAddress {
        email: addr.email.clone(),
        name: addr.name.clone().unwrap_or_default(),
    }
}

// ============================================================================
// Mailjet API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct MailjetRequest {
    #[serde(rename = "Messages")]
    messages: Vec<MailjetMessage>,
}

#[derive(Debug, Serialize)]
struct MailjetMessage {
    #[serde(rename = "From")]
    from: MailjetAddress,
    #[serde(rename = "To")]
    to: Vec<MailjetAddress>,
    #[serde(rename = "Cc", skip_serializing_if = "Option::is_none")]
    cc: Option<Vec<MailjetAddress>>,
    #[serde(rename = "Bcc", skip_serializing_if = "Option::is_none")]
    bcc: Option<Vec<MailjetAddress>>,
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "HTMLPart", skip_serializing_if = "Option::is_none")]
    html_part: Option<String>,
}

#[derive(Debug, Serialize)]
struct MailjetAddress {
    #[serde(rename = "Email")]
    email: String,
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct MailjetResponse {
    #[serde(rename = "Messages")]
    messages: Vec<MailjetResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct MailjetResponseMessage {
    #[serde(rename = "To", default)]
    to: Vec<MailjetRecipientStatus>,
}

#[derive(Debug, Deserialize)]
struct MailjetRecipientStatus {
    #[serde(rename = "MessageID")]
    message_id: u64,
}

#[derive(Debug, Deserialize)]
struct MailjetError {
    #[serde(rename = "ErrorMessage")]
    error_message: String,
}
