//! Resend API transport.
//!
//! # Example
//!
//! ```rust,ignore
//! use relaio::providers::ResendTransport;
//!
//! let transport = ResendTransport::new("re_xxxxx");
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::email::Email;
use crate::error::DispatchError;
use crate::transport::{DeliveryResult, ProviderId, Transport};

const RESEND_API_URL: &str = "https://api.resend.com";

/// Resend API email transport.
pub struct ResendTransport {
    api_key: String,
    client: Client,
    base_url: String,
}

impl ResendTransport {
    /// Create a new Resend transport with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            base_url: RESEND_API_URL.to_string(),
        }
    }

    /// Set a custom base URL (for testing).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn build_request(&self, email: &Email) -> Result<ResendRequest, DispatchError> {
        let from = email.from.as_ref().ok_or(DispatchError::MissingField("from"))?;

        if email.to.is_empty() {
            return Err(DispatchError::MissingField("to"));
        }

        Ok(ResendRequest {
            from: from.formatted(),
            to: email.to.iter().map(|a| a.formatted()).collect(),
            subject: email.subject.clone(),
            html: email.html_body.clone(),
            cc: if email.cc.is_empty() {
                None
            } else {
                Some(email.cc.iter().map(|a| a.formatted()).collect())
            },
            bcc: if email.bcc.is_empty() {
                None
            } else {
                Some(email.bcc.iter().map(|a| a.formatted()).collect())
            },
        })
    }
}

#[async_trait]
impl Transport for ResendTransport {
    async fn send(&self, email: &Email) -> Result<DeliveryResult, DispatchError> {
        let request = self.build_request(email)?;

        let url = format!("{}/emails", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            let result: ResendResponse = response.json().await?;
            Ok(DeliveryResult::new(result.id))
        } else {
            let error: ResendError = response.json().await.unwrap_or(ResendError {
                message: "Unknown error".to_string(),
            });
            Err(DispatchError::provider_with_status(
                ProviderId::Resend,
                error.message,
                status.as_u16(),
            ))
        }
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/emails", self.base_url);
        match self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::warn!(error = %err, "Resend health check failed");
                false
            }
        }
    }

    fn id(&self) -> ProviderId {
        ProviderId::Resend
    }
}

// ============================================================================
// Resend API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ResendRequest {
    from: String,
    to: Vec<String>,
    subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cc: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bcc: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ResendError {
    message: String,
}
