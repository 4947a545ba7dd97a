//! Provider registry: maps configured role identities to transports.
//!
//! The registry is built once at startup and shared read-only across all
//! in-flight orchestrations. Role accessors fail with
//! [`DispatchError::ProviderNotConfigured`] when a configured identity has no
//! bound transport - a deployment misconfiguration, surfaced per-call and
//! never retried.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::EmailConfig;
use crate::error::DispatchError;
use crate::providers::{MailjetTransport, MailpitTransport, ResendTransport};
use crate::transport::{ProviderId, Transport};

/// Registry of bound transports with role-based accessors.
pub struct ProviderRegistry {
    primary_id: ProviderId,
    secondary_id: ProviderId,
    test_id: ProviderId,
    use_test_provider: bool,
    production: HashMap<ProviderId, Arc<dyn Transport>>,
    test: HashMap<ProviderId, Arc<dyn Transport>>,
}

impl ProviderRegistry {
    /// Build the registry from configuration, instantiating every known
    /// transport.
    ///
    /// Missing credentials become empty strings here; config validation has
    /// already rejected that combination for any provider bound to a role
    /// outside test mode.
    pub fn from_config(config: &EmailConfig) -> Self {
        let mailjet = MailjetTransport::new(
            config.mailjet_api_key.clone().unwrap_or_default(),
            config.mailjet_api_secret.clone().unwrap_or_default(),
        );
        let resend = ResendTransport::new(config.resend_api_key.clone().unwrap_or_default());
        let mailpit = MailpitTransport::new(&config.mailpit_host, config.mailpit_port);

        let production: HashMap<ProviderId, Arc<dyn Transport>> = HashMap::from([
            (ProviderId::Mailjet, Arc::new(mailjet) as Arc<dyn Transport>),
            (ProviderId::Resend, Arc::new(resend) as Arc<dyn Transport>),
        ]);
        let test: HashMap<ProviderId, Arc<dyn Transport>> =
            HashMap::from([(ProviderId::Mailpit, Arc::new(mailpit) as Arc<dyn Transport>)]);

        Self::with_transports(config, production, test)
    }

    /// Build the registry with explicit transport bindings.
    ///
    /// Used by `from_config`, and directly by tests to inject stub
    /// transports.
    pub fn with_transports(
        config: &EmailConfig,
        production: HashMap<ProviderId, Arc<dyn Transport>>,
        test: HashMap<ProviderId, Arc<dyn Transport>>,
    ) -> Self {
        Self {
            primary_id: config.primary,
            secondary_id: config.secondary,
            test_id: config.test_provider,
            use_test_provider: config.use_test_provider,
            production,
            test,
        }
    }

    /// Identity bound to the primary role.
    pub fn primary_id(&self) -> ProviderId {
        self.primary_id
    }

    /// Identity bound to the secondary (fallback) role.
    pub fn secondary_id(&self) -> ProviderId {
        self.secondary_id
    }

    /// Identity bound to the test role.
    pub fn test_id(&self) -> ProviderId {
        self.test_id
    }

    /// Transport bound to the primary role.
    pub fn primary(&self) -> Result<Arc<dyn Transport>, DispatchError> {
        self.production_transport(self.primary_id, "primary")
    }

    /// Transport bound to the secondary role.
    pub fn secondary(&self) -> Result<Arc<dyn Transport>, DispatchError> {
        self.production_transport(self.secondary_id, "secondary")
    }

    /// Transport bound to the test role.
    pub fn test(&self) -> Result<Arc<dyn Transport>, DispatchError> {
        lookup(&self.test, self.test_id, "test")
    }

    /// Whether test mode is active.
    pub fn is_test_mode(&self) -> bool {
        self.use_test_provider
    }

    /// The transport and identity a send should start with: test when test
    /// mode is on, primary otherwise.
    pub fn active(&self) -> Result<(ProviderId, Arc<dyn Transport>), DispatchError> {
        if self.use_test_provider {
            Ok((self.test_id, self.test()?))
        } else {
            Ok((self.primary_id, self.primary()?))
        }
    }

    /// Probe the primary, secondary, and test transports independently.
    ///
    /// A transport that cannot be resolved or fails its probe reports
    /// `false`; one failing probe never prevents the others from running.
    /// Keys are `"{role}_{identity}"`.
    pub async fn health_check_all(&self) -> HashMap<String, bool> {
        let mut results = HashMap::new();

        for (role, id, transport) in [
            ("primary", self.primary_id, self.primary()),
            ("secondary", self.secondary_id, self.secondary()),
            ("test", self.test_id, self.test()),
        ] {
            let healthy = match transport {
                Ok(transport) => transport.health_check().await,
                Err(err) => {
                    tracing::warn!(role, provider = %id, error = %err, "Health check skipped");
                    false
                }
            };
            results.insert(format!("{}_{}", role, id), healthy);
        }

        results
    }

    fn production_transport(
        &self,
        id: ProviderId,
        role: &'static str,
    ) -> Result<Arc<dyn Transport>, DispatchError> {
        lookup(&self.production, id, role)
    }
}

fn lookup(
    map: &HashMap<ProviderId, Arc<dyn Transport>>,
    id: ProviderId,
    role: &'static str,
) -> Result<Arc<dyn Transport>, DispatchError> {
    map.get(&id).cloned().ok_or_else(|| {
        let mut available: Vec<ProviderId> = map.keys().copied().collect();
        available.sort_by_key(|p| p.as_str());
        tracing::error!(role, provider = %id, "Provider not configured");
        DispatchError::ProviderNotConfigured {
            role,
            requested: id,
            available,
        }
    })
}
