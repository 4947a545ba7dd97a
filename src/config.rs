//! Immutable dispatch configuration.
//!
//! [`EmailConfig`] is constructed once at process start - from the
//! environment via [`EmailConfig::from_env`], or from any lookup function via
//! [`EmailConfig::load`] - then passed by reference into the registry and
//! orchestrator. Core logic never reads the environment itself.
//!
//! Validation happens here, at load time: provider roles must name members
//! of the production set and differ from each other, retry knobs must sit in
//! their documented ranges, and credentials must be present for every
//! production provider that is actually bound to a role.

use std::env;

use crate::address::Address;
use crate::error::DispatchError;
use crate::retry::RetryPolicy;
use crate::service::LogSeverity;
use crate::transport::ProviderId;

/// Hard ceiling on a single backoff sleep, in milliseconds.
pub const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// Retry knobs, validated to their documented ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Attempt ceiling per provider (`EMAIL_RETRY_COUNT`, 0-10, default 3)
    pub count: u32,
    /// Base backoff delay (`EMAIL_RETRY_DELAY_MS`, 100-30000, default 1000)
    pub base_delay_ms: u64,
    /// Backoff multiplier (`EMAIL_RETRY_BACKOFF_MULTIPLIER`, 1-5, default 2)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            count: 3,
            base_delay_ms: 1000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Dispatch configuration.
///
/// # Environment variables
///
/// | Variable | Description |
/// |----------|-------------|
/// | `EMAIL_FROM` | Default sender address (required) |
/// | `EMAIL_PROVIDER_PRIMARY` | `mailjet` or `resend` (required) |
/// | `EMAIL_PROVIDER_SECONDARY` | `mailjet` or `resend`, distinct from primary (required) |
/// | `EMAIL_USE_TEST_PROVIDER` | `true`/`1` to route everything to the test sandbox |
/// | `EMAIL_TEST_PROVIDER` | Test provider name (default: `mailpit`) |
/// | `EMAIL_RETRY_COUNT` | Attempts per provider (default: 3) |
/// | `EMAIL_RETRY_DELAY_MS` | Base backoff delay (default: 1000) |
/// | `EMAIL_RETRY_BACKOFF_MULTIPLIER` | Backoff multiplier (default: 2) |
/// | `EMAIL_FALLBACK_LOG_LEVEL` | Severity for fallback successes (default: `warning`) |
/// | `RESEND_API_KEY` | Resend API key |
/// | `MAILJET_API_KEY` | Mailjet API key |
/// | `MAILJET_API_SECRET` | Mailjet API secret |
/// | `MAILPIT_HOST` | Mailpit SMTP host (default: `localhost`) |
/// | `MAILPIT_PORT` | Mailpit SMTP port (default: 1025) |
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Default sender identity
    pub from: Address,
    /// Provider bound to the primary role
    pub primary: ProviderId,
    /// Provider bound to the secondary (fallback) role
    pub secondary: ProviderId,
    /// Route every send through the test provider, bypassing retry/fallback
    pub use_test_provider: bool,
    /// Provider bound to the test role
    pub test_provider: ProviderId,
    /// Retry knobs
    pub retry: RetryConfig,
    /// Severity recorded when a send succeeds via the fallback provider
    pub fallback_log_severity: LogSeverity,
    /// Resend API key
    pub resend_api_key: Option<String>,
    /// Mailjet API key
    pub mailjet_api_key: Option<String>,
    /// Mailjet API secret
    pub mailjet_api_secret: Option<String>,
    /// Mailpit SMTP host
    pub mailpit_host: String,
    /// Mailpit SMTP port
    pub mailpit_port: u16,
}

impl EmailConfig {
    /// Load and validate configuration from process environment variables.
    pub fn from_env() -> Result<Self, DispatchError> {
        Self::load(|key| env::var(key).ok())
    }

    /// Load and validate configuration from an arbitrary lookup function.
    ///
    /// Used by `from_env`, and directly by tests to avoid mutating process
    /// environment.
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DispatchError> {
        let from_raw = lookup("EMAIL_FROM")
            .ok_or_else(|| DispatchError::Configuration("EMAIL_FROM not set".into()))?;
        let from = Address::parse(&from_raw)?;

        let primary = required_provider(&lookup, "EMAIL_PROVIDER_PRIMARY")?;
        let secondary = required_provider(&lookup, "EMAIL_PROVIDER_SECONDARY")?;

        if !primary.is_production() {
            return Err(DispatchError::Configuration(format!(
                "EMAIL_PROVIDER_PRIMARY must be a production provider, got {}",
                primary
            )));
        }
        if !secondary.is_production() {
            return Err(DispatchError::Configuration(format!(
                "EMAIL_PROVIDER_SECONDARY must be a production provider, got {}",
                secondary
            )));
        }
        if primary == secondary {
            return Err(DispatchError::Configuration(
                "EMAIL_PROVIDER_PRIMARY and EMAIL_PROVIDER_SECONDARY must be different".into(),
            ));
        }

        let use_test_provider = lookup("EMAIL_USE_TEST_PROVIDER")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let test_provider = match lookup("EMAIL_TEST_PROVIDER") {
            Some(raw) => raw.parse::<ProviderId>()?,
            None => ProviderId::Mailpit,
        };
        if !ProviderId::test_set().contains(&test_provider) {
            return Err(DispatchError::Configuration(format!(
                "EMAIL_TEST_PROVIDER must be a test provider, got {}",
                test_provider
            )));
        }

        let retry = RetryConfig {
            count: int_in_range(&lookup, "EMAIL_RETRY_COUNT", 3, 0, 10)? as u32,
            base_delay_ms: int_in_range(&lookup, "EMAIL_RETRY_DELAY_MS", 1000, 100, 30_000)?,
            backoff_multiplier: float_in_range(
                &lookup,
                "EMAIL_RETRY_BACKOFF_MULTIPLIER",
                2.0,
                1.0,
                5.0,
            )?,
        };

        let fallback_log_severity = match lookup("EMAIL_FALLBACK_LOG_LEVEL") {
            Some(raw) => raw.parse::<LogSeverity>()?,
            None => LogSeverity::Warning,
        };

        let resend_api_key = lookup("RESEND_API_KEY");
        let mailjet_api_key = lookup("MAILJET_API_KEY");
        let mailjet_api_secret = lookup("MAILJET_API_SECRET");

        // Credential presence is only enforced for providers that are
        // actually bound to a role, and only outside test mode.
        if !use_test_provider {
            for role_provider in [primary, secondary] {
                match role_provider {
                    ProviderId::Resend if resend_api_key.is_none() => {
                        return Err(DispatchError::Configuration(
                            "RESEND_API_KEY is required when Resend is configured as a provider"
                                .into(),
                        ));
                    }
                    ProviderId::Mailjet
                        if mailjet_api_key.is_none() || mailjet_api_secret.is_none() =>
                    {
                        return Err(DispatchError::Configuration(
                            "MAILJET_API_KEY and MAILJET_API_SECRET are required when Mailjet is configured as a provider"
                                .into(),
                        ));
                    }
                    _ => {}
                }
            }
        }

        let mailpit_host = lookup("MAILPIT_HOST").unwrap_or_else(|| "localhost".to_string());
        let mailpit_port = match lookup("MAILPIT_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                DispatchError::Configuration(format!("MAILPIT_PORT must be a port number, got {}", raw))
            })?,
            None => 1025,
        };

        Ok(Self {
            from,
            primary,
            secondary,
            use_test_provider,
            test_provider,
            retry,
            fallback_log_severity,
            resend_api_key,
            mailjet_api_key,
            mailjet_api_secret,
            mailpit_host,
            mailpit_port,
        })
    }

    /// Build the retry policy from the validated knobs.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.count,
            self.retry.base_delay_ms,
            self.retry.backoff_multiplier,
            MAX_RETRY_DELAY_MS,
        )
    }
}

fn required_provider(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<ProviderId, DispatchError> {
    lookup(key)
        .ok_or_else(|| DispatchError::Configuration(format!("{} not set", key)))?
        .parse()
}

fn int_in_range(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
    min: u64,
    max: u64,
) -> Result<u64, DispatchError> {
    let value = match lookup(key) {
        Some(raw) => raw.parse::<u64>().map_err(|_| {
            DispatchError::Configuration(format!("{} must be an integer, got {}", key, raw))
        })?,
        None => default,
    };
    if value < min || value > max {
        return Err(DispatchError::Configuration(format!(
            "{} must be between {} and {}, got {}",
            key, min, max, value
        )));
    }
    Ok(value)
}

fn float_in_range(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: f64,
    min: f64,
    max: f64,
) -> Result<f64, DispatchError> {
    let value = match lookup(key) {
        Some(raw) => raw.parse::<f64>().map_err(|_| {
            DispatchError::Configuration(format!("{} must be a number, got {}", key, raw))
        })?,
        None => default,
    };
    if value < min || value > max {
        return Err(DispatchError::Configuration(format!(
            "{} must be between {} and {}, got {}",
            key, min, max, value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("EMAIL_FROM", "noreply@example.com"),
            ("EMAIL_PROVIDER_PRIMARY", "mailjet"),
            ("EMAIL_PROVIDER_SECONDARY", "resend"),
            ("RESEND_API_KEY", "re_123"),
            ("MAILJET_API_KEY", "mj_key"),
            ("MAILJET_API_SECRET", "mj_secret"),
        ])
    }

    fn load(vars: &HashMap<&str, &str>) -> Result<EmailConfig, DispatchError> {
        EmailConfig::load(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn loads_with_defaults() {
        let config = load(&base_vars()).unwrap();

        assert_eq!(config.from.email, "noreply@example.com");
        assert_eq!(config.primary, ProviderId::Mailjet);
        assert_eq!(config.secondary, ProviderId::Resend);
        assert!(!config.use_test_provider);
        assert_eq!(config.test_provider, ProviderId::Mailpit);
        assert_eq!(config.retry, RetryConfig::default());
        assert_eq!(config.fallback_log_severity, LogSeverity::Warning);
        assert_eq!(config.mailpit_host, "localhost");
        assert_eq!(config.mailpit_port, 1025);
    }

    #[test]
    fn rejects_identical_primary_and_secondary() {
        let mut vars = base_vars();
        vars.insert("EMAIL_PROVIDER_SECONDARY", "mailjet");

        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("must be different"));
    }

    #[test]
    fn rejects_test_provider_in_production_role() {
        let mut vars = base_vars();
        vars.insert("EMAIL_PROVIDER_PRIMARY", "mailpit");

        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("production provider"));
    }

    #[test]
    fn rejects_missing_credentials_for_bound_provider() {
        let mut vars = base_vars();
        vars.remove("RESEND_API_KEY");

        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("RESEND_API_KEY"));
    }

    #[test]
    fn test_mode_waives_credential_checks() {
        let mut vars = base_vars();
        vars.remove("RESEND_API_KEY");
        vars.remove("MAILJET_API_KEY");
        vars.remove("MAILJET_API_SECRET");
        vars.insert("EMAIL_USE_TEST_PROVIDER", "true");

        let config = load(&vars).unwrap();
        assert!(config.use_test_provider);
    }

    #[test]
    fn rejects_retry_count_out_of_range() {
        let mut vars = base_vars();
        vars.insert("EMAIL_RETRY_COUNT", "11");

        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("EMAIL_RETRY_COUNT"));
    }

    #[test]
    fn rejects_base_delay_below_floor() {
        let mut vars = base_vars();
        vars.insert("EMAIL_RETRY_DELAY_MS", "50");

        assert!(load(&vars).is_err());
    }

    #[test]
    fn accepts_fractional_backoff_multiplier() {
        let mut vars = base_vars();
        vars.insert("EMAIL_RETRY_BACKOFF_MULTIPLIER", "1.5");

        let config = load(&vars).unwrap();
        assert_eq!(config.retry.backoff_multiplier, 1.5);
    }

    #[test]
    fn rejects_invalid_from_address() {
        let mut vars = base_vars();
        vars.insert("EMAIL_FROM", "not-an-email");

        assert!(matches!(
            load(&vars).unwrap_err(),
            DispatchError::InvalidAddress(_)
        ));
    }

    #[test]
    fn parses_fallback_severity() {
        let mut vars = base_vars();
        vars.insert("EMAIL_FALLBACK_LOG_LEVEL", "info");

        let config = load(&vars).unwrap();
        assert_eq!(config.fallback_log_severity, LogSeverity::Info);
    }
}
