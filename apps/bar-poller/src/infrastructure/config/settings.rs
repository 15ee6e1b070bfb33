//! Poller Configuration Settings
//!
//! Configuration types for the poller, loaded from environment variables.
//! Everything except the OAuth client credentials has a default.

use std::path::PathBuf;
use std::time::Duration;

use crate::application::use_cases::PollSettings;
use crate::domain::market_data::{HistoricalBarsRequest, InstrumentSpec};
use crate::infrastructure::oauth::{DEFAULT_TOKEN_ENDPOINT, OAuthClientConfig};
use crate::infrastructure::token_store::FileTokenStore;

/// OAuth client settings.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthSettings {
    /// Token endpoint URL.
    pub token_endpoint: String,
    client_id: String,
    client_secret: String,
}

impl OAuthSettings {
    /// Create new OAuth settings.
    #[must_use]
    pub const fn new(token_endpoint: String, client_id: String, client_secret: String) -> Self {
        Self {
            token_endpoint,
            client_id,
            client_secret,
        }
    }

    /// Get the client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Get the client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Build the refresher configuration.
    #[must_use]
    pub fn client_config(&self) -> OAuthClientConfig {
        OAuthClientConfig::new(
            self.token_endpoint.clone(),
            self.client_id.clone(),
            self.client_secret.clone(),
        )
    }
}

impl std::fmt::Debug for OAuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSettings")
            .field("token_endpoint", &self.token_endpoint)
            .field("client_id", &"[REDACTED]")
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Gateway connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    /// Gateway host.
    pub host: String,
    /// Gateway port.
    pub port: u16,
    /// Client identifier for the session.
    pub client_id: u32,
    /// Bound on establishing a session.
    pub connect_timeout: Duration,
    /// Accept the gateway's self-signed certificate.
    pub accept_invalid_certs: bool,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            client_id: 1,
            connect_timeout: Duration::from_secs(10),
            accept_invalid_certs: true,
        }
    }
}

/// Complete poller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// OAuth client settings.
    pub oauth: OAuthSettings,
    /// Credential file location.
    pub token_file: PathBuf,
    /// Gateway connection settings.
    pub gateway: GatewaySettings,
    /// Instrument to poll.
    pub instrument: InstrumentSpec,
    /// Wait between iterations.
    pub poll_interval: Duration,
    /// Prometheus metrics port (0 = disabled).
    pub metrics_port: u16,
}

impl PollerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or
    /// a value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let client_id = env.required("OAUTH_CLIENT_ID")?;
        let client_secret = env.required("OAUTH_CLIENT_SECRET")?;
        let token_endpoint = env
            .optional("OAUTH_TOKEN_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_TOKEN_ENDPOINT.to_string());

        let token_file = match env.optional("TOKEN_FILE") {
            Some(path) => PathBuf::from(path),
            None => FileTokenStore::default_location().ok_or(ConfigError::NoHomeDirectory)?,
        };

        let defaults = GatewaySettings::default();
        let gateway = GatewaySettings {
            host: env.optional("GATEWAY_HOST").unwrap_or(defaults.host),
            port: env.parse("GATEWAY_PORT", defaults.port)?,
            client_id: env.parse("GATEWAY_CLIENT_ID", defaults.client_id)?,
            connect_timeout: env
                .parse("GATEWAY_CONNECT_TIMEOUT_SECS", defaults.connect_timeout.as_secs())
                .map(Duration::from_secs)?,
            accept_invalid_certs: env
                .bool("GATEWAY_ACCEPT_INVALID_CERTS", defaults.accept_invalid_certs)?,
        };

        let poll_defaults = PollSettings::default();
        let instrument = InstrumentSpec::stock(
            env.optional("POLL_SYMBOL")
                .unwrap_or(poll_defaults.instrument.symbol),
            env.optional("POLL_EXCHANGE")
                .unwrap_or(poll_defaults.instrument.exchange),
            env.optional("POLL_CURRENCY")
                .unwrap_or(poll_defaults.instrument.currency),
        );

        let poll_interval = env
            .parse("POLL_INTERVAL_SECS", poll_defaults.interval.as_secs())
            .map(Duration::from_secs)?;
        if poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "POLL_INTERVAL_SECS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            oauth: OAuthSettings::new(token_endpoint, client_id, client_secret),
            token_file,
            gateway,
            instrument,
            poll_interval,
            metrics_port: env.parse("METRICS_PORT", 0)?,
        })
    }

    /// Settings for the poll loop.
    #[must_use]
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            gateway_host: self.gateway.host.clone(),
            gateway_port: self.gateway.port,
            gateway_client_id: self.gateway.client_id,
            connect_timeout: self.gateway.connect_timeout,
            instrument: self.instrument.clone(),
            request: HistoricalBarsRequest::intraday(),
            interval: self.poll_interval,
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable could not be parsed.
    #[error("invalid value for {key}: {message}")]
    Invalid {
        /// Variable name.
        key: String,
        /// Parse error.
        message: String,
    },
    /// No TOKEN_FILE was given and the home directory is unknown.
    #[error("cannot determine home directory; set TOKEN_FILE")]
    NoHomeDirectory,
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        let value = (self.0)(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))?;
        if value.trim().is_empty() {
            return Err(ConfigError::EmptyValue(key.to_string()));
        }
        Ok(value)
    }

    /// Unset and blank values both mean "use the default".
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            })
        })
    }

    fn bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.optional(key) else {
            return Ok(default);
        };
        match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key: key.to_string(),
                message: format!("{raw:?} is not a boolean"),
            }),
        }
    }
}
