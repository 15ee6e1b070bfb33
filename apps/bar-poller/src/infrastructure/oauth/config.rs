//! OAuth client configuration.

use std::fmt;
use std::time::Duration;

/// Token endpoint used when none is configured.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://sim.logonvalidation.net/token";

/// Per-attempt HTTP timeout for the refresh request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client credentials and endpoint for the refresh grant.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthClientConfig {
    /// Token endpoint URL.
    pub token_endpoint: String,
    /// OAuth client identifier.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Per-attempt request timeout.
    pub timeout: Duration,
}

impl OAuthClientConfig {
    /// Create a config with the default request timeout.
    pub fn new(
        token_endpoint: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            token_endpoint: token_endpoint.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl fmt::Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthClientConfig")
            .field("token_endpoint", &self.token_endpoint)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}
