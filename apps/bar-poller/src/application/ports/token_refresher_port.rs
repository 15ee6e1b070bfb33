//! Token Refresher Port (Driven Port)
//!
//! Exchange of a refresh token for a new access token.

use async_trait::async_trait;

use crate::domain::credential::TokenGrant;
use crate::resilience::RetryPolicy;

/// Terminal refresh failure, after any retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    /// The endpoint rejected the refresh token (HTTP 4xx). Not retried.
    #[error("token endpoint rejected the refresh (HTTP {status}): {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Every attempt failed transiently.
    #[error("failed to refresh token after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Last observed error.
        last: String,
    },

    /// Shutdown was requested while waiting to retry.
    #[error("token refresh cancelled by shutdown")]
    Cancelled,

    /// The HTTP client could not be constructed.
    #[error("token refresh client error: {0}")]
    Client(String),
}

impl RefreshError {
    /// Whether the refresh token itself was refused.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Port for the refresh-token grant.
#[async_trait]
pub trait TokenRefresherPort: Send + Sync {
    /// Exchange `refresh_token` for a new grant, retrying transient failures
    /// according to `policy`.
    async fn refresh(
        &self,
        refresh_token: &str,
        policy: &RetryPolicy,
    ) -> Result<TokenGrant, RefreshError>;
}
