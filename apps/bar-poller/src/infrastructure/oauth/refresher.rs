//! HTTP token refresher.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use tokio_util::sync::CancellationToken;

use super::config::OAuthClientConfig;
use crate::application::ports::{Clock, RefreshError, SystemClock, TokenRefresherPort};
use crate::domain::credential::{TokenGrant, TokenResponse};
use crate::infrastructure::metrics::{self, RefreshLabel};
use crate::resilience::{AttemptOutcome, RetryError, RetryPolicy, retry_with_backoff};

/// Failure of a single refresh attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
enum AttemptError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed token response: {0}")]
    Malformed(String),
}

/// How a token endpoint status is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusClass {
    Success,
    Rejected,
    Transient,
}

const fn classify_status(status: StatusCode) -> StatusClass {
    match status.as_u16() {
        200..=299 => StatusClass::Success,
        400..=499 => StatusClass::Rejected,
        _ => StatusClass::Transient,
    }
}

/// Refresh-token grant over HTTP.
///
/// Retry waits observe `shutdown`, so a stop request during backoff ends the
/// refresh with [`RefreshError::Cancelled`].
pub struct HttpTokenRefresher {
    client: Client,
    config: OAuthClientConfig,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
}

impl HttpTokenRefresher {
    /// Create a refresher using the system clock.
    pub fn new(config: OAuthClientConfig, shutdown: CancellationToken) -> Result<Self, RefreshError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RefreshError::Client(e.to_string()))?;

        Ok(Self {
            client,
            config,
            clock: Arc::new(SystemClock),
            shutdown,
        })
    }

    /// Use `clock` to stamp the expiry of new grants.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    async fn attempt(
        &self,
        refresh_token: &str,
        attempt: u32,
    ) -> AttemptOutcome<TokenResponse, AttemptError> {
        metrics::record_refresh_attempt();
        tracing::debug!(
            attempt = attempt + 1,
            endpoint = %self.config.token_endpoint,
            "Requesting token refresh"
        );

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = match self
            .client
            .post(&self.config.token_endpoint)
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return AttemptOutcome::Retryable(AttemptError::Network(e.to_string())),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return AttemptOutcome::Retryable(AttemptError::Network(e.to_string())),
        };

        match classify_status(status) {
            StatusClass::Success => match serde_json::from_str::<TokenResponse>(&body) {
                Ok(parsed) => AttemptOutcome::Success(parsed),
                Err(e) => AttemptOutcome::Retryable(AttemptError::Malformed(e.to_string())),
            },
            StatusClass::Rejected => AttemptOutcome::Fatal(AttemptError::Status {
                status: status.as_u16(),
                body,
            }),
            StatusClass::Transient => AttemptOutcome::Retryable(AttemptError::Status {
                status: status.as_u16(),
                body,
            }),
        }
    }
}

#[async_trait]
impl TokenRefresherPort for HttpTokenRefresher {
    async fn refresh(
        &self,
        refresh_token: &str,
        policy: &RetryPolicy,
    ) -> Result<TokenGrant, RefreshError> {
        let result = retry_with_backoff(policy, &self.shutdown, |attempt| {
            self.attempt(refresh_token, attempt)
        })
        .await;

        match result {
            Ok(response) => {
                metrics::record_refresh(RefreshLabel::Success);
                Ok(response.issued_at(self.clock.now_epoch_secs()))
            }
            Err(RetryError::Fatal { error, attempts }) => {
                metrics::record_refresh(RefreshLabel::Rejected);
                tracing::error!(error = %error, attempts, "Token endpoint rejected refresh");
                match error {
                    AttemptError::Status { status, body } => {
                        Err(RefreshError::Rejected { status, body })
                    }
                    other => Err(RefreshError::Client(other.to_string())),
                }
            }
            Err(RetryError::Exhausted { attempts, last }) => {
                metrics::record_refresh(RefreshLabel::Exhausted);
                Err(RefreshError::Exhausted {
                    attempts,
                    last: last.to_string(),
                })
            }
            Err(RetryError::Cancelled { attempts }) => {
                metrics::record_refresh(RefreshLabel::Cancelled);
                tracing::info!(attempts, "Token refresh cancelled by shutdown");
                Err(RefreshError::Cancelled)
            }
        }
    }
}
