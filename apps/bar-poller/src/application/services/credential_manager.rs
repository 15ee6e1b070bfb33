//! Credential Manager
//!
//! Single source of truth for "is my credential usable right now".
//!
//! 1. Load the stored record; a missing record means the OAuth bootstrap
//!    flow has never run, which this process cannot fix.
//! 2. Backfill `exp` for records written without one.
//! 3. If still fresh, return it untouched: no network call, no write.
//! 4. Otherwise refresh, carry the refresh token forward if the reply
//!    omitted it, persist, and return the new record.

use std::sync::Arc;

use crate::application::ports::{
    Clock, RefreshError, TokenRefresherPort, TokenStoreError, TokenStorePort,
};
use crate::domain::credential::Credential;
use crate::infrastructure::metrics;
use crate::resilience::RetryPolicy;

/// Credential lifecycle error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// No credential has ever been stored.
    #[error(
        "no stored credential at {location}; run the OAuth authorization flow to create one"
    )]
    MissingBootstrap {
        /// Where the credential was expected.
        location: String,
    },

    /// The store failed to read or write.
    #[error(transparent)]
    Store(#[from] TokenStoreError),

    /// The refresh grant failed.
    #[error(transparent)]
    Refresh(#[from] RefreshError),
}

impl CredentialError {
    /// Whether operator action is required before this can succeed.
    #[must_use]
    pub const fn is_missing_bootstrap(&self) -> bool {
        matches!(self, Self::MissingBootstrap { .. })
    }
}

/// Keeps the persisted credential valid.
pub struct CredentialManager<S, R, C>
where
    S: TokenStorePort,
    R: TokenRefresherPort,
    C: Clock,
{
    store: Arc<S>,
    refresher: Arc<R>,
    clock: Arc<C>,
    policy: RetryPolicy,
}

impl<S, R, C> CredentialManager<S, R, C>
where
    S: TokenStorePort,
    R: TokenRefresherPort,
    C: Clock,
{
    /// Create a manager using the default refresh policy.
    pub fn new(store: Arc<S>, refresher: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            store,
            refresher,
            clock,
            policy: RetryPolicy::token_refresh(),
        }
    }

    /// Override the refresh retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Return a credential that is valid now, refreshing it if needed.
    pub async fn get_valid_credential(&self) -> Result<Credential, CredentialError> {
        let Some(mut credential) = self.store.load()? else {
            return Err(CredentialError::MissingBootstrap {
                location: self.store.location(),
            });
        };

        let now = self.clock.now_epoch_secs();
        if credential.backfill_expiry(now) {
            tracing::debug!(
                expires_in = credential.expires_in,
                "Stored credential has no absolute expiry, derived it from expires_in"
            );
        }

        if credential.is_fresh(now) {
            tracing::debug!(
                remaining_secs = credential.seconds_until_expiry(now),
                "Access token still valid"
            );
            return Ok(credential);
        }

        tracing::info!(
            expired_secs_ago = credential.seconds_until_expiry(now).map(i64::saturating_neg),
            max_attempts = self.policy.max_attempts(),
            max_backoff_secs = self.policy.worst_case_delay().as_secs(),
            "Access token expired, refreshing"
        );

        let grant = self
            .refresher
            .refresh(&credential.refresh_token, &self.policy)
            .await?;

        let rotated = grant.rotates_refresh_token();
        let refreshed = grant.carry_forward(&credential);
        self.store.save(&refreshed)?;
        metrics::record_token_save();

        tracing::info!(
            expires_in = refreshed.expires_in,
            refresh_token_rotated = rotated,
            "Token refreshed and saved"
        );

        Ok(refreshed)
    }
}
