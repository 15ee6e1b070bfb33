//! Credential Domain
//!
//! The persisted OAuth credential record and the rules around it:
//!
//! - A credential is usable only while `now < exp - SAFETY_MARGIN_SECS`.
//! - Records written by older versions may lack `exp`; it is backfilled from
//!   `expires_in` as of the time of loading.
//! - A refresh reply that omits `refresh_token` keeps the previous one.
//!
//! Fields returned by the token endpoint that are not modelled explicitly
//! (`token_type`, `refresh_token_expires_in`, ...) are preserved verbatim so
//! the file round-trips without loss.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lead time, in seconds, before actual expiry at which a credential is
/// already treated as expired.
pub const SAFETY_MARGIN_SECS: i64 = 30;

/// Keys that are modelled explicitly and must never leak into `extra`.
const RESERVED_KEYS: [&str; 4] = ["access_token", "refresh_token", "expires_in", "exp"];

// =============================================================================
// Credential
// =============================================================================

/// Persisted credential record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Short-lived access token.
    pub access_token: String,
    /// Longer-lived token used to mint new access tokens.
    pub refresh_token: String,
    /// Lifetime in seconds as reported at issuance.
    #[serde(default)]
    pub expires_in: i64,
    /// Absolute expiry as epoch seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Additional fields from the token endpoint, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Credential {
    /// Create a credential with an explicit absolute expiry.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: i64,
        exp: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_in,
            exp: Some(exp),
            extra: Map::new(),
        }
    }

    /// Fill in `exp` from `expires_in` if the record does not carry one.
    ///
    /// Returns `true` if the record was modified.
    pub fn backfill_expiry(&mut self, now: i64) -> bool {
        if self.exp.is_some() {
            return false;
        }
        self.exp = Some(now.saturating_add(self.expires_in));
        true
    }

    /// Whether the credential can be used at `now`, honoring the safety margin.
    ///
    /// A record without `exp` is never fresh; call [`Self::backfill_expiry`] first.
    #[must_use]
    pub fn is_fresh(&self, now: i64) -> bool {
        self.exp
            .is_some_and(|exp| now < exp.saturating_sub(SAFETY_MARGIN_SECS))
    }

    /// Seconds until actual expiry (negative once expired).
    #[must_use]
    pub fn seconds_until_expiry(&self, now: i64) -> Option<i64> {
        self.exp.map(|exp| exp.saturating_sub(now))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("exp", &self.exp)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// Token Endpoint Reply
// =============================================================================

/// Body returned by the token endpoint for a refresh grant.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    /// Newly minted access token.
    pub access_token: String,
    /// Rotated refresh token, if the endpoint issued one.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the new access token in seconds (0 when absent).
    #[serde(default)]
    pub expires_in: i64,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenResponse {
    /// Stamp the reply with its absolute expiry, computed from `now`.
    #[must_use]
    pub fn issued_at(self, now: i64) -> TokenGrant {
        let exp = now.saturating_add(self.expires_in);
        TokenGrant {
            response: self,
            exp,
        }
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// A token reply with its absolute expiry attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    /// Parsed endpoint reply.
    pub response: TokenResponse,
    /// Absolute expiry as epoch seconds.
    pub exp: i64,
}

impl TokenGrant {
    /// Whether the endpoint rotated the refresh token.
    #[must_use]
    pub fn rotates_refresh_token(&self) -> bool {
        self.response
            .refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }

    /// Build the credential to persist, carrying the prior refresh token
    /// forward when the reply did not include a usable one.
    #[must_use]
    pub fn carry_forward(self, prior: &Credential) -> Credential {
        let rotated = self.rotates_refresh_token();
        let TokenResponse {
            access_token,
            refresh_token,
            expires_in,
            mut extra,
        } = self.response;

        for key in RESERVED_KEYS {
            extra.remove(key);
        }

        let refresh_token = match refresh_token {
            Some(token) if rotated => token,
            _ => prior.refresh_token.clone(),
        };

        Credential {
            access_token,
            refresh_token,
            expires_in,
            exp: Some(self.exp),
            extra,
        }
    }
}
