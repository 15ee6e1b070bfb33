//! OAuth Refresh-Token Grant
//!
//! Exchanges the stored refresh token for a new access token at the
//! provider's token endpoint, with bounded retries on transient failures.

mod config;
mod refresher;

pub use config::{DEFAULT_TOKEN_ENDPOINT, OAuthClientConfig};
pub use refresher::HttpTokenRefresher;
