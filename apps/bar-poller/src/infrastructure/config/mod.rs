//! Configuration Module
//!
//! Configuration loading for the poller.

mod settings;

pub use settings::{ConfigError, GatewaySettings, OAuthSettings, PollerConfig};
