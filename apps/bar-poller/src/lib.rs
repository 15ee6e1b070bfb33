#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Bar Poller - Credential-Maintaining Market Data Poller
//!
//! Keeps an OAuth access credential valid on local storage and, on a fixed
//! cadence, fetches recent historical bars for one instrument from the local
//! trading gateway and reports the latest one.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Pure types and rules
//!   - `credential`: Persisted credential record, validity and carry-forward
//!   - `market_data`: Instruments, contracts, bars and history requests
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Token store, token refresher, gateway session, clock
//!   - `services`: `CredentialManager`
//!   - `use_cases`: `PollBarsUseCase`
//!
//! - **Resilience**: Bounded retry with exponential backoff
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `token_store`: Atomic JSON credential file
//!   - `oauth`: Refresh-token grant over HTTP
//!   - `gateway`: Client Portal gateway REST session
//!   - `config`: Environment-driven settings
//!   - `telemetry` / `metrics`: Tracing and Prometheus
//!
//! # Data Flow
//!
//! ```text
//!  ~/.ibkr_token.json ──► CredentialManager ──► token endpoint (on expiry)
//!                               │
//!                               ▼
//!                        PollBarsUseCase ──► gateway ──► latest bar ──► console
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core types with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Retry policy and driver.
pub mod resilience;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::credential::{Credential, SAFETY_MARGIN_SECS, TokenGrant, TokenResponse};
pub use domain::market_data::{
    Bar, BarSize, Contract, DataType, DateFormat, HistoricalBarsRequest, HistoryDuration,
    InstrumentSpec, SecurityType,
};

// Application
pub use application::ports::{
    Clock, GatewayConnectorPort, GatewayError, GatewaySessionPort, RefreshError, SystemClock,
    TokenRefresherPort, TokenStoreError, TokenStorePort,
};
pub use application::services::{CredentialError, CredentialManager};
pub use application::use_cases::{IterationError, IterationOutcome, PollBarsUseCase, PollSettings};

// Resilience
pub use resilience::{AttemptOutcome, RetryError, RetryPolicy, retry_with_backoff};

// Infrastructure
pub use infrastructure::config::{ConfigError, GatewaySettings, OAuthSettings, PollerConfig};
pub use infrastructure::gateway::{ClientPortalConnector, ClientPortalSession};
pub use infrastructure::metrics::init_metrics;
pub use infrastructure::oauth::{HttpTokenRefresher, OAuthClientConfig};
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
pub use infrastructure::token_store::FileTokenStore;
