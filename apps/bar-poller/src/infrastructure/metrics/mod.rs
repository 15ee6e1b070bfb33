//! Prometheus Metrics Module
//!
//! # Metrics Categories
//!
//! - **Iterations**: Poll loop outcomes (bar, no data, error)
//! - **Token refresh**: Attempts against the token endpoint and final results
//! - **Token store**: Successful credential writes
//!
//! Recording functions are no-ops until [`init_metrics`] installs a recorder,
//! so the poller runs unchanged with metrics disabled.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::OnceLock;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

// =============================================================================
// Exporter
// =============================================================================

static INSTALLED: OnceLock<SocketAddr> = OnceLock::new();

/// Install the Prometheus recorder and serve `/metrics` on `port`.
///
/// A port of 0 leaves metrics disabled and returns `Ok(None)`. Calling this
/// again after a successful install returns the address already bound.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(port: u16) -> Result<Option<SocketAddr>, BuildError> {
    if port == 0 {
        return Ok(None);
    }
    if let Some(addr) = INSTALLED.get() {
        return Ok(Some(*addr));
    }

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    register_metrics();

    Ok(Some(*INSTALLED.get_or_init(|| addr)))
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "bar_poller_iterations_total",
        "Poll loop iterations by outcome"
    );
    describe_counter!(
        "bar_poller_token_refresh_attempts_total",
        "HTTP attempts made against the token endpoint"
    );
    describe_counter!(
        "bar_poller_token_refresh_total",
        "Completed token refresh operations by result"
    );
    describe_counter!(
        "bar_poller_token_saves_total",
        "Credentials written to the token store"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Outcome label for a poll iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationLabel {
    /// A bar was reported.
    Bar,
    /// The gateway returned no bars.
    NoData,
    /// The iteration failed.
    Error,
}

impl IterationLabel {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::NoData => "no_data",
            Self::Error => "error",
        }
    }
}

/// Result label for a token refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshLabel {
    /// New credential obtained.
    Success,
    /// The endpoint rejected the refresh token.
    Rejected,
    /// Retries ran out.
    Exhausted,
    /// Shutdown interrupted the refresh.
    Cancelled,
}

impl RefreshLabel {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Rejected => "rejected",
            Self::Exhausted => "exhausted",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Record a finished poll iteration.
pub fn record_iteration(outcome: IterationLabel) {
    counter!("bar_poller_iterations_total", "outcome" => outcome.as_str()).increment(1);
}

/// Record one HTTP attempt against the token endpoint.
pub fn record_refresh_attempt() {
    counter!("bar_poller_token_refresh_attempts_total").increment(1);
}

/// Record the final result of a token refresh.
pub fn record_refresh(result: RefreshLabel) {
    counter!("bar_poller_token_refresh_total", "result" => result.as_str()).increment(1);
}

/// Record a credential written to disk.
pub fn record_token_save() {
    counter!("bar_poller_token_saves_total").increment(1);
}

// =============================================================================
// Tests
// =============================================================================
