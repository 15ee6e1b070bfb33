//! Gateway Port (Driven Port)
//!
//! Session with the local trading gateway process: connect, resolve an
//! instrument to a contract, fetch historical bars, disconnect.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::market_data::{Bar, Contract, HistoricalBarsRequest, InstrumentSpec};

/// Gateway error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Could not establish a usable session.
    #[error("gateway connection failed: {message}")]
    Connect {
        /// Error details.
        message: String,
    },

    /// The session was used after it was disconnected.
    #[error("gateway session is not connected")]
    NotConnected,

    /// The gateway did not answer in time.
    #[error("gateway request timed out")]
    Timeout,

    /// The gateway answered with a non-success status.
    #[error("gateway HTTP error {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The instrument did not resolve to any contract.
    #[error("no contract found for {symbol}")]
    ContractNotFound {
        /// Requested symbol.
        symbol: String,
    },

    /// The gateway answered with something we could not decode.
    #[error("failed to decode gateway response: {0}")]
    Decode(String),

    /// The request asks for something this gateway cannot serve.
    #[error("unsupported request: {0}")]
    Unsupported(String),
}

/// Opens sessions with the gateway.
#[async_trait]
pub trait GatewayConnectorPort: Send + Sync {
    /// Session type produced by this connector.
    type Session: GatewaySessionPort;

    /// Connect to the gateway at `host:port`, identifying as `client_id`.
    async fn connect(
        &self,
        host: &str,
        port: u16,
        client_id: u32,
        timeout: Duration,
    ) -> Result<Self::Session, GatewayError>;
}

/// An open gateway session.
#[async_trait]
pub trait GatewaySessionPort: Send + Sync {
    /// Resolve an instrument into a concrete contract, if one exists.
    async fn qualify(&self, spec: &InstrumentSpec) -> Result<Option<Contract>, GatewayError>;

    /// Fetch historical bars, oldest first.
    async fn fetch_historical_bars(
        &self,
        contract: &Contract,
        request: &HistoricalBarsRequest,
    ) -> Result<Vec<Bar>, GatewayError>;

    /// Whether the session is still usable.
    fn is_connected(&self) -> bool;

    /// Close the session. Closing an already closed session is a no-op.
    async fn disconnect(&mut self) -> Result<(), GatewayError>;
}
