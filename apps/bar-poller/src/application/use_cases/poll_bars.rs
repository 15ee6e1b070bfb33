//! Poll Bars Use Case
//!
//! Each iteration makes sure the credential is valid, opens a gateway
//! session, fetches recent bars for the configured instrument and reports
//! the newest one. Failures end the iteration, never the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    Clock, GatewayConnectorPort, GatewayError, GatewaySessionPort, TokenRefresherPort,
    TokenStorePort,
};
use crate::application::services::{CredentialError, CredentialManager};
use crate::domain::market_data::{Bar, HistoricalBarsRequest, InstrumentSpec};
use crate::infrastructure::metrics::{self, IterationLabel};

/// Poll loop settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    /// Gateway host.
    pub gateway_host: String,
    /// Gateway port.
    pub gateway_port: u16,
    /// Client identifier presented to the gateway.
    pub gateway_client_id: u32,
    /// Bound on establishing a session.
    pub connect_timeout: Duration,
    /// Instrument to poll.
    pub instrument: InstrumentSpec,
    /// History request sent each iteration.
    pub request: HistoricalBarsRequest,
    /// Wait between iterations.
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            gateway_host: "127.0.0.1".to_string(),
            gateway_port: 5000,
            gateway_client_id: 1,
            connect_timeout: Duration::from_secs(10),
            instrument: InstrumentSpec::stock("QQQ", "SMART", "USD"),
            request: HistoricalBarsRequest::intraday(),
            interval: Duration::from_secs(300),
        }
    }
}

/// Successful iteration result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    /// The newest bar returned by the gateway.
    BarReported(Bar),
    /// The gateway returned no bars.
    NoData,
}

/// Iteration failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IterationError {
    /// No valid credential could be produced.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The gateway session failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl IterationError {
    /// Whether the credential file has never been bootstrapped.
    #[must_use]
    pub const fn is_missing_bootstrap(&self) -> bool {
        matches!(self, Self::Credential(e) if e.is_missing_bootstrap())
    }
}

/// Periodically reports the latest bar for one instrument.
pub struct PollBarsUseCase<S, R, C, G>
where
    S: TokenStorePort,
    R: TokenRefresherPort,
    C: Clock,
    G: GatewayConnectorPort,
{
    credentials: CredentialManager<S, R, C>,
    connector: Arc<G>,
    settings: PollSettings,
}

impl<S, R, C, G> PollBarsUseCase<S, R, C, G>
where
    S: TokenStorePort,
    R: TokenRefresherPort,
    C: Clock,
    G: GatewayConnectorPort,
{
    /// Create a new PollBarsUseCase.
    pub const fn new(
        credentials: CredentialManager<S, R, C>,
        connector: Arc<G>,
        settings: PollSettings,
    ) -> Self {
        Self {
            credentials,
            connector,
            settings,
        }
    }

    /// Run iterations until `shutdown` is cancelled.
    ///
    /// Returns the number of iterations that ran.
    pub async fn run(&self, shutdown: &CancellationToken) -> u64 {
        let symbol = &self.settings.instrument.symbol;
        tracing::info!(
            symbol = %symbol,
            interval_secs = self.settings.interval.as_secs(),
            gateway = %format!("{}:{}", self.settings.gateway_host, self.settings.gateway_port),
            "Poll loop started"
        );

        let mut iterations = 0u64;
        while !shutdown.is_cancelled() {
            iterations += 1;
            self.report(self.run_iteration().await);

            if !self.wait_or_shutdown(shutdown).await {
                break;
            }
        }

        tracing::info!(iterations, "Poll loop stopped");
        iterations
    }

    /// Run a single iteration.
    pub async fn run_iteration(&self) -> Result<IterationOutcome, IterationError> {
        let credential = self.credentials.get_valid_credential().await?;
        tracing::debug!(
            expires_at = credential.exp,
            "Credential valid, connecting to gateway"
        );

        let mut session = self
            .connector
            .connect(
                &self.settings.gateway_host,
                self.settings.gateway_port,
                self.settings.gateway_client_id,
                self.settings.connect_timeout,
            )
            .await?;

        let result = self.fetch_latest(&session).await;

        if let Err(e) = session.disconnect().await {
            tracing::debug!(error = %e, "Gateway disconnect failed");
        }

        result
    }

    async fn fetch_latest(
        &self,
        session: &G::Session,
    ) -> Result<IterationOutcome, IterationError> {
        let instrument = &self.settings.instrument;
        let contract =
            session
                .qualify(instrument)
                .await?
                .ok_or_else(|| GatewayError::ContractNotFound {
                    symbol: instrument.symbol.clone(),
                })?;

        let bars = session
            .fetch_historical_bars(&contract, &self.settings.request)
            .await?;

        tracing::debug!(
            contract_id = contract.contract_id,
            bars = bars.len(),
            "Historical bars received"
        );

        Ok(bars
            .into_iter()
            .last()
            .map_or(IterationOutcome::NoData, IterationOutcome::BarReported))
    }

    fn report(&self, result: Result<IterationOutcome, IterationError>) {
        let symbol = &self.settings.instrument.symbol;
        match result {
            Ok(IterationOutcome::BarReported(bar)) => {
                metrics::record_iteration(IterationLabel::Bar);
                tracing::info!(
                    "{}",
                    bar.summary(symbol, self.settings.request.date_format)
                );
            }
            Ok(IterationOutcome::NoData) => {
                metrics::record_iteration(IterationLabel::NoData);
                tracing::warn!(symbol = %symbol, "No historical data returned");
            }
            Err(e) if e.is_missing_bootstrap() => {
                metrics::record_iteration(IterationLabel::Error);
                tracing::error!(error = %e, "Credential missing, waiting for bootstrap");
            }
            Err(e) => {
                metrics::record_iteration(IterationLabel::Error);
                tracing::error!(error = %e, "Iteration failed");
            }
        }
    }

    /// Sleep for the poll interval. Returns `false` if shutdown was requested.
    async fn wait_or_shutdown(&self, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => false,
            () = tokio::time::sleep(self.settings.interval) => true,
        }
    }
}
