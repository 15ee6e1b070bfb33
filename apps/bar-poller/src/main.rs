//! Bar Poller Binary
//!
//! Keeps the OAuth credential fresh and reports the latest historical bar
//! every poll interval until interrupted.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin bar-poller
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `OAUTH_CLIENT_ID`: OAuth client identifier
//! - `OAUTH_CLIENT_SECRET`: OAuth client secret
//!
//! ## Optional
//! - `OAUTH_TOKEN_ENDPOINT`: Token endpoint (default: <https://sim.logonvalidation.net/token>)
//! - `TOKEN_FILE`: Credential file (default: ~/.ibkr_token.json)
//! - `GATEWAY_HOST` / `GATEWAY_PORT`: Gateway address (default: 127.0.0.1:5000)
//! - `GATEWAY_CLIENT_ID`: Session client id (default: 1)
//! - `GATEWAY_CONNECT_TIMEOUT_SECS`: Connect timeout (default: 10)
//! - `GATEWAY_ACCEPT_INVALID_CERTS`: Accept self-signed gateway cert (default: true)
//! - `POLL_SYMBOL` / `POLL_EXCHANGE` / `POLL_CURRENCY`: Instrument (default: QQQ / SMART / USD)
//! - `POLL_INTERVAL_SECS`: Seconds between iterations (default: 300)
//! - `METRICS_PORT`: Prometheus port, 0 disables (default: 0)
//! - `OTEL_ENABLED`: Export spans over OTLP (default: false)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use anyhow::Context;
use bar_poller::infrastructure::telemetry;
use bar_poller::{
    ClientPortalConnector, CredentialManager, FileTokenStore, HttpTokenRefresher,
    PollBarsUseCase, PollerConfig, SystemClock, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let telemetry_guard = telemetry::init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        otlp_export = telemetry_guard.is_exporting(),
        "Starting bar poller"
    );

    let config = PollerConfig::from_env().context("invalid configuration")?;
    log_config(&config);

    if let Some(addr) = init_metrics(config.metrics_port).context("failed to start metrics exporter")? {
        tracing::info!(%addr, "Prometheus metrics exporter listening");
    }

    let shutdown_token = CancellationToken::new();

    let clock = Arc::new(SystemClock);
    let store = Arc::new(FileTokenStore::new(config.token_file.clone()));
    let refresher = Arc::new(
        HttpTokenRefresher::new(config.oauth.client_config(), shutdown_token.clone())
            .context("failed to build token refresher")?
            .with_clock(clock.clone()),
    );
    let credentials = CredentialManager::new(store, refresher, clock);
    let connector = Arc::new(ClientPortalConnector::new(
        config.gateway.accept_invalid_certs,
    ));
    let poller = PollBarsUseCase::new(credentials, connector, config.poll_settings());

    tokio::spawn(await_shutdown(shutdown_token.clone()));

    let iterations = poller.run(&shutdown_token).await;

    tracing::info!(iterations, "Bar poller stopped");
    Ok(())
}

fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

/// Log the parsed configuration.
fn log_config(config: &PollerConfig) {
    tracing::info!(
        symbol = %config.instrument.symbol,
        exchange = %config.instrument.exchange,
        interval_secs = config.poll_interval.as_secs(),
        gateway_host = %config.gateway.host,
        gateway_port = config.gateway.port,
        metrics_port = config.metrics_port,
        "Configuration loaded"
    );
    tracing::debug!(
        token_file = %config.token_file.display(),
        token_endpoint = %config.oauth.token_endpoint,
        "Credential settings"
    );
}

/// Load .env file from any ancestor directory.
fn load_dotenv_from_ancestors() {
    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
