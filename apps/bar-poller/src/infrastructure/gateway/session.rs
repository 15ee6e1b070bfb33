//! Gateway connector and session.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::api_types::{AuthStatus, HistoryBar, HistoryReply, SecdefEntry, SecdefSearchReply};
use crate::application::ports::{GatewayConnectorPort, GatewayError, GatewaySessionPort};
use crate::domain::market_data::{
    Bar, Contract, DataType, HistoricalBarsRequest, InstrumentSpec,
};

/// Opens sessions against a local Client Portal gateway.
#[derive(Debug, Clone)]
pub struct ClientPortalConnector {
    scheme: String,
    accept_invalid_certs: bool,
}

impl ClientPortalConnector {
    /// Connector for the HTTPS gateway. `accept_invalid_certs` allows the
    /// gateway's self-signed certificate.
    #[must_use]
    pub fn new(accept_invalid_certs: bool) -> Self {
        Self {
            scheme: "https".to_string(),
            accept_invalid_certs,
        }
    }

    /// Override the URL scheme (plain `http` for a TLS-terminating proxy).
    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    fn base_url(&self, host: &str, port: u16) -> String {
        format!("{}://{host}:{port}/v1/api", self.scheme)
    }
}

#[async_trait]
impl GatewayConnectorPort for ClientPortalConnector {
    type Session = ClientPortalSession;

    async fn connect(
        &self,
        host: &str,
        port: u16,
        client_id: u32,
        timeout: Duration,
    ) -> Result<ClientPortalSession, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|e| GatewayError::Connect {
                message: e.to_string(),
            })?;

        let session = ClientPortalSession {
            client: Some(client),
            base_url: self.base_url(host, port),
            client_id,
        };

        let status: AuthStatus =
            tokio::time::timeout(timeout, session.post_json("/iserver/auth/status"))
                .await
                .map_err(|_| GatewayError::Timeout)?
                .map_err(|e| match e {
                    GatewayError::Timeout => GatewayError::Timeout,
                    other => GatewayError::Connect {
                        message: other.to_string(),
                    },
                })?;

        if !(status.connected && status.authenticated) {
            return Err(GatewayError::Connect {
                message: format!(
                    "gateway session not ready (connected={}, authenticated={}, competing={}){}",
                    status.connected,
                    status.authenticated,
                    status.competing,
                    status
                        .message
                        .filter(|m| !m.is_empty())
                        .map(|m| format!(": {m}"))
                        .unwrap_or_default()
                ),
            });
        }

        tracing::debug!(
            gateway = %session.base_url,
            client_id,
            "Gateway session established"
        );
        Ok(session)
    }
}

/// An authenticated session with the Client Portal gateway.
#[derive(Debug)]
pub struct ClientPortalSession {
    client: Option<Client>,
    base_url: String,
    client_id: u32,
}

impl ClientPortalSession {
    fn client(&self) -> Result<&Client, GatewayError> {
        self.client.as_ref().ok_or(GatewayError::NotConnected)
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let request = self.client()?.post(format!("{}{path}", self.base_url));
        Self::send(request).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let request = self
            .client()?
            .get(format!("{}{path}", self.base_url))
            .query(query);
        Self::send(request).await
    }

    async fn send<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, GatewayError> {
        let response = request.send().await.map_err(map_request_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_request_error)?;

        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

fn map_request_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Connect {
            message: e.to_string(),
        }
    }
}

/// Pick the entry listed on `exchange`, else the first one.
fn select_entry<'a>(entries: &'a [SecdefEntry], exchange: &str) -> Option<&'a SecdefEntry> {
    entries
        .iter()
        .find(|entry| {
            entry
                .description
                .as_deref()
                .is_some_and(|d| d.eq_ignore_ascii_case(exchange))
        })
        .or_else(|| entries.first())
}

fn to_bar(raw: HistoryBar) -> Result<Bar, GatewayError> {
    let timestamp = DateTime::from_timestamp_millis(raw.t)
        .ok_or_else(|| GatewayError::Decode(format!("bar timestamp out of range: {}", raw.t)))?;

    Ok(Bar {
        timestamp,
        open: raw.o,
        high: raw.h,
        low: raw.l,
        close: raw.c,
        volume: raw.v,
    })
}

#[async_trait]
impl GatewaySessionPort for ClientPortalSession {
    async fn qualify(&self, spec: &InstrumentSpec) -> Result<Option<Contract>, GatewayError> {
        let query = [
            ("symbol", spec.symbol.clone()),
            ("secType", spec.security_type.as_str().to_string()),
        ];
        let reply: SecdefSearchReply = self.get_json("/iserver/secdef/search", &query).await?;

        let entries = match reply {
            SecdefSearchReply::Entries(entries) => entries,
            SecdefSearchReply::Error { error } => {
                tracing::debug!(symbol = %spec.symbol, error = %error, "Contract search found nothing");
                return Ok(None);
            }
        };

        let Some(entry) = select_entry(&entries, &spec.exchange) else {
            return Ok(None);
        };

        let contract_id = entry.conid.as_i64().ok_or_else(|| {
            GatewayError::Decode(format!("invalid conid for {}", spec.symbol))
        })?;

        Ok(Some(Contract {
            contract_id,
            symbol: entry.symbol.clone().unwrap_or_else(|| spec.symbol.clone()),
            exchange: entry.description.clone(),
            currency: spec.currency.clone(),
        }))
    }

    async fn fetch_historical_bars(
        &self,
        contract: &Contract,
        request: &HistoricalBarsRequest,
    ) -> Result<Vec<Bar>, GatewayError> {
        if request.data_type != DataType::Trades {
            return Err(GatewayError::Unsupported(format!(
                "{} bars are not served by the Client Portal history endpoint",
                request.data_type.as_str()
            )));
        }

        let query = [
            ("conid", contract.contract_id.to_string()),
            ("period", request.duration.gateway_code()),
            ("bar", request.bar_size.gateway_code().to_string()),
            (
                "outsideRth",
                (!request.use_regular_trading_hours).to_string(),
            ),
        ];
        let reply: HistoryReply = self.get_json("/iserver/marketdata/history", &query).await?;

        reply.data.into_iter().map(to_bar).collect()
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    async fn disconnect(&mut self) -> Result<(), GatewayError> {
        if self.client.take().is_some() {
            tracing::debug!(client_id = self.client_id, "Gateway session closed");
        }
        Ok(())
    }
}
