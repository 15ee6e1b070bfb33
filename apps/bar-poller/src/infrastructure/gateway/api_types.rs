//! Client Portal REST wire types.

use rust_decimal::Decimal;
use serde::Deserialize;

/// `POST /iserver/auth/status` reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct AuthStatus {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub competing: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Contract id, sent as a number or a numeric string depending on endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum ConidValue {
    Number(i64),
    Text(String),
}

impl ConidValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// One entry of a `secdef/search` reply.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct SecdefEntry {
    pub conid: ConidValue,
    #[serde(default)]
    pub symbol: Option<String>,
    /// Listing exchange for stocks (e.g., "NASDAQ").
    #[serde(default)]
    pub description: Option<String>,
}

/// `secdef/search` replies with a list, or an object carrying `error`
/// when nothing matches.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum SecdefSearchReply {
    Entries(Vec<SecdefEntry>),
    Error { error: String },
}

/// `marketdata/history` reply.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct HistoryReply {
    #[serde(default)]
    pub data: Vec<HistoryBar>,
}

/// One bar of a history reply. `t` is epoch milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct HistoryBar {
    pub t: i64,
    pub o: Decimal,
    pub h: Decimal,
    pub l: Decimal,
    pub c: Decimal,
    #[serde(default)]
    pub v: Option<Decimal>,
}
