//! Market Data Domain
//!
//! Types exchanged with the trading gateway: the instrument we ask about,
//! the concrete contract the gateway resolves it to, and the historical bars
//! it returns.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Instruments
// =============================================================================

/// Security type of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SecurityType {
    /// Common stock or ETF.
    #[default]
    Stock,
}

impl SecurityType {
    /// Gateway code for the security type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stock => "STK",
        }
    }
}

/// Loosely specified instrument, resolved by the gateway into a [`Contract`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    /// Ticker symbol (e.g., "QQQ").
    pub symbol: String,
    /// Security type.
    pub security_type: SecurityType,
    /// Routing exchange or listing exchange (e.g., "SMART", "NASDAQ").
    pub exchange: String,
    /// Trading currency.
    pub currency: String,
}

impl InstrumentSpec {
    /// Create a stock instrument specification.
    #[must_use]
    pub fn stock(
        symbol: impl Into<String>,
        exchange: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            security_type: SecurityType::Stock,
            exchange: exchange.into(),
            currency: currency.into(),
        }
    }
}

/// Concrete contract as identified by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    /// Gateway contract identifier.
    pub contract_id: i64,
    /// Ticker symbol.
    pub symbol: String,
    /// Listing exchange reported by the gateway, if any.
    pub exchange: Option<String>,
    /// Trading currency.
    pub currency: String,
}

// =============================================================================
// Historical Data Request
// =============================================================================

/// Bar width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarSize {
    /// One minute.
    OneMinute,
    /// Five minutes.
    #[default]
    FiveMinutes,
    /// Fifteen minutes.
    FifteenMinutes,
    /// One hour.
    OneHour,
    /// One day.
    OneDay,
}

impl BarSize {
    /// Human-readable label ("5 mins").
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::OneMinute => "1 min",
            Self::FiveMinutes => "5 mins",
            Self::FifteenMinutes => "15 mins",
            Self::OneHour => "1 hour",
            Self::OneDay => "1 day",
        }
    }

    /// Code used by the gateway history endpoint ("5min").
    #[must_use]
    pub const fn gateway_code(&self) -> &'static str {
        match self {
            Self::OneMinute => "1min",
            Self::FiveMinutes => "5min",
            Self::FifteenMinutes => "15min",
            Self::OneHour => "1h",
            Self::OneDay => "1d",
        }
    }
}

/// Unit of a history lookback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    /// Days.
    Day,
    /// Weeks.
    Week,
    /// Months.
    Month,
    /// Years.
    Year,
}

/// How far back the history request reaches ("1 D").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryDuration {
    /// Number of units.
    pub value: u32,
    /// Unit.
    pub unit: DurationUnit,
}

impl HistoryDuration {
    /// A lookback of `value` days.
    #[must_use]
    pub const fn days(value: u32) -> Self {
        Self {
            value,
            unit: DurationUnit::Day,
        }
    }

    /// Code used by the gateway history endpoint ("1d").
    #[must_use]
    pub fn gateway_code(&self) -> String {
        let unit = match self.unit {
            DurationUnit::Day => "d",
            DurationUnit::Week => "w",
            DurationUnit::Month => "m",
            DurationUnit::Year => "y",
        };
        format!("{}{unit}", self.value)
    }
}

impl Default for HistoryDuration {
    fn default() -> Self {
        Self::days(1)
    }
}

impl fmt::Display for HistoryDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            DurationUnit::Day => "D",
            DurationUnit::Week => "W",
            DurationUnit::Month => "M",
            DurationUnit::Year => "Y",
        };
        write!(f, "{} {unit}", self.value)
    }
}

/// Which price series the bars are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    /// Trade prices.
    #[default]
    Trades,
    /// Bid/ask midpoint.
    Midpoint,
    /// Bid prices.
    Bid,
    /// Ask prices.
    Ask,
}

impl DataType {
    /// Name of the data type ("TRADES").
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trades => "TRADES",
            Self::Midpoint => "MIDPOINT",
            Self::Bid => "BID",
            Self::Ask => "ASK",
        }
    }
}

/// How bar timestamps are rendered when reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFormat {
    /// `yyyy-mm-dd HH:MM:SS` in UTC (format 1).
    #[default]
    Formatted,
    /// Epoch seconds (format 2).
    EpochSeconds,
}

impl DateFormat {
    /// Render a timestamp.
    #[must_use]
    pub fn render(&self, timestamp: DateTime<Utc>) -> String {
        match self {
            Self::Formatted => timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            Self::EpochSeconds => timestamp.timestamp().to_string(),
        }
    }
}

/// Parameters for one historical bars request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoricalBarsRequest {
    /// Lookback window.
    pub duration: HistoryDuration,
    /// Bar width.
    pub bar_size: BarSize,
    /// Price series.
    pub data_type: DataType,
    /// Restrict to regular trading hours.
    pub use_regular_trading_hours: bool,
    /// Timestamp rendering for reports.
    pub date_format: DateFormat,
}

impl HistoricalBarsRequest {
    /// One day of five-minute trade bars, regular hours only.
    #[must_use]
    pub fn intraday() -> Self {
        Self {
            use_regular_trading_hours: true,
            ..Self::default()
        }
    }
}

// =============================================================================
// Bars
// =============================================================================

/// One OHLC bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time.
    pub timestamp: DateTime<Utc>,
    /// Open price.
    pub open: Decimal,
    /// High price.
    pub high: Decimal,
    /// Low price.
    pub low: Decimal,
    /// Close price.
    pub close: Decimal,
    /// Traded volume, when the gateway reports it.
    pub volume: Option<Decimal>,
}

impl Bar {
    /// One-line human-readable summary of the bar.
    #[must_use]
    pub fn summary(&self, symbol: &str, format: DateFormat) -> String {
        format!(
            "[{}] {symbol} O={} H={} L={} C={}",
            format.render(self.timestamp),
            self.open,
            self.high,
            self.low,
            self.close
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar() -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 15, 30, 0).unwrap(),
            open: Decimal::new(43012, 2),
            high: Decimal::new(43150, 2),
            low: Decimal::new(42990, 2),
            close: Decimal::new(43101, 2),
            volume: None,
        }
    }

    #[test]
    fn default_request_is_one_day_of_five_minute_trades() {
        let request = HistoricalBarsRequest::intraday();
        assert_eq!(request.duration.to_string(), "1 D");
        assert_eq!(request.bar_size.label(), "5 mins");
        assert_eq!(request.data_type.as_str(), "TRADES");
        assert!(request.use_regular_trading_hours);
        assert_eq!(request.date_format, DateFormat::Formatted);
    }

    #[test]
    fn gateway_codes() {
        assert_eq!(HistoryDuration::days(1).gateway_code(), "1d");
        assert_eq!(
            HistoryDuration {
                value: 2,
                unit: DurationUnit::Week
            }
            .gateway_code(),
            "2w"
        );
        assert_eq!(BarSize::FiveMinutes.gateway_code(), "5min");
        assert_eq!(BarSize::OneHour.gateway_code(), "1h");
    }

    #[test]
    fn summary_formatted() {
        let line = bar().summary("QQQ", DateFormat::Formatted);
        assert_eq!(
            line,
            "[2024-03-01 15:30:00 UTC] QQQ O=430.12 H=431.50 L=429.90 C=431.01"
        );
    }

    #[test]
    fn summary_epoch() {
        let line = bar().summary("QQQ", DateFormat::EpochSeconds);
        assert!(line.starts_with("[1709307000] QQQ"));
    }

    #[test]
    fn stock_spec() {
        let spec = InstrumentSpec::stock("QQQ", "SMART", "USD");
        assert_eq!(spec.security_type.as_str(), "STK");
    }
}
