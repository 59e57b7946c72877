use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Quote asset every snapshot key is expressed in.
pub const QUOTE_ASSET: &str = "USDT";

/// Symbol key (e.g. "BTCUSDT") to last traded price, as reported by one source.
pub type PriceSnapshot = HashMap<String, f64>;

/// Builds the snapshot key for a base asset: "BTC" -> "BTCUSDT".
pub fn symbol_key(symbol: &str) -> String {
    format!("{}{}", symbol, QUOTE_ASSET)
}

/// Parses an exchange price string. Anything that is not a finite number is `None`.
pub fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Lookback used by change-rate alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "15m")]
    FifteenMinutes,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::FifteenMinutes => "15m",
        }
    }

    /// Candles a source must return for this lookback to resolve.
    pub fn required_klines(&self) -> usize {
        match self {
            Period::Daily => 1,
            Period::FifteenMinutes => 2,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One OHLCV candle, normalized from whatever row shape the exchange sends.
#[derive(Debug, Clone, PartialEq)]
pub struct Kline {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}
