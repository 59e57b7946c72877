use connectors_common::endpoints::fill_template;
use connectors_common::types::parse_price;
use connectors_common::{ConnectorError, HttpTransport};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Kraken pair names for the base assets it can quote.
pub fn kraken_pair(symbol: &str) -> Option<&'static str> {
    match symbol {
        "BTC" => Some("XBTUSD"),
        "ETH" => Some("ETHUSD"),
        "SOL" => Some("SOLUSD"),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    #[serde(default)]
    error: Vec<String>,
    #[serde(default)]
    result: BTreeMap<String, PairTicker>,
}

#[derive(Debug, Deserialize)]
struct PairTicker {
    /// Last trade closed: `[price, lot volume]`.
    #[serde(default)]
    c: Vec<String>,
}

/// USD last-trade price for one base asset.
pub async fn fetch_one(
    transport: &dyn HttpTransport,
    url_template: &str,
    symbol: &str,
) -> Result<f64, ConnectorError> {
    let pair = kraken_pair(symbol).ok_or_else(|| ConnectorError::UnsupportedSymbol(symbol.to_string()))?;
    let body = transport.get_json(&fill_template(url_template, pair)).await?;
    parse_ticker(body)
}

/// The result key is Kraken's own pair alias (e.g. "XXBTZUSD"), so only the
/// first entry is looked at.
pub fn parse_ticker(body: Value) -> Result<f64, ConnectorError> {
    let resp: TickerResponse = serde_json::from_value(body)?;
    if !resp.error.is_empty() {
        return Err(ConnectorError::Api(resp.error.join(", ")));
    }
    let ticker = resp.result.values().next().ok_or(ConnectorError::Empty)?;
    let last = ticker.c.first().ok_or(ConnectorError::Empty)?;
    parse_price(last).ok_or_else(|| ConnectorError::Parse(format!("last trade price {:?}", last)))
}
