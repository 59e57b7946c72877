use connectors_common::types::{parse_price, Kline, Period, PriceSnapshot};
use connectors_common::{ConnectorError, HttpTransport};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct TickerPrice {
    symbol: String,
    price: String,
}

/// All spot tickers in one call. Entries with an unparseable price are dropped.
pub async fn fetch_all(transport: &dyn HttpTransport, url: &str) -> Result<PriceSnapshot, ConnectorError> {
    let body = transport.get_json(url).await?;
    parse_tickers(body)
}

pub fn parse_tickers(body: Value) -> Result<PriceSnapshot, ConnectorError> {
    let tickers: Vec<TickerPrice> = serde_json::from_value(body)?;
    Ok(tickers
        .into_iter()
        .filter_map(|t| parse_price(&t.price).map(|p| (t.symbol, p)))
        .collect())
}

pub fn kline_url(base: &str, symbol_key: &str, period: Period) -> String {
    let interval = match period {
        Period::Daily => "1d",
        Period::FifteenMinutes => "15m",
    };
    format!(
        "{}?symbol={}&interval={}&limit={}",
        base,
        symbol_key,
        interval,
        period.required_klines()
    )
}

/// Recent candles for `symbol_key`, oldest first.
pub async fn fetch_klines(
    transport: &dyn HttpTransport,
    base: &str,
    symbol_key: &str,
    period: Period,
) -> Result<Vec<Kline>, ConnectorError> {
    let body = transport.get_json(&kline_url(base, symbol_key, period)).await?;
    parse_klines(body)
}

/// Rows look like `[openTime, "open", "high", "low", "close", "volume", closeTime, ...]`,
/// already in chronological order. Every OHLCV field must parse; a half-broken
/// row is treated as a broken response so the resolver moves on to the next source.
pub fn parse_klines(body: Value) -> Result<Vec<Kline>, ConnectorError> {
    let rows: Vec<Vec<Value>> = serde_json::from_value(body)?;
    rows.iter().map(|row| parse_row(row)).collect()
}

fn parse_row(row: &[Value]) -> Result<Kline, ConnectorError> {
    if row.len() < 6 {
        return Err(ConnectorError::Parse(format!("kline row has {} fields", row.len())));
    }
    let open_time = row[0]
        .as_i64()
        .ok_or_else(|| ConnectorError::Parse("kline open time is not an integer".to_string()))?;
    Ok(Kline {
        open_time,
        open: field(&row[1], "open")?,
        high: field(&row[2], "high")?,
        low: field(&row[3], "low")?,
        close: field(&row[4], "close")?,
        volume: field(&row[5], "volume")?,
    })
}

fn field(v: &Value, name: &str) -> Result<f64, ConnectorError> {
    v.as_str()
        .and_then(parse_price)
        .ok_or_else(|| ConnectorError::Parse(format!("kline {} is not a price string: {}", name, v)))
}
