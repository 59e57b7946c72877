use connectors_common::types::{parse_price, Kline, Period, PriceSnapshot};
use connectors_common::{ConnectorError, HttpTransport};
use serde::Deserialize;
use serde_json::Value;

/// Every Bybit v5 response is wrapped in this envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg", default)]
    ret_msg: String,
    result: Option<ListResult<T>>,
}

#[derive(Debug, Deserialize)]
struct ListResult<T> {
    #[serde(default = "Vec::new")]
    list: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Ticker {
    symbol: String,
    #[serde(rename = "lastPrice")]
    last_price: String,
}

fn unwrap_envelope<T>(env: Envelope<T>) -> Result<Vec<T>, ConnectorError> {
    if env.ret_code != 0 {
        return Err(ConnectorError::Api(format!("retCode {}: {}", env.ret_code, env.ret_msg)));
    }
    Ok(env.result.map(|r| r.list).unwrap_or_default())
}

pub async fn fetch_all(transport: &dyn HttpTransport, url: &str) -> Result<PriceSnapshot, ConnectorError> {
    let body = transport.get_json(url).await?;
    parse_tickers(body)
}

pub fn parse_tickers(body: Value) -> Result<PriceSnapshot, ConnectorError> {
    let env: Envelope<Ticker> = serde_json::from_value(body)?;
    Ok(unwrap_envelope(env)?
        .into_iter()
        .filter_map(|t| parse_price(&t.last_price).map(|p| (t.symbol, p)))
        .collect())
}

pub fn kline_url(base: &str, symbol_key: &str, period: Period) -> String {
    let interval = match period {
        Period::Daily => "D",
        Period::FifteenMinutes => "15",
    };
    format!(
        "{}?category=spot&symbol={}&interval={}&limit={}",
        base,
        symbol_key,
        interval,
        period.required_klines()
    )
}

pub async fn fetch_klines(
    transport: &dyn HttpTransport,
    base: &str,
    symbol_key: &str,
    period: Period,
) -> Result<Vec<Kline>, ConnectorError> {
    let body = transport.get_json(&kline_url(base, symbol_key, period)).await?;
    parse_klines(body)
}

/// Bybit lists candles newest first as all-string rows
/// `[startTime, open, high, low, close, volume, turnover]`; returned oldest first.
/// A row with any malformed OHLCV field fails the whole response.
pub fn parse_klines(body: Value) -> Result<Vec<Kline>, ConnectorError> {
    let env: Envelope<Vec<String>> = serde_json::from_value(body)?;
    let mut klines = unwrap_envelope(env)?
        .iter()
        .map(|row| parse_row(row))
        .collect::<Result<Vec<_>, _>>()?;
    klines.reverse();
    Ok(klines)
}

fn parse_row(row: &[String]) -> Result<Kline, ConnectorError> {
    if row.len() < 6 {
        return Err(ConnectorError::Parse(format!("kline row has {} fields", row.len())));
    }
    let open_time = row[0]
        .parse::<i64>()
        .map_err(|e| ConnectorError::Parse(format!("kline start time {:?}: {}", row[0], e)))?;
    let field = |i: usize, name: &str| {
        parse_price(&row[i])
            .ok_or_else(|| ConnectorError::Parse(format!("kline {} {:?}", name, row[i])))
    };
    Ok(Kline {
        open_time,
        open: field(1, "open")?,
        high: field(2, "high")?,
        low: field(3, "low")?,
        close: field(4, "close")?,
        volume: field(5, "volume")?,
    })
}
