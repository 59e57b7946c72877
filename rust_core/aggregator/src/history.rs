//! Base prices for change-rate alerts, read from exchange klines.

use async_trait::async_trait;
use connectors_common::types::{symbol_key, Kline, Period};
use connectors_common::{ApiEndpoints, BasePriceLookup, ConnectorError, HttpTransport};
use log::debug;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KlineSource {
    Binance,
    Bybit,
}

impl KlineSource {
    pub const DEFAULT_ORDER: [KlineSource; 2] = [KlineSource::Binance, KlineSource::Bybit];

    pub fn name(&self) -> &'static str {
        match self {
            KlineSource::Binance => connector_binance::NAME,
            KlineSource::Bybit => connector_bybit::NAME,
        }
    }

    /// Candles for the period, oldest first.
    pub async fn fetch_klines(
        &self,
        transport: &dyn HttpTransport,
        endpoints: &ApiEndpoints,
        symbol_key: &str,
        period: Period,
    ) -> Result<Vec<Kline>, ConnectorError> {
        match self {
            KlineSource::Binance => {
                connector_binance::rest::fetch_klines(transport, &endpoints.binance_kline_url, symbol_key, period)
                    .await
            }
            KlineSource::Bybit => {
                connector_bybit::rest::fetch_klines(transport, &endpoints.bybit_kline_url, symbol_key, period).await
            }
        }
    }
}

impl fmt::Display for KlineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Picks the reference price out of chronologically ordered candles.
///
/// `Daily` is the open of the latest daily candle. `FifteenMinutes` is the
/// close of the candle before the latest one, since the latest is still forming.
pub fn base_price_from_klines(klines: &[Kline], period: Period) -> Result<f64, ConnectorError> {
    let needed = period.required_klines();
    if klines.len() < needed {
        return Err(ConnectorError::InsufficientData { needed, got: klines.len() });
    }
    let price = match period {
        Period::Daily => klines[klines.len() - 1].open,
        Period::FifteenMinutes => klines[klines.len() - 2].close,
    };
    if price <= 0.0 {
        return Err(ConnectorError::InvalidPrice(price));
    }
    Ok(price)
}

pub struct HistoricalResolver {
    transport: Arc<dyn HttpTransport>,
    endpoints: ApiEndpoints,
    order: Vec<KlineSource>,
}

impl HistoricalResolver {
    pub fn new(transport: Arc<dyn HttpTransport>, endpoints: ApiEndpoints) -> Self {
        HistoricalResolver {
            transport,
            endpoints,
            order: KlineSource::DEFAULT_ORDER.to_vec(),
        }
    }

    /// `symbol` is the base asset. Sources are tried in order until one yields a
    /// positive price.
    pub async fn get_historical_price(&self, symbol: &str, period: Period) -> Result<f64, ConnectorError> {
        let key = symbol_key(symbol);
        for source in &self.order {
            let resolved = source
                .fetch_klines(self.transport.as_ref(), &self.endpoints, &key, period)
                .await
                .and_then(|klines| base_price_from_klines(&klines, period));
            match resolved {
                Ok(price) => return Ok(price),
                Err(e) => debug!("{} {} base price from {}: {}", key, period, source, e),
            }
        }
        Err(ConnectorError::Exhausted(format!("{} {}", symbol, period)))
    }
}

#[async_trait]
impl BasePriceLookup for HistoricalResolver {
    async fn base_price(&self, symbol: &str, period: Period) -> Result<f64, ConnectorError> {
        self.get_historical_price(symbol, period).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors_common::testing::StaticTransport;
    use serde_json::json;

    const BINANCE_DAILY: &str = "https://binance/klines?symbol=ETHUSDT&interval=1d&limit=1";
    const BINANCE_15M: &str = "https://binance/klines?symbol=ETHUSDT&interval=15m&limit=2";
    const BYBIT_DAILY: &str = "https://bybit/kline?category=spot&symbol=ETHUSDT&interval=D&limit=1";
    const BYBIT_15M: &str = "https://bybit/kline?category=spot&symbol=ETHUSDT&interval=15&limit=2";

    fn endpoints() -> ApiEndpoints {
        ApiEndpoints {
            binance_kline_url: "https://binance/klines".to_string(),
            bybit_kline_url: "https://bybit/kline".to_string(),
            ..ApiEndpoints::default()
        }
    }

    fn kline(open: f64, close: f64) -> Kline {
        Kline { open_time: 0, open, high: open.max(close), low: open.min(close), close, volume: 1.0 }
    }

    fn bybit(rows: serde_json::Value) -> serde_json::Value {
        json!({"retCode": 0, "retMsg": "OK", "result": {"category": "spot", "list": rows}})
    }

    #[test]
    fn test_base_price_daily_uses_latest_open() {
        let klines = vec![kline(190.0, 195.0), kline(200.0, 205.0)];
        assert_eq!(base_price_from_klines(&klines, Period::Daily).unwrap(), 200.0);
    }

    #[test]
    fn test_base_price_15m_uses_previous_close() {
        let klines = vec![kline(100.0, 101.0), kline(101.0, 109.0)];
        assert_eq!(base_price_from_klines(&klines, Period::FifteenMinutes).unwrap(), 101.0);
    }

    #[test]
    fn test_base_price_15m_needs_two_klines() {
        let err = base_price_from_klines(&[kline(1.0, 2.0)], Period::FifteenMinutes).unwrap_err();
        assert_eq!(err, ConnectorError::InsufficientData { needed: 2, got: 1 });
        assert!(base_price_from_klines(&[], Period::Daily).is_err());
    }

    #[test]
    fn test_base_price_rejects_zero() {
        assert_eq!(
            base_price_from_klines(&[kline(0.0, 1.0)], Period::Daily),
            Err(ConnectorError::InvalidPrice(0.0))
        );
    }

    #[tokio::test]
    async fn test_binance_daily_open() {
        let transport = Arc::new(StaticTransport::new().with_json(
            BINANCE_DAILY,
            json!([[1700000000000i64, "200.0", "215.0", "195.0", "210.0", "1000", 1700086399999i64]]),
        ));
        let resolver = HistoricalResolver::new(transport, endpoints());
        assert_eq!(resolver.get_historical_price("ETH", Period::Daily).await.unwrap(), 200.0);
    }

    #[tokio::test]
    async fn test_bybit_15m_reverse_order_takes_previous_close() {
        // newest first: [C_latest, C_prev]
        let transport = Arc::new(StaticTransport::new().with_json(
            BYBIT_15M,
            bybit(json!([
                ["1700000900000", "204", "206", "203", "205.5", "10", "2000"],
                ["1700000000000", "200", "204", "199", "204.0", "10", "2000"]
            ])),
        ));
        let resolver = HistoricalResolver::new(transport, endpoints());
        let price = resolver.get_historical_price("ETH", Period::FifteenMinutes).await.unwrap();
        assert_eq!(price, 204.0);
    }

    #[tokio::test]
    async fn test_binance_15m_forward_order_takes_previous_close() {
        let transport = Arc::new(StaticTransport::new().with_json(
            BINANCE_15M,
            json!([
                [1700000000000i64, "200", "204", "199", "204.0", "10", 1700000899999i64],
                [1700000900000i64, "204", "206", "203", "205.5", "10", 1700001799999i64]
            ]),
        ));
        let resolver = HistoricalResolver::new(transport, endpoints());
        let price = resolver.get_historical_price("ETH", Period::FifteenMinutes).await.unwrap();
        assert_eq!(price, 204.0);
    }

    #[tokio::test]
    async fn test_single_15m_kline_is_an_error() {
        let transport = Arc::new(
            StaticTransport::new()
                .with_json(BINANCE_15M, json!([[1700000000000i64, "200", "204", "199", "204.0", "10"]]))
                .with_json(BYBIT_15M, bybit(json!([["1700000000000", "200", "204", "199", "204.0", "10", "1"]]))),
        );
        let resolver = HistoricalResolver::new(transport, endpoints());
        let err = resolver.get_historical_price("ETH", Period::FifteenMinutes).await.unwrap_err();
        assert!(matches!(err, ConnectorError::Exhausted(_)));
    }

    #[tokio::test]
    async fn test_zero_price_falls_through_to_next_source() {
        let transport = Arc::new(
            StaticTransport::new()
                .with_json(BINANCE_DAILY, json!([[1700000000000i64, "0", "0", "0", "0", "0"]]))
                .with_json(BYBIT_DAILY, bybit(json!([["1700000000000", "199.5", "210", "190", "205", "1", "1"]]))),
        );
        let resolver = HistoricalResolver::new(transport, endpoints());
        assert_eq!(resolver.base_price("ETH", Period::Daily).await.unwrap(), 199.5);
    }

    #[tokio::test]
    async fn test_all_sources_failed() {
        let resolver = HistoricalResolver::new(Arc::new(StaticTransport::new()), endpoints());
        assert!(resolver.get_historical_price("ETH", Period::Daily).await.is_err());
    }
}
