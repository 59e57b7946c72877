use connectors_common::types::{symbol_key, PriceSnapshot};
use connectors_common::{ApiEndpoints, ConnectorError, HttpTransport};
use std::fmt;

/// The exchanges a snapshot can come from, in default priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceSource {
    Binance,
    Bybit,
    Coinbase,
    Kraken,
}

impl PriceSource {
    pub const DEFAULT_ORDER: [PriceSource; 4] = [
        PriceSource::Binance,
        PriceSource::Bybit,
        PriceSource::Coinbase,
        PriceSource::Kraken,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PriceSource::Binance => connector_binance::NAME,
            PriceSource::Bybit => connector_bybit::NAME,
            PriceSource::Coinbase => connector_coinbase::NAME,
            PriceSource::Kraken => connector_kraken::NAME,
        }
    }

    /// One snapshot from this source. `symbols` are base assets and only matter
    /// for the per-symbol sources (Coinbase, Kraken).
    pub async fn fetch_snapshot(
        &self,
        transport: &dyn HttpTransport,
        endpoints: &ApiEndpoints,
        symbols: &[String],
    ) -> Result<PriceSnapshot, ConnectorError> {
        match self {
            PriceSource::Binance => connector_binance::rest::fetch_all(transport, &endpoints.binance_url).await,
            PriceSource::Bybit => connector_bybit::rest::fetch_all(transport, &endpoints.bybit_url).await,
            PriceSource::Coinbase => {
                let mut prices = PriceSnapshot::new();
                for symbol in symbols {
                    // a failed symbol is skipped, the batch carries on
                    if let Ok(price) =
                        connector_coinbase::rest::fetch_one(transport, &endpoints.coinbase_url_template, symbol).await
                    {
                        prices.insert(symbol_key(symbol), price);
                    }
                }
                non_empty(prices)
            }
            PriceSource::Kraken => {
                let mut prices = PriceSnapshot::new();
                for symbol in symbols {
                    if let Ok(price) =
                        connector_kraken::rest::fetch_one(transport, &endpoints.kraken_url_template, symbol).await
                    {
                        prices.insert(symbol_key(symbol), price);
                    }
                }
                non_empty(prices)
            }
        }
    }
}

fn non_empty(prices: PriceSnapshot) -> Result<PriceSnapshot, ConnectorError> {
    if prices.is_empty() {
        return Err(ConnectorError::Empty);
    }
    Ok(prices)
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
