use serde::Deserialize;

/// Placeholder substituted with the exchange symbol in per-symbol URL templates.
pub const SYMBOL_PLACEHOLDER: &str = "{symbol}";

/// REST endpoints for every price source, as written in the `[Api]` config table.
/// Keys left out of the table fall back to the public exchange URLs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiEndpoints {
    #[serde(rename = "BinanceUrl")]
    pub binance_url: String,
    #[serde(rename = "BinanceKlineUrl")]
    pub binance_kline_url: String,
    #[serde(rename = "BybitUrl")]
    pub bybit_url: String,
    #[serde(rename = "BybitKlineUrl")]
    pub bybit_kline_url: String,
    #[serde(rename = "CoinbaseUrlTemplate")]
    pub coinbase_url_template: String,
    #[serde(rename = "KrakenUrlTemplate")]
    pub kraken_url_template: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        ApiEndpoints {
            binance_url: "https://api.binance.com/api/v3/ticker/price".to_string(),
            binance_kline_url: "https://api.binance.com/api/v3/klines".to_string(),
            bybit_url: "https://api.bybit.com/v5/market/tickers?category=spot".to_string(),
            bybit_kline_url: "https://api.bybit.com/v5/market/kline".to_string(),
            coinbase_url_template: "https://api.coinbase.com/v2/prices/{symbol}-USD/spot".to_string(),
            kraken_url_template: "https://api.kraken.com/0/public/Ticker?pair={symbol}".to_string(),
        }
    }
}

pub fn fill_template(template: &str, symbol: &str) -> String {
    template.replace(SYMBOL_PLACEHOLDER, symbol)
}
