use connectors_common::endpoints::fill_template;
use connectors_common::types::parse_price;
use connectors_common::{ConnectorError, HttpTransport};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct SpotResponse {
    data: SpotData,
}

#[derive(Debug, Deserialize)]
struct SpotData {
    amount: String,
}

/// USD spot price for one base asset. Coinbase quotes in USD; callers treat it as USDT.
pub async fn fetch_one(
    transport: &dyn HttpTransport,
    url_template: &str,
    symbol: &str,
) -> Result<f64, ConnectorError> {
    let body = transport.get_json(&fill_template(url_template, symbol)).await?;
    parse_spot(body)
}

pub fn parse_spot(body: Value) -> Result<f64, ConnectorError> {
    let resp: SpotResponse = serde_json::from_value(body)?;
    parse_price(&resp.data.amount)
        .ok_or_else(|| ConnectorError::Parse(format!("spot amount {:?}", resp.data.amount)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors_common::testing::StaticTransport;
    use serde_json::json;

    #[test]
    fn test_parse_spot() {
        let body = json!({"data": {"base": "BTC", "currency": "USD", "amount": "64123.45"}});
        assert_eq!(parse_spot(body).unwrap(), 64123.45);
    }

    #[test]
    fn test_parse_spot_bad_amount() {
        assert!(parse_spot(json!({"data": {"amount": "n/a"}})).is_err());
        assert!(parse_spot(json!({"errors": [{"id": "not_found"}]})).is_err());
    }

    #[tokio::test]
    async fn test_fetch_one_fills_template() {
        let transport = StaticTransport::new().with_json(
            "https://cb/prices/ETH-USD/spot",
            json!({"data": {"amount": "3000"}}),
        );
        let price = fetch_one(&transport, "https://cb/prices/{symbol}-USD/spot", "ETH")
            .await
            .unwrap();
        assert_eq!(price, 3000.0);
    }
}
