use crate::errors::ConnectorError;
use crate::types::Period;
use async_trait::async_trait;

/// Something that can tell what a symbol was worth at the start of a lookback period.
#[async_trait]
pub trait BasePriceLookup: Send + Sync {
    /// `symbol` is the base asset ("ETH"). A returned price is always > 0.
    async fn base_price(&self, symbol: &str, period: Period) -> Result<f64, ConnectorError>;
}
