pub mod history;
pub mod source;

pub use history::{HistoricalResolver, KlineSource};
pub use source::PriceSource;

use connectors_common::types::PriceSnapshot;
use connectors_common::{ApiEndpoints, HttpTransport};
use log::{error, info, warn};
use std::sync::Arc;

/// A snapshot together with the source that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedSnapshot {
    pub source: PriceSource,
    pub prices: PriceSnapshot,
}

/// Ordered fallback across price sources. Exactly one source feeds each snapshot;
/// results are never merged.
pub struct PriceAggregator {
    transport: Arc<dyn HttpTransport>,
    endpoints: ApiEndpoints,
    order: Vec<PriceSource>,
}

impl PriceAggregator {
    pub fn new(transport: Arc<dyn HttpTransport>, endpoints: ApiEndpoints) -> Self {
        PriceAggregator {
            transport,
            endpoints,
            order: PriceSource::DEFAULT_ORDER.to_vec(),
        }
    }

    pub fn with_order(mut self, order: Vec<PriceSource>) -> Self {
        self.order = order;
        self
    }

    /// First error-free, non-empty snapshot in priority order, or `None` when
    /// every source failed this round.
    pub async fn get_all_prices(&self, symbols: &[String]) -> Option<SourcedSnapshot> {
        for source in &self.order {
            match source
                .fetch_snapshot(self.transport.as_ref(), &self.endpoints, symbols)
                .await
            {
                Ok(prices) if !prices.is_empty() => {
                    info!("price source: {}", source);
                    return Some(SourcedSnapshot { source: *source, prices });
                }
                Ok(_) => warn!("{} returned no prices, trying next source", source),
                Err(e) => warn!("{} failed: {}, trying next source", source, e),
            }
        }
        error!("all price sources failed");
        None
    }
}
