pub mod endpoints;
pub mod errors;
pub mod history;
pub mod transport;
pub mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use endpoints::ApiEndpoints;
pub use errors::ConnectorError;
pub use history::BasePriceLookup;
pub use transport::{HttpTransport, ReqwestTransport};
pub use types::{parse_price, symbol_key, Kline, Period, PriceSnapshot};
