use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectorError {
    #[error("network error: {0}")]
    Network(String),

    #[error("http status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("api error: {0}")]
    Api(String),

    #[error("no price data returned")]
    Empty,

    #[error("not enough klines: need {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("symbol {0} is not supported by this source")]
    UnsupportedSymbol(String),

    #[error("invalid price {0}")]
    InvalidPrice(f64),

    #[error("all sources failed for {0}")]
    Exhausted(String),
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ConnectorError::Status {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else if err.is_decode() {
            ConnectorError::Parse(err.to_string())
        } else {
            ConnectorError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        ConnectorError::Parse(err.to_string())
    }
}
