//! HTTP seam shared by every connector.

use crate::errors::ConnectorError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET `url` and decode the body as JSON. Non-2xx responses are errors.
    async fn get_json(&self, url: &str) -> Result<Value, ConnectorError>;

    /// POST a plain-text body with extra headers. Non-2xx responses are errors.
    async fn post_text(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: String,
    ) -> Result<(), ConnectorError>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConnectorError::Network(e.to_string()))?;
        Ok(ReqwestTransport { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, url: &str) -> Result<Value, ConnectorError> {
        let resp = self.client.get(url).send().await?.error_for_status()?;
        let text = resp.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn post_text(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: String,
    ) -> Result<(), ConnectorError> {
        let mut req = self.client.post(url).body(body);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        req.send().await?.error_for_status()?;
        Ok(())
    }
}
