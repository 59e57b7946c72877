//! Push delivery of alert batches.

use alert_engine::AlertEvent;
use async_trait::async_trait;
use connectors_common::{ConnectorError, HttpTransport};
use std::sync::Arc;
use thiserror::Error;

pub const ALERT_TITLE: &str = "Crypto price alert";

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("push failed: {0}")]
    Push(#[from] ConnectorError),
}

/// Sink for triggered alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, alerts: &[AlertEvent]) -> Result<(), NotifyError>;
}

/// Plain-text body: a header line, then one block per alert.
pub fn format_message(alerts: &[AlertEvent]) -> String {
    let lines: Vec<String> = alerts.iter().map(|a| a.to_string()).collect();
    format!("🚨 {}\n\n{}", ALERT_TITLE, lines.join("\n\n"))
}

/// Publishes to an ntfy topic URL.
pub struct NtfyNotifier {
    transport: Arc<dyn HttpTransport>,
    url: String,
}

impl NtfyNotifier {
    pub fn new(transport: Arc<dyn HttpTransport>, url: &str) -> Self {
        NtfyNotifier {
            transport,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    async fn send(&self, alerts: &[AlertEvent]) -> Result<(), NotifyError> {
        if alerts.is_empty() {
            return Ok(());
        }
        let headers = [
            ("Title", ALERT_TITLE),
            ("Priority", "urgent"),
            ("Tags", "warning,chart"),
            ("X-Priority", "5"),
        ];
        self.transport
            .post_text(&self.url, &headers, format_message(alerts))
            .await?;
        Ok(())
    }
}
