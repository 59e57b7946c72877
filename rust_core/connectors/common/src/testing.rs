//! Canned-response transport for tests.

use crate::errors::ConnectorError;
use crate::transport::HttpTransport;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPost {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Serves fixed JSON bodies by exact URL. Unknown URLs fail with a network error.
#[derive(Default)]
pub struct StaticTransport {
    responses: Mutex<HashMap<String, Result<Value, ConnectorError>>>,
    gets: Mutex<Vec<String>>,
    posts: Mutex<Vec<RecordedPost>>,
    fail_posts: Mutex<bool>,
}

impl StaticTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(self, url: &str, body: Value) -> Self {
        self.set_json(url, body);
        self
    }

    pub fn with_error(self, url: &str, err: ConnectorError) -> Self {
        self.responses.lock().unwrap().insert(url.to_string(), Err(err));
        self
    }

    pub fn set_json(&self, url: &str, body: Value) {
        self.responses.lock().unwrap().insert(url.to_string(), Ok(body));
    }

    pub fn fail_posts(&self, fail: bool) {
        *self.fail_posts.lock().unwrap() = fail;
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }

    pub fn posts(&self) -> Vec<RecordedPost> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for StaticTransport {
    async fn get_json(&self, url: &str) -> Result<Value, ConnectorError> {
        self.gets.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(ConnectorError::Network(format!("no route to {}", url))))
    }

    async fn post_text(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: String,
    ) -> Result<(), ConnectorError> {
        if *self.fail_posts.lock().unwrap() {
            return Err(ConnectorError::Network("push endpoint unreachable".to_string()));
        }
        self.posts.lock().unwrap().push(RecordedPost {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body,
        });
        Ok(())
    }
}
