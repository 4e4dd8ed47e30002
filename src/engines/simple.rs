//! Adapter for the simple KV/prefix engine: exact filters, prefix free-text,
//! small result sets. No highlighting or advanced text features.

use super::SearchEngine;
use crate::error::{Error, Result};
use crate::types::{SearchRequest, SearchResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SimpleEngineConfig {
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

pub struct SimpleEngine {
    client: Client,
    config: SimpleEngineConfig,
}

impl SimpleEngine {
    pub fn new(config: SimpleEngineConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .expect("reqwest client builds with valid defaults");
        SimpleEngine { client, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    async fn post(&self, path: &str, body: &serde_json::Value, timeout: Option<Duration>) -> Result<SearchResponse> {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(t) = timeout {
            req = req.timeout(t);
        }
        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::EngineTimeout(timeout.map(|d| d.as_millis() as u64).unwrap_or(0))
            } else {
                Error::Engine(format!("simple engine request failed: {e}"))
            }
        })?;

        if !resp.status().is_success() {
            return Err(Error::Engine(format!("simple engine returned {}", resp.status())));
        }
        resp.json::<SearchResponse>()
            .await
            .map_err(|e| Error::Engine(format!("simple engine returned malformed response: {e}")))
    }
}

#[async_trait]
impl SearchEngine for SimpleEngine {
    fn name(&self) -> &'static str {
        "simple"
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let body = serde_json::to_value(request).map_err(|e| Error::Internal(e.to_string()))?;
        self.post("search", &body, None).await
    }

    async fn suggest(&self, prefix: &str, entity: &[String], limit: u32, tenant_id: &str) -> Result<SearchResponse> {
        let body = serde_json::json!({
            "prefix": prefix,
            "entity": entity,
            "limit": limit,
            "tenant_id": tenant_id,
        });
        self.post("suggest", &body, None).await
    }

    async fn filter_by_ids(&self, request: &SearchRequest, ids: &[String]) -> Result<SearchResponse> {
        let body = serde_json::json!({
            "tenant_id": request.tenant_id,
            "ids": ids,
        });
        self.post("filter_by_ids", &body, None).await
    }

    async fn health(&self) -> bool {
        self.client
            .get(self.url("health"))
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}
