//! Adapter for the complex full-text/faceted engine: phrase/prefix/fuzzy
//! modes, highlighting, facet aggregations, `from/size` pagination encoded
//! into an opaque cursor.

use super::SearchEngine;
use crate::error::{Error, Result};
use crate::types::{SearchRequest, SearchResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ComplexEngineConfig {
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub highlight_fragment_size: u32,
    pub highlight_fragment_count: u32,
    pub facet_fields: Vec<String>,
}

pub struct ComplexEngine {
    client: Client,
    config: ComplexEngineConfig,
}

impl ComplexEngine {
    pub fn new(config: ComplexEngineConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .expect("reqwest client builds with valid defaults");
        ComplexEngine { client, config }
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
                Error::Engine(format!("complex engine request failed: {e}"))
            }
        })?;

        if !resp.status().is_success() {
            return Err(Error::Engine(format!("complex engine returned {}", resp.status())));
        }
        resp.json::<SearchResponse>()
            .await
            .map_err(|e| Error::Engine(format!("complex engine returned malformed response: {e}")))
    }

    /// Build the request body for a hybrid fan-out, inflating the page size
    /// by `overfetch_factor` so the subsequent simple-engine intersection
    /// still has enough candidates to fill a page.
    fn overfetch_body(&self, request: &SearchRequest, overfetch_factor: u32) -> Result<serde_json::Value> {
        let mut body = serde_json::to_value(request).map_err(|e| Error::Internal(e.to_string()))?;
        if let Some(page) = body.get_mut("page").and_then(|p| p.as_object_mut()) {
            let size = page.get("size").and_then(|s| s.as_u64()).unwrap_or(10);
            page.insert("size".to_string(), serde_json::json!(size * overfetch_factor as u64));
        }
        if let Some(obj) = body.as_object_mut() {
            obj.insert(
                "highlight_fragment_size".to_string(),
                serde_json::json!(self.config.highlight_fragment_size),
            );
            obj.insert(
                "highlight_fragment_count".to_string(),
                serde_json::json!(self.config.highlight_fragment_count),
            );
            obj.insert("facet_fields".to_string(), serde_json::json!(self.config.facet_fields));
        }
        Ok(body)
    }
}

#[async_trait]
impl SearchEngine for ComplexEngine {
    fn name(&self) -> &'static str {
        "complex"
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        self.search_overfetched(request, 1).await
    }

    async fn search_overfetched(&self, request: &SearchRequest, overfetch_factor: u32) -> Result<SearchResponse> {
        let body = self.overfetch_body(request, overfetch_factor)?;
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
