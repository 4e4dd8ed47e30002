//! L2 shared cache abstraction. A real deployment points `HttpSharedCache`
//! at any KV store fronted by a small HTTP API; `NullSharedCache` backs
//! `cache.l2_enabled = false`.

use crate::error::{Error, Result};
use crate::types::SearchResponse;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait SharedCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<SearchResponse>>;
    async fn set(&self, key: &str, response: &SearchResponse, ttl_seconds: u64) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

pub struct NullSharedCache;

#[async_trait]
impl SharedCache for NullSharedCache {
    async fn get(&self, _key: &str) -> Result<Option<SearchResponse>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _response: &SearchResponse, _ttl_seconds: u64) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}

/// HTTP-backed shared cache. Expects `GET/PUT/DELETE {endpoint}/{key}` with a
/// JSON body `{value, ttl_seconds}` on PUT, following the request/timeout
/// conventions of the engine adapters' own HTTP clients.
pub struct HttpSharedCache {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSharedCache {
    pub fn new(endpoint: String, request_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("reqwest client builds with valid defaults");
        HttpSharedCache { client, endpoint }
    }
}

#[async_trait]
impl SharedCache for HttpSharedCache {
    async fn get(&self, key: &str) -> Result<Option<SearchResponse>> {
        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), key);
        let resp = self.client.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(Error::CacheFault(format!("l2 get returned {}", resp.status())));
        }
        let value: SearchResponse = resp.json().await?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, response: &SearchResponse, ttl_seconds: u64) -> Result<()> {
        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), key);
        let body = serde_json::json!({ "value": response, "ttl_seconds": ttl_seconds });
        let resp = self.client.put(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(Error::CacheFault(format!("l2 set returned {}", resp.status())));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), key);
        let resp = self.client.delete(&url).send().await?;
        if !resp.status().is_success() && resp.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(Error::CacheFault(format!("l2 delete returned {}", resp.status())));
        }
        Ok(())
    }
}
