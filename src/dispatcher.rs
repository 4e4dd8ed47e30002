//! Deadline-bound plan execution: runs the classified plan against the
//! engine adapters, merges hybrid results, and resolves a deadline into a
//! three-tier fallback instead of an error.

use crate::cache::{Lookup, ResponseCache};
use crate::engines::SearchEngine;
use crate::error::{Error, Result};
use crate::types::{Page, Performance, QueryType, SearchRequest, SearchResponse, Total, TotalRelation};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub default_timeout_ms: u64,
    pub min_timeout_ms: u64,
    pub max_timeout_ms: u64,
    pub hybrid_overfetch_factor: u32,
    pub fallback_timeout_ms: u64,
    /// Filter field names that, when present as an exact-match filter, trigger
    /// the simple-engine `filter_by_ids` intersection leg of a hybrid plan.
    pub hybrid_filter_fields: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            default_timeout_ms: 700,
            min_timeout_ms: 50,
            max_timeout_ms: 2000,
            hybrid_overfetch_factor: 3,
            fallback_timeout_ms: 200,
            hybrid_filter_fields: vec!["entity".to_string(), "status".to_string()],
        }
    }
}

impl DispatchConfig {
    pub fn clamp_timeout(&self, requested_ms: Option<u64>) -> u64 {
        requested_ms
            .unwrap_or(self.default_timeout_ms)
            .clamp(self.min_timeout_ms, self.max_timeout_ms)
    }
}

pub struct Dispatcher {
    simple: Arc<dyn SearchEngine>,
    complex: Arc<dyn SearchEngine>,
    cache: Arc<ResponseCache>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        simple: Arc<dyn SearchEngine>,
        complex: Arc<dyn SearchEngine>,
        cache: Arc<ResponseCache>,
        config: DispatchConfig,
    ) -> Self {
        Dispatcher {
            simple,
            complex,
            cache,
            config,
        }
    }

    /// Non-timeout engine errors propagate to the caller, which maps them to
    /// `engine-error`; only the deadline firing produces a fallback response.
    #[instrument(skip(self, request), fields(tenant = %request.tenant_id, classification = ?query_type))]
    pub async fn dispatch(
        &self,
        request: &SearchRequest,
        query_type: QueryType,
        cache_key: &str,
        timeout_ms: u64,
    ) -> Result<SearchResponse> {
        let deadline = Duration::from_millis(timeout_ms);
        let start = Instant::now();

        match tokio::time::timeout(deadline, self.run_plan(request, query_type)).await {
            Ok(Ok(mut response)) => {
                response.performance.took_ms = start.elapsed().as_millis() as u64;
                Ok(response)
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Ok(self.fallback(cache_key, start).await),
        }
    }

    async fn run_plan(&self, request: &SearchRequest, query_type: QueryType) -> Result<SearchResponse> {
        match query_type {
            QueryType::Simple => self.remaining_call(&*self.simple, request).await,
            QueryType::Complex => self.remaining_call(&*self.complex, request).await,
            QueryType::Hybrid => self.run_hybrid(request).await,
        }
    }

    /// No timeout is applied here beyond the adapter's own fixed connect/
    /// request timeout: the outer `dispatch` deadline already wraps this
    /// whole call, and a second, separately-computed timeout racing the same
    /// deadline would let an inner timeout error win and surface as a 500
    /// instead of the fallback the deadline is supposed to produce.
    async fn remaining_call(&self, engine: &dyn SearchEngine, request: &SearchRequest) -> Result<SearchResponse> {
        let mut response = engine.search(request).await?;
        response.performance.engine = engine.name().to_string();
        Ok(response)
    }

    async fn run_hybrid(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let mut complex_response = self
            .complex
            .search_overfetched(request, self.config.hybrid_overfetch_factor)
            .await?;

        let triggers_intersection = request
            .filters
            .keys()
            .any(|k| self.config.hybrid_filter_fields.iter().any(|f| f == k));

        if !triggers_intersection {
            complex_response.performance.engine = "complex".to_string();
            return Ok(complex_response);
        }

        let ids: Vec<String> = complex_response.hits.iter().map(|h| h.id.clone()).collect();
        let simple_response = self.simple.filter_by_ids(request, &ids).await?;

        let allowed: HashSet<String> = simple_response.hits.iter().map(|h| h.id.clone()).collect();
        let page_size = request.page.size.unwrap_or(10) as usize;

        // Count the full intersection before truncating to a page: `total`
        // must reflect how many documents actually matched, not how many fit
        // on this page.
        let intersection_count = complex_response.hits.iter().filter(|h| allowed.contains(&h.id)).count();

        let merged_hits: Vec<_> = complex_response
            .hits
            .into_iter()
            .filter(|h| allowed.contains(&h.id))
            .take(page_size)
            .collect();

        Ok(SearchResponse {
            total: Total {
                value: intersection_count as u64,
                relation: TotalRelation::Gte,
            },
            page: Page {
                size: page_size as u32,
                cursor: complex_response.page.cursor,
                has_more: complex_response.page.has_more,
            },
            hits: merged_hits,
            facets: complex_response.facets,
            performance: Performance {
                took_ms: 0,
                engine: "hybrid".to_string(),
                cached: false,
                partial: false,
            },
            debug: None,
        })
    }

    /// Three-tier fallback run when the deadline fires: stale cache, then a
    /// degraded simple-only plan, then an empty result. Never fails.
    async fn fallback(&self, cache_key: &str, start: Instant) -> SearchResponse {
        if let Lookup::Stale(mut response) = self.cache.get_stale(cache_key) {
            response.performance.partial = true;
            response.performance.took_ms = start.elapsed().as_millis() as u64;
            return response;
        }

        let degraded_timeout = Duration::from_millis(self.config.fallback_timeout_ms);
        let mut degraded = SearchRequest::default();
        degraded.page.size = Some(10);

        match tokio::time::timeout(degraded_timeout, self.simple.search(&degraded)).await {
            Ok(Ok(mut response)) => {
                response.performance.partial = true;
                response.performance.engine = "simple-degraded".to_string();
                response.performance.took_ms = start.elapsed().as_millis() as u64;
                response.total.relation = TotalRelation::Gte;
                response
            }
            _ => SearchResponse::empty_fallback(start.elapsed().as_millis() as u64),
        }
    }
}
