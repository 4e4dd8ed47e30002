//! HTTP handlers for `/search`, `/suggest`, `/explain`, `/health`, `/ready`,
//! and `/metrics`. Each handler orchestrates the pipeline described in
//! SPEC_FULL.md §4.7 and never reimplements pipeline logic inline.

use crate::classifier;
use crate::error::GatewayError;
use crate::fingerprint;
use crate::server::AppState;
use crate::tenant::Claims;
use crate::types::{
    Classification, DebugInfo, ExplainCacheStrategy, ExplainCost, ExplainResponse, ExplainRouting, QueryType,
    SearchRequest, SearchResponse, SuggestRequest,
};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::instrument;

fn cache_ttl_ms(classification: &Classification, hit_count: usize) -> u64 {
    if hit_count < 20 {
        600_000 // small result set: longest TTL
    } else if classification.query_type == QueryType::Simple {
        300_000
    } else {
        120_000
    }
}

#[instrument(skip(state, headers, payload))]
pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> std::result::Result<Json<SearchResponse>, GatewayError> {
    let start = Instant::now();
    let mut request: SearchRequest = serde_json::from_value(payload)
        .map_err(|e| GatewayError::BadRequest(format!("invalid request body: {e}")))?;

    if let Some(size) = request.page.size {
        if size == 0 {
            return Err(GatewayError::BadRequest("page.size must be greater than 0".to_string()));
        }
    }

    let tenant_id = state.tenant_resolver.resolve(&headers)?;
    let claims: Claims = state.tenant_resolver.authenticate(&headers)?;
    request = state.tenant_resolver.apply_authorization(request, &tenant_id, &claims);

    let cache_key = fingerprint::search_key(&tenant_id, &request);

    if let Some(mut cached) = state.cache.get(&cache_key).await {
        cached.performance.cached = true;
        cached.performance.took_ms = start.elapsed().as_millis() as u64;
        state.metrics.record_cache_hit("search");
        return Ok(Json(cached));
    }
    state.metrics.record_cache_miss("search");

    let classification = classifier::classify(&request, &state.classifier_config);
    let timeout_ms = state.dispatch_config.clamp_timeout(request.options.timeout_ms);

    let mut response = state
        .dispatcher
        .dispatch(&request, classification.query_type, &cache_key, timeout_ms)
        .await
        .map_err(GatewayError::from)?;

    response.performance.took_ms = start.elapsed().as_millis() as u64;
    response.performance.cached = false;
    response.debug = Some(DebugInfo {
        query_classification: classification.clone(),
        cache_key: cache_key.clone(),
        tenant_routing: format!("{:?}", state.tenant_resolver.routing(&tenant_id).strategy),
    });

    if classification.cacheable && !response.performance.partial {
        let ttl = cache_ttl_ms(&classification, response.hits.len());
        state.cache.set(&cache_key, response.clone(), ttl).await;
    }

    state.metrics.record_request(&tenant_id, classification.query_type, start.elapsed());

    Ok(Json(response))
}

#[instrument(skip(state, headers, payload))]
pub async fn suggest(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> std::result::Result<Json<SearchResponse>, GatewayError> {
    let start = Instant::now();
    let request: SuggestRequest = serde_json::from_value(payload)
        .map_err(|e| GatewayError::BadRequest(format!("invalid request body: {e}")))?;

    if request.prefix.is_empty() || request.prefix.len() > 50 {
        return Err(GatewayError::BadRequest("prefix must be 1..=50 characters".to_string()));
    }

    let tenant_id = state.tenant_resolver.resolve(&headers)?;
    let cache_key = fingerprint::suggest_key(&tenant_id, &request.prefix, &request.entity, request.limit);

    if let Some(mut cached) = state.cache.get(&cache_key).await {
        cached.performance.cached = true;
        cached.performance.took_ms = start.elapsed().as_millis() as u64;
        state.metrics.record_cache_hit("suggest");
        return Ok(Json(cached));
    }
    state.metrics.record_cache_miss("suggest");

    let mut response = state
        .simple_engine
        .suggest(&request.prefix, &request.entity, request.limit, &tenant_id)
        .await
        .map_err(GatewayError::from)?;

    response.performance.took_ms = start.elapsed().as_millis() as u64;
    state.cache.set(&cache_key, response.clone(), 300_000).await;
    state.metrics.record_request(&tenant_id, QueryType::Simple, start.elapsed());

    Ok(Json(response))
}

#[instrument(skip(state, headers, payload))]
pub async fn explain(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> std::result::Result<Json<ExplainResponse>, GatewayError> {
    let mut request: SearchRequest = serde_json::from_value(payload)
        .map_err(|e| GatewayError::BadRequest(format!("invalid request body: {e}")))?;

    let tenant_id = state.tenant_resolver.resolve(&headers)?;
    let claims = state.tenant_resolver.authenticate(&headers)?;
    request = state.tenant_resolver.apply_authorization(request, &tenant_id, &claims);

    let classification = classifier::classify(&request, &state.classifier_config);
    let cache_key = fingerprint::search_key(&tenant_id, &request);
    let routing = state.tenant_resolver.routing(&tenant_id);
    let ttl = cache_ttl_ms(&classification, 0);

    Ok(Json(ExplainResponse {
        routing: ExplainRouting {
            engine: match classification.query_type {
                QueryType::Simple => "simple".to_string(),
                QueryType::Complex => "complex".to_string(),
                QueryType::Hybrid => "hybrid".to_string(),
            },
            index: routing.index_name,
            reason: classification.reason.clone(),
        },
        estimated_cost: ExplainCost {
            complexity_score: classification.complexity_score,
            expected_latency_ms: classification.estimated_latency_ms,
        },
        cache_strategy: ExplainCacheStrategy {
            cacheable: classification.cacheable,
            key: cache_key,
            ttl_seconds: ttl / 1000,
        },
        classification,
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.health.snapshot().await;
    Json(json!({
        "status": snapshot.status,
        "simple": snapshot.simple,
        "complex": snapshot.complex,
    }))
}

pub async fn ready(State(state): State<AppState>) -> Response {
    let snapshot = state.health.snapshot().await;
    if snapshot.status == crate::health::AggregateStatus::Unhealthy {
        (axum::http::StatusCode::SERVICE_UNAVAILABLE, Json(json!({"status": snapshot.status}))).into_response()
    } else {
        (axum::http::StatusCode::OK, Json(json!({"status": snapshot.status}))).into_response()
    }
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.observe_cache_stats(&state.cache.stats());
    state.metrics.export_text()
}

/// Increments the error counter for any response that comes back with a
/// client or server error status, keyed by status code. Runs as router
/// middleware rather than inline in each handler so no error path is missed.
pub async fn record_errors(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status().is_client_error() || response.status().is_server_error() {
        state.metrics.record_error(response.status().as_str());
    }
    response
}

#[cfg(test)]
mod performance_defaults {
    use super::*;

    #[test]
    fn cache_ttl_prefers_small_result_sets() {
        let classification = Classification {
            query_type: QueryType::Complex,
            complexity_score: 1.0,
            cacheable: true,
            estimated_latency_ms: 1,
            reason: "test".to_string(),
        };
        assert_eq!(cache_ttl_ms(&classification, 3), 600_000);
    }
}
