//! Core data model: requests, responses, classification, cache entries, and
//! per-tenant routing strategy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type TenantId = String;

/// A single filter value: a scalar, a set, or a bounded range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FilterValue {
    Scalar(serde_json::Value),
    Array(Vec<serde_json::Value>),
    Range {
        #[serde(skip_serializing_if = "Option::is_none")]
        gte: Option<serde_json::Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        lte: Option<serde_json::Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        gt: Option<serde_json::Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        lt: Option<serde_json::Value>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PageDescriptor {
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RequestOptions {
    #[serde(default)]
    pub highlight: bool,
    #[serde(default)]
    pub suggest: bool,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub strict: bool,
}

/// Inbound search/explain request body. `tenant_id` is never read from here;
/// it is always injected from the transport header by the tenant resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchRequest {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub filters: BTreeMap<String, FilterValue>,
    #[serde(default)]
    pub sort: Vec<SortKey>,
    #[serde(default)]
    pub projection: Option<Vec<String>>,
    #[serde(default)]
    pub page: PageDescriptor,
    #[serde(default)]
    pub options: RequestOptions,

    /// Set only by the tenant resolver, never accepted from the client body.
    #[serde(skip)]
    pub tenant_id: TenantId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestRequest {
    pub prefix: String,
    #[serde(default)]
    pub entity: Vec<String>,
    #[serde(default = "default_suggest_limit")]
    pub limit: u32,
    #[serde(skip)]
    pub tenant_id: TenantId,
}

fn default_suggest_limit() -> u32 {
    10
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Simple,
    Complex,
    Hybrid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Classification {
    #[serde(rename = "type")]
    pub query_type: QueryType,
    pub complexity_score: f64,
    pub cacheable: bool,
    pub estimated_latency_ms: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TotalRelation {
    Eq,
    Gte,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Total {
    pub value: u64,
    pub relation: TotalRelation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hit {
    pub id: String,
    pub source: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Page {
    pub size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FacetBucket {
    pub key: serde_json::Value,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Facet {
    pub buckets: Vec<FacetBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Performance {
    pub took_ms: u64,
    pub engine: String,
    pub cached: bool,
    pub partial: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebugInfo {
    pub query_classification: Classification,
    pub cache_key: String,
    pub tenant_routing: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    pub hits: Vec<Hit>,
    pub total: Total,
    pub page: Page,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facets: Option<BTreeMap<String, Facet>>,
    pub performance: Performance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

impl SearchResponse {
    pub fn empty_fallback(took_ms: u64) -> Self {
        SearchResponse {
            hits: Vec::new(),
            total: Total {
                value: 0,
                relation: TotalRelation::Gte,
            },
            page: Page {
                size: 0,
                cursor: None,
                has_more: false,
            },
            facets: None,
            performance: Performance {
                took_ms,
                engine: "fallback".to_string(),
                cached: false,
                partial: true,
            },
            debug: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexStrategy {
    Shared,
    Dedicated,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingStrategy {
    pub index_name: String,
    pub shard_count: u32,
    pub replica_count: u32,
    pub strategy: IndexStrategy,
}

impl Default for RoutingStrategy {
    fn default() -> Self {
        RoutingStrategy {
            index_name: "shared".to_string(),
            shard_count: 1,
            replica_count: 1,
            strategy: IndexStrategy::Shared,
        }
    }
}

/// Explain-endpoint response; never touches cache or an engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExplainResponse {
    pub classification: Classification,
    pub routing: ExplainRouting,
    pub estimated_cost: ExplainCost,
    pub cache_strategy: ExplainCacheStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExplainRouting {
    pub engine: String,
    pub index: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExplainCost {
    pub complexity_score: f64,
    pub expected_latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExplainCacheStrategy {
    pub cacheable: bool,
    pub key: String,
    pub ttl_seconds: u64,
}

/// Cache entry as kept by the cache tiers. Tenant scoping lives in the key
/// prefix, not in this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub response: SearchResponse,
    #[serde(skip)]
    pub created_at_ms: u64,
    pub ttl_ms: u64,
    pub size_hint: usize,
}
