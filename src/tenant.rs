//! Tenant resolution: identifier extraction, authorization/ACL injection,
//! and per-tenant routing-strategy memoization.

use crate::error::Error;
use crate::types::{FilterValue, IndexStrategy, RoutingStrategy, SearchRequest, TenantId};
use axum::http::HeaderMap;
use dashmap::DashMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const TENANT_HEADER: &str = "x-tenant-id";

/// Claims carried on an optional bearer token. Only the subset the gateway
/// actually consumes for ACL filtering; token issuance/rotation is out of
/// scope (see SPEC_FULL.md §1 Non-goals).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    exp: i64,
}

#[derive(Debug, Clone)]
pub struct TenantConfig {
    pub dedicated_tenants: Vec<TenantId>,
    pub jwt_secret: Option<String>,
}

impl Default for TenantConfig {
    fn default() -> Self {
        TenantConfig {
            dedicated_tenants: Vec::new(),
            jwt_secret: None,
        }
    }
}

/// Pluggable tenant routing-strategy lookup. The shipped implementation is a
/// static table from configuration; a real deployment can provide its own
/// behind this same interface.
pub trait TenantDirectory: Send + Sync {
    fn strategy_for(&self, tenant_id: &str) -> RoutingStrategy;
}

pub struct ConfiguredTenantDirectory {
    dedicated: std::collections::HashSet<TenantId>,
}

impl ConfiguredTenantDirectory {
    pub fn new(dedicated_tenants: Vec<TenantId>) -> Self {
        ConfiguredTenantDirectory {
            dedicated: dedicated_tenants.into_iter().collect(),
        }
    }
}

impl TenantDirectory for ConfiguredTenantDirectory {
    fn strategy_for(&self, tenant_id: &str) -> RoutingStrategy {
        if self.dedicated.contains(tenant_id) {
            RoutingStrategy {
                index_name: format!("tenant-{tenant_id}"),
                shard_count: 1,
                replica_count: 1,
                strategy: IndexStrategy::Dedicated,
            }
        } else {
            RoutingStrategy::default()
        }
    }
}

pub struct TenantResolver {
    config: TenantConfig,
    directory: Arc<dyn TenantDirectory>,
    routing_memo: DashMap<TenantId, RoutingStrategy>,
}

impl TenantResolver {
    pub fn new(config: TenantConfig, directory: Arc<dyn TenantDirectory>) -> Self {
        TenantResolver {
            config,
            directory,
            routing_memo: DashMap::new(),
        }
    }

    /// Extract and validate the tenant identifier from transport headers.
    pub fn resolve(&self, headers: &HeaderMap) -> Result<TenantId, Error> {
        let tenant_id = headers
            .get(TENANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(Error::MissingTenant)?;
        Ok(tenant_id.to_string())
    }

    /// Decode an optional bearer token into claims. Absence of a token or of
    /// `jwt_secret` configuration yields empty claims (no ACL filters added),
    /// not a failure; a present-but-invalid token is `forbidden`.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Claims, Error> {
        let Some(secret) = &self.config.jwt_secret else {
            return Ok(Claims::default());
        };
        let Some(token) = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
        else {
            return Ok(Claims::default());
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map_err(|e| Error::Forbidden(format!("invalid bearer token: {e}")))?;
        Ok(data.claims)
    }

    /// Inject the mandatory tenant filter and any claims-derived ACL filters.
    /// Any `tenant_id` the caller set in the body is overwritten here.
    pub fn apply_authorization(
        &self,
        mut request: SearchRequest,
        tenant_id: &TenantId,
        claims: &Claims,
    ) -> SearchRequest {
        request.tenant_id = tenant_id.clone();
        request
            .filters
            .insert("__tenant_id".to_string(), FilterValue::Scalar(tenant_id.clone().into()));

        if !claims.groups.is_empty() {
            let values: Vec<serde_json::Value> =
                claims.groups.iter().map(|g| serde_json::Value::String(g.clone())).collect();
            request
                .filters
                .insert("__acl_group".to_string(), FilterValue::Array(values));
        }

        request.filters.extend(acl_scalar_filters(claims));

        request
    }

    /// Resolve (and memoize) the routing strategy for a tenant. Never fails:
    /// a directory miss returns the safe shared-index default.
    pub fn routing(&self, tenant_id: &TenantId) -> RoutingStrategy {
        if let Some(existing) = self.routing_memo.get(tenant_id) {
            return existing.clone();
        }
        let strategy = self.directory.strategy_for(tenant_id);
        self.routing_memo.entry(tenant_id.clone()).or_insert_with(|| strategy.clone());
        strategy
    }
}

/// Role-derived ACL filters, merged into the request alongside `__acl_group`.
fn acl_scalar_filters(claims: &Claims) -> BTreeMap<String, FilterValue> {
    let mut map = BTreeMap::new();
    if !claims.roles.is_empty() {
        map.insert(
            "__acl_role".to_string(),
            FilterValue::Array(claims.roles.iter().map(|r| serde_json::Value::String(r.clone())).collect()),
        );
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn resolver() -> TenantResolver {
        TenantResolver::new(
            TenantConfig {
                dedicated_tenants: vec!["globex".to_string()],
                jwt_secret: None,
            },
            Arc::new(ConfiguredTenantDirectory::new(vec!["globex".to_string()])),
        )
    }

    #[test]
    fn missing_tenant_header_fails() {
        let headers = HeaderMap::new();
        assert!(matches!(resolver().resolve(&headers), Err(Error::MissingTenant)));
    }

    #[test]
    fn resolves_tenant_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_HEADER, HeaderValue::from_static("acme"));
        assert_eq!(resolver().resolve(&headers).unwrap(), "acme");
    }

    #[test]
    fn routing_defaults_to_shared_and_memoizes() {
        let r = resolver();
        let s1 = r.routing(&"acme".to_string());
        assert_eq!(s1.strategy, IndexStrategy::Shared);
        let s2 = r.routing(&"acme".to_string());
        assert_eq!(s1, s2);
    }

    #[test]
    fn routing_honors_dedicated_tenants() {
        let r = resolver();
        let s = r.routing(&"globex".to_string());
        assert_eq!(s.strategy, IndexStrategy::Dedicated);
    }

    #[test]
    fn authorization_injects_tenant_filter_and_overwrites_body_tenant() {
        let r = resolver();
        let mut req = SearchRequest::default();
        req.tenant_id = "attacker-supplied".to_string();
        let claims = Claims::default();
        let authorized = r.apply_authorization(req, &"acme".to_string(), &claims);
        assert_eq!(authorized.tenant_id, "acme");
        assert!(authorized.filters.contains_key("__tenant_id"));
    }

    #[test]
    fn authorization_injects_acl_role_filter_from_claims() {
        let r = resolver();
        let req = SearchRequest::default();
        let claims = Claims {
            sub: "user-1".to_string(),
            roles: vec!["support".to_string(), "billing".to_string()],
            groups: vec![],
            ..Claims::default()
        };
        let authorized = r.apply_authorization(req, &"acme".to_string(), &claims);
        match authorized.filters.get("__acl_role") {
            Some(FilterValue::Array(values)) => {
                assert_eq!(values, &vec![serde_json::Value::String("support".to_string()), serde_json::Value::String("billing".to_string())]);
            }
            other => panic!("expected __acl_role array filter, got {other:?}"),
        }
    }

    #[test]
    fn authorization_omits_acl_role_filter_when_claims_have_no_roles() {
        let r = resolver();
        let req = SearchRequest::default();
        let claims = Claims::default();
        let authorized = r.apply_authorization(req, &"acme".to_string(), &claims);
        assert!(!authorized.filters.contains_key("__acl_role"));
    }
}
