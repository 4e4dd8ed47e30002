//! Deterministic request fingerprinting.
//!
//! Canonicalizes the cache-relevant subset of a request and hashes it with a
//! fixed 128-bit non-cryptographic hash, namespaced by tenant. `options`
//! fields that do not affect the result set (`timeout_ms`, `strict`) are
//! excluded so that changing them does not invalidate the cache.

use crate::types::{PageDescriptor, SearchRequest, SortKey};
use serde::Serialize;
use serde_json::Value;
use xxhash_rust::xxh3::xxh3_128;

#[derive(Serialize)]
struct Canonical<'a> {
    q: &'a Option<String>,
    filters: &'a std::collections::BTreeMap<String, crate::types::FilterValue>,
    sort: &'a Vec<SortKey>,
    projection: &'a Option<Vec<String>>,
    page: &'a PageDescriptor,
}

/// Compute the canonical, tenant-scoped fingerprint for a search request.
/// `namespace` is `"search"` or `"suggest"`.
pub fn fingerprint(namespace: &str, tenant_id: &str, request: &SearchRequest) -> String {
    let canonical = Canonical {
        q: &request.q,
        filters: &request.filters,
        sort: &request.sort,
        projection: &request.projection,
        page: &request.page,
    };

    // serde_json's default `Map` (no `preserve_order` feature) is a
    // `BTreeMap`, so this serialization already orders object keys by
    // code point — no extra canonicalization pass is needed.
    let value: Value = serde_json::to_value(&canonical).unwrap_or(Value::Null);
    let bytes = serde_json::to_vec(&value).unwrap_or_default();
    let digest = xxh3_128(&bytes);

    format!("{namespace}:{tenant_id}:{digest:032x}")
}

pub fn search_key(tenant_id: &str, request: &SearchRequest) -> String {
    fingerprint("search", tenant_id, request)
}

pub fn suggest_key(tenant_id: &str, prefix: &str, entity: &[String], limit: u32) -> String {
    let value = serde_json::json!({
        "prefix": prefix,
        "entity": entity,
        "limit": limit,
    });
    let bytes = serde_json::to_vec(&value).unwrap_or_default();
    let digest = xxh3_128(&bytes);
    format!("suggest:{tenant_id}:{digest:032x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FilterValue, PageDescriptor, RequestOptions};
    use std::collections::BTreeMap;

    fn req(filters: BTreeMap<String, FilterValue>) -> SearchRequest {
        SearchRequest {
            q: Some("laptop".to_string()),
            filters,
            sort: vec![],
            projection: None,
            page: PageDescriptor {
                size: Some(10),
                cursor: None,
            },
            options: RequestOptions::default(),
            tenant_id: "acme".to_string(),
        }
    }

    #[test]
    fn stable_under_key_reordering() {
        let mut a = BTreeMap::new();
        a.insert("brand".to_string(), FilterValue::Scalar("x".into()));
        a.insert("color".to_string(), FilterValue::Scalar("y".into()));

        let mut b = BTreeMap::new();
        b.insert("color".to_string(), FilterValue::Scalar("y".into()));
        b.insert("brand".to_string(), FilterValue::Scalar("x".into()));

        assert_eq!(search_key("acme", &req(a)), search_key("acme", &req(b)));
    }

    #[test]
    fn invariant_under_timeout_and_strict() {
        let mut r1 = req(BTreeMap::new());
        let mut r2 = req(BTreeMap::new());
        r1.options.timeout_ms = Some(200);
        r2.options.timeout_ms = Some(900);
        r1.options.strict = true;
        r2.options.strict = false;

        assert_eq!(search_key("acme", &r1), search_key("acme", &r2));
    }

    #[test]
    fn differs_across_tenants() {
        let r = req(BTreeMap::new());
        assert_ne!(search_key("acme", &r), search_key("globex", &r));
    }

    #[test]
    fn tenant_prefix_present() {
        let r = req(BTreeMap::new());
        let key = search_key("acme", &r);
        assert!(key.starts_with("search:acme:"));
    }
}
