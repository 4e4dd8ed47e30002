//! Fingerprinting and classification benchmarks: the two pure-CPU stages
//! that run on every request before an engine is ever called.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use search_gateway::classifier::{self, ClassifierConfig};
use search_gateway::fingerprint;
use search_gateway::types::{FilterValue, PageDescriptor, RequestOptions, SearchRequest, SortDirection, SortKey};
use std::collections::BTreeMap;

fn simple_request() -> SearchRequest {
    SearchRequest {
        q: None,
        filters: BTreeMap::new(),
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

fn complex_request() -> SearchRequest {
    let mut filters = BTreeMap::new();
    filters.insert("brand".to_string(), FilterValue::Scalar("logitech".into()));
    filters.insert(
        "tags".to_string(),
        FilterValue::Array(vec!["wireless".into(), "ergonomic".into(), "bluetooth".into()]),
    );
    SearchRequest {
        q: Some("wireless ergonomic mouse \"quiet click\"".to_string()),
        filters,
        sort: vec![SortKey {
            field: "relevance".to_string(),
            direction: SortDirection::Desc,
        }],
        projection: Some(vec!["id".to_string(), "name".to_string()]),
        page: PageDescriptor {
            size: Some(25),
            cursor: None,
        },
        options: RequestOptions {
            highlight: true,
            suggest: false,
            timeout_ms: None,
            strict: false,
        },
        tenant_id: "acme".to_string(),
    }
}

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");
    let simple = simple_request();
    let complex = complex_request();

    group.bench_function("simple_request", |b| {
        b.iter(|| fingerprint::search_key(black_box("acme"), black_box(&simple)));
    });
    group.bench_function("complex_request", |b| {
        b.iter(|| fingerprint::search_key(black_box("acme"), black_box(&complex)));
    });
    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    let config = ClassifierConfig::default();
    let simple = simple_request();
    let complex = complex_request();

    group.bench_function("simple_request", |b| {
        b.iter(|| classifier::classify(black_box(&simple), black_box(&config)));
    });
    group.bench_function("complex_request", |b| {
        b.iter(|| classifier::classify(black_box(&complex), black_box(&config)));
    });
    group.finish();
}

criterion_group!(benches, bench_fingerprint, bench_classify);
criterion_main!(benches);
