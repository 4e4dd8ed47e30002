//! Caching benchmarks: hit/miss rates and LRU eviction under the two-level
//! response cache.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use search_gateway::cache::{CacheConfig, NullSharedCache, ResponseCache};
use search_gateway::types::{Page, Performance, SearchResponse, Total, TotalRelation};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Runtime;

fn sample_response() -> SearchResponse {
    SearchResponse {
        hits: vec![],
        total: Total {
            value: 0,
            relation: TotalRelation::Eq,
        },
        page: Page {
            size: 10,
            cursor: None,
            has_more: false,
        },
        facets: None,
        performance: Performance {
            took_ms: 1,
            engine: "simple".to_string(),
            cached: false,
            partial: false,
        },
        debug: None,
    }
}

fn test_cache() -> ResponseCache {
    ResponseCache::new(CacheConfig::default(), Arc::new(NullSharedCache))
}

fn bench_cache_hit(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cache = test_cache();

    rt.block_on(async {
        for i in 0..100 {
            cache.set(&format!("search:acme:{i}"), sample_response(), 60_000).await;
        }
    });

    let mut group = c.benchmark_group("caching/hit");
    group.throughput(Throughput::Elements(1));
    group.bench_function("warm_cache", |b| {
        b.to_async(&rt).iter(|| async {
            let key = format!("search:acme:{}", black_box(42));
            let _ = cache.get(black_box(&key)).await;
        });
    });
    group.finish();
}

fn bench_cache_miss(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cache = test_cache();
    let counter = AtomicU64::new(0);

    let mut group = c.benchmark_group("caching/miss");
    group.throughput(Throughput::Elements(1));
    group.bench_function("cold_cache", |b| {
        b.to_async(&rt).iter(|| async {
            let count = counter.fetch_add(1, Ordering::Relaxed);
            let key = format!("search:acme:nonexistent-{count}");
            let _ = cache.get(black_box(&key)).await;
        });
    });
    group.finish();
}

fn bench_lru_eviction(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut config = CacheConfig::default();
    config.l1_max_entries = 50;
    let cache = ResponseCache::new(config, Arc::new(NullSharedCache));
    let counter = AtomicU64::new(0);

    let mut group = c.benchmark_group("caching/eviction");
    group.throughput(Throughput::Elements(1));
    group.bench_function("lru_eviction", |b| {
        b.to_async(&rt).iter(|| async {
            let count = counter.fetch_add(1, Ordering::Relaxed);
            let key = format!("search:acme:{count}");
            cache.set(black_box(&key), sample_response(), 60_000).await;
        });
    });
    group.finish();
}

fn bench_stats(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cache = test_cache();

    rt.block_on(async {
        for i in 0..50 {
            cache.set(&format!("search:acme:{i}"), sample_response(), 60_000).await;
        }
    });

    let mut group = c.benchmark_group("caching/stats");
    group.throughput(Throughput::Elements(1));
    group.bench_function("stats_retrieval", |b| {
        b.iter(|| {
            let _ = cache.stats();
        });
    });
    group.finish();
}

criterion_group!(benches, bench_cache_hit, bench_cache_miss, bench_lru_eviction, bench_stats);
criterion_main!(benches);
