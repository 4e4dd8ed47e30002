//! Integration coverage for the hybrid plan's complex-engine overfetch and
//! simple-engine intersection, driven through the real axum router.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use search_gateway::config::Config;
use search_gateway::server::GatewayServer;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn hit(id: &str) -> Value {
    json!({"id": id, "source": {}, "score": null, "highlight": null})
}

fn complex_search_response() -> Value {
    json!({
        "hits": [hit("h1"), hit("h2"), hit("h3"), hit("h4")],
        "total": {"value": 4, "relation": "eq"},
        "page": {"size": 30, "cursor": null, "has_more": false},
        "performance": {"took_ms": 2, "engine": "complex", "cached": false, "partial": false}
    })
}

fn simple_filter_response() -> Value {
    json!({
        "hits": [hit("h3"), hit("h1")],
        "total": {"value": 0, "relation": "eq"},
        "page": {"size": 10, "cursor": null, "has_more": false},
        "performance": {"took_ms": 1, "engine": "simple", "cached": false, "partial": false}
    })
}

async fn router(simple: &MockServer, complex: &MockServer) -> axum::Router {
    let mut config = Config::default();
    config.engines.simple.endpoint = simple.uri();
    config.engines.complex.endpoint = complex.uri();
    config.server.port = 0;
    let server = GatewayServer::new(config).await.expect("server builds");
    server.router()
}

#[tokio::test]
async fn hybrid_plan_overfetches_complex_and_intersects_with_simple() {
    let simple = MockServer::start().await;
    let complex = MockServer::start().await;

    // Default page size is 10 and hybrid_overfetch_factor defaults to 3, so
    // the complex engine must be asked for 30 results, not 10.
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({"page": {"size": 30}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(complex_search_response()))
        .mount(&complex)
        .await;

    Mock::given(method("POST"))
        .and(path("/filter_by_ids"))
        .respond_with(ResponseTemplate::new(200).set_body_json(simple_filter_response()))
        .mount(&simple)
        .await;

    let app = router(&simple, &complex).await;

    let request = Request::builder()
        .method("POST")
        .uri("/search")
        .header("content-type", "application/json")
        .header("x-tenant-id", "acme")
        .body(Body::from(json!({"q": "wireless mouse", "filters": {"entity": "product"}}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["performance"]["engine"], "hybrid");

    // Order follows the complex engine's result order, not the simple
    // engine's, and the full intersection count, not the page-capped hit
    // count, is reported in `total`.
    let ids: Vec<&str> = body["hits"].as_array().unwrap().iter().map(|h| h["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["h1", "h3"]);
    assert_eq!(body["total"]["value"], 2);
    assert_eq!(body["total"]["relation"], "gte");
}

#[tokio::test]
async fn hybrid_plan_skips_intersection_when_no_triggering_filter_present() {
    let simple = MockServer::start().await;
    let complex = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(complex_search_response()))
        .mount(&complex)
        .await;

    // No mock mounted for /filter_by_ids on `simple`: if the dispatcher
    // called it anyway, wiremock would return its default 404 and the
    // handler would surface an engine error instead of 200.
    let app = router(&simple, &complex).await;

    let request = Request::builder()
        .method("POST")
        .uri("/search")
        .header("content-type", "application/json")
        .header("x-tenant-id", "acme")
        .body(Body::from(json!({"q": "wireless mouse", "filters": {"brand": "logitech"}}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["performance"]["engine"], "complex");
}
