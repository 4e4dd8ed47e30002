//! HTTP server assembly: shared application state, router, and graceful
//! shutdown, following the teacher's `ProxyServer`/`AppState` split.

use crate::cache::{CacheConfig, HttpSharedCache, NullSharedCache, ResponseCache, SharedCache};
use crate::classifier::ClassifierConfig;
use crate::config::{Config, ConfigLoader};
use crate::dispatcher::{DispatchConfig, Dispatcher};
use crate::engines::{ComplexEngine, ComplexEngineConfig, SearchEngine, SimpleEngine, SimpleEngineConfig};
use crate::error::{Error, Result};
use crate::health::HealthMonitor;
use crate::metrics::Metrics;
use crate::tenant::{ConfiguredTenantDirectory, TenantConfig, TenantDirectory, TenantResolver};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Shared application state passed to all handlers. Cheap to clone: every
/// field is an `Arc` or a small value type.
#[derive(Clone)]
pub struct AppState {
    pub tenant_resolver: Arc<TenantResolver>,
    pub cache: Arc<ResponseCache>,
    pub classifier_config: Arc<ClassifierConfig>,
    pub dispatch_config: Arc<DispatchConfig>,
    pub dispatcher: Arc<Dispatcher>,
    pub simple_engine: Arc<dyn SearchEngine>,
    pub complex_engine: Arc<dyn SearchEngine>,
    pub metrics: Arc<Metrics>,
    pub health: Arc<HealthMonitor>,
}

pub struct GatewayServer {
    config_loader: ConfigLoader,
    state: AppState,
    shutdown_tx: tokio::sync::broadcast::Sender<()>,
}

impl GatewayServer {
    pub async fn new(config: Config) -> Result<Self> {
        Self::new_with_config_path(config, None).await
    }

    /// Like `new`, but also records the file a config was loaded from (if
    /// any) on the `ConfigLoader` so it's available for diagnostics.
    pub async fn new_with_config_path(config: Config, config_path: Option<PathBuf>) -> Result<Self> {
        info!("initializing search gateway");

        let simple_engine: Arc<dyn SearchEngine> = Arc::new(SimpleEngine::new(SimpleEngineConfig {
            endpoint: config.engines.simple.endpoint.clone(),
            connect_timeout: Duration::from_millis(config.engines.simple.connect_timeout_ms),
            request_timeout: Duration::from_millis(config.engines.simple.request_timeout_ms),
        }));

        let complex_engine: Arc<dyn SearchEngine> = Arc::new(ComplexEngine::new(ComplexEngineConfig {
            endpoint: config.engines.complex.endpoint.clone(),
            connect_timeout: Duration::from_millis(config.engines.complex.connect_timeout_ms),
            request_timeout: Duration::from_millis(config.engines.complex.request_timeout_ms),
            highlight_fragment_size: config.engines.highlight_fragment_size,
            highlight_fragment_count: config.engines.highlight_fragment_count,
            facet_fields: config.engines.facet_fields.clone(),
        }));

        let l2: Arc<dyn SharedCache> = if config.cache.l2_enabled {
            let endpoint = config
                .cache
                .l2_endpoint
                .clone()
                .ok_or_else(|| Error::Config("cache.l2_enabled is true but cache.l2_endpoint is not set".to_string()))?;
            Arc::new(HttpSharedCache::new(endpoint, Duration::from_secs(2)))
        } else {
            Arc::new(NullSharedCache)
        };

        let cache = Arc::new(ResponseCache::new(
            CacheConfig {
                l1_max_entries: config.cache.l1_max_entries,
                l1_default_ttl_ms: config.cache.l1_default_ttl_ms,
                l2_enabled: config.cache.l2_enabled,
            },
            l2,
        ));

        let dispatch_config = DispatchConfig {
            default_timeout_ms: config.dispatch.default_timeout_ms,
            min_timeout_ms: config.dispatch.min_timeout_ms,
            max_timeout_ms: config.dispatch.max_timeout_ms,
            hybrid_overfetch_factor: config.dispatch.hybrid_overfetch_factor,
            fallback_timeout_ms: config.dispatch.fallback_timeout_ms,
            hybrid_filter_fields: config.dispatch.hybrid_filter_fields.clone(),
        };

        let dispatcher = Arc::new(Dispatcher::new(
            simple_engine.clone(),
            complex_engine.clone(),
            cache.clone(),
            dispatch_config.clone(),
        ));

        let directory: Arc<dyn TenantDirectory> =
            Arc::new(ConfiguredTenantDirectory::new(config.tenants.dedicated.clone()));
        let tenant_resolver = Arc::new(TenantResolver::new(
            TenantConfig {
                dedicated_tenants: config.tenants.dedicated.clone(),
                jwt_secret: config.tenants.jwt_secret.clone(),
            },
            directory,
        ));

        let classifier_config = Arc::new(ClassifierConfig {
            simple_threshold: config.classifier.simple_threshold,
            complex_threshold: config.classifier.complex_threshold,
            long_query_chars: config.classifier.long_query_chars,
            large_page_size: config.classifier.large_page_size,
            ..ClassifierConfig::default()
        });

        let health = Arc::new(HealthMonitor::new());
        health.spawn_probes(
            simple_engine.clone(),
            complex_engine.clone(),
            Duration::from_millis(config.health.probe_interval_ms),
        );

        let metrics = Arc::new(Metrics::new());

        let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);

        let state = AppState {
            tenant_resolver,
            cache,
            classifier_config,
            dispatch_config: Arc::new(dispatch_config),
            dispatcher,
            simple_engine,
            complex_engine,
            metrics,
            health,
        };

        let config_loader = ConfigLoader::new(config, config_path);

        Ok(GatewayServer {
            config_loader,
            state,
            shutdown_tx,
        })
    }

    /// Build the router without binding a listener, for tests that want to
    /// drive the gateway directly with `tower::ServiceExt::oneshot`.
    pub fn router(&self) -> Router {
        self.build_router()
    }

    fn build_router(&self) -> Router {
        Router::new()
            .route("/search", post(crate::handler::search))
            .route("/suggest", post(crate::handler::suggest))
            .route("/explain", post(crate::handler::explain))
            .route("/health", get(crate::handler::health))
            .route("/ready", get(crate::handler::ready))
            .route("/metrics", get(crate::handler::metrics))
            .layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn_with_state(self.state.clone(), crate::handler::record_errors))
                    .layer(CorsLayer::permissive())
                    .layer(CompressionLayer::new())
                    .layer(tower::timeout::TimeoutLayer::new(Duration::from_secs(30)))
                    .layer(TraceLayer::new_for_http()),
            )
            .with_state(self.state.clone())
    }

    pub async fn run(self) -> Result<()> {
        let router = self.build_router();
        let config = self.config_loader.get();

        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("invalid server address: {e}")))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Internal(format!("failed to bind {addr}: {e}")))?;

        info!(%addr, "search gateway listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = self.shutdown_tx.subscribe().recv().await;
                info!("shutting down search gateway");
            })
            .await
            .map_err(|e| Error::Internal(format!("server error: {e}")))?;

        Ok(())
    }
}
