//! Configuration for the search gateway: typed, defaulted, loaded from
//! YAML/TOML with a fixed discovery path.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod loader;
pub mod validation;

pub use loader::ConfigLoader;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub engines: EnginesConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub tenants: TenantsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_l1_max_entries")]
    pub l1_max_entries: usize,
    #[serde(default = "default_l1_ttl_ms")]
    pub l1_default_ttl_ms: u64,
    #[serde(default)]
    pub l2_enabled: bool,
    #[serde(default)]
    pub l2_endpoint: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            l1_max_entries: default_l1_max_entries(),
            l1_default_ttl_ms: default_l1_ttl_ms(),
            l2_enabled: false,
            l2_endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_simple_threshold")]
    pub simple_threshold: f64,
    #[serde(default = "default_complex_threshold")]
    pub complex_threshold: f64,
    #[serde(default = "default_long_query_chars")]
    pub long_query_chars: usize,
    #[serde(default = "default_large_page_size")]
    pub large_page_size: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            simple_threshold: default_simple_threshold(),
            complex_threshold: default_complex_threshold(),
            long_query_chars: default_long_query_chars(),
            large_page_size: default_large_page_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
    #[serde(default = "default_min_timeout_ms")]
    pub min_timeout_ms: u64,
    #[serde(default = "default_max_timeout_ms")]
    pub max_timeout_ms: u64,
    #[serde(default = "default_overfetch_factor")]
    pub hybrid_overfetch_factor: u32,
    #[serde(default = "default_fallback_timeout_ms")]
    pub fallback_timeout_ms: u64,
    #[serde(default = "default_hybrid_filter_fields")]
    pub hybrid_filter_fields: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            default_timeout_ms: default_timeout_ms(),
            min_timeout_ms: default_min_timeout_ms(),
            max_timeout_ms: default_max_timeout_ms(),
            hybrid_overfetch_factor: default_overfetch_factor(),
            fallback_timeout_ms: default_fallback_timeout_ms(),
            hybrid_filter_fields: default_hybrid_filter_fields(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineClientConfig {
    pub endpoint: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for EngineClientConfig {
    fn default() -> Self {
        EngineClientConfig {
            endpoint: "http://localhost:9200".to_string(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnginesConfig {
    #[serde(default)]
    pub simple: EngineClientConfig,
    #[serde(default)]
    pub complex: EngineClientConfig,
    #[serde(default = "default_highlight_fragment_size")]
    pub highlight_fragment_size: u32,
    #[serde(default = "default_highlight_fragment_count")]
    pub highlight_fragment_count: u32,
    #[serde(default)]
    pub facet_fields: Vec<String>,
}

impl Default for EnginesConfig {
    fn default() -> Self {
        EnginesConfig {
            simple: EngineClientConfig::default(),
            complex: EngineClientConfig::default(),
            highlight_fragment_size: default_highlight_fragment_size(),
            highlight_fragment_count: default_highlight_fragment_count(),
            facet_fields: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthConfig {
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        HealthConfig {
            probe_interval_ms: default_probe_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TenantsConfig {
    #[serde(default)]
    pub dedicated: Vec<String>,
    #[serde(default)]
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_l1_max_entries() -> usize {
    10_000
}
fn default_l1_ttl_ms() -> u64 {
    300_000
}
fn default_simple_threshold() -> f64 {
    3.0
}
fn default_complex_threshold() -> f64 {
    8.0
}
fn default_long_query_chars() -> usize {
    80
}
fn default_large_page_size() -> u32 {
    100
}
fn default_timeout_ms() -> u64 {
    700
}
fn default_min_timeout_ms() -> u64 {
    50
}
fn default_max_timeout_ms() -> u64 {
    2000
}
fn default_overfetch_factor() -> u32 {
    3
}
fn default_fallback_timeout_ms() -> u64 {
    200
}
fn default_hybrid_filter_fields() -> Vec<String> {
    vec!["entity".to_string(), "status".to_string()]
}
fn default_connect_timeout_ms() -> u64 {
    2_000
}
fn default_request_timeout_ms() -> u64 {
    5_000
}
fn default_highlight_fragment_size() -> u32 {
    150
}
fn default_highlight_fragment_count() -> u32 {
    3
}
fn default_probe_interval_ms() -> u64 {
    10_000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file: {e}")))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("yaml");

        match extension {
            "yaml" | "yml" => {
                serde_yaml::from_str(&content).map_err(|e| Error::Config(format!("failed to parse YAML: {e}")))
            }
            "toml" => toml::from_str(&content).map_err(|e| Error::Config(format!("failed to parse TOML: {e}"))),
            _ => Err(Error::Config(format!("unsupported config format: {extension}"))),
        }
    }

    pub fn discover_and_load() -> Result<Self> {
        let mut search_paths = vec![PathBuf::from("search-gateway.yaml"), PathBuf::from("search-gateway.toml")];

        if let Some(home) = dirs::home_dir() {
            search_paths.push(home.join(".search-gateway/config.yaml"));
        }

        search_paths.push(PathBuf::from("/etc/search-gateway/config.yaml"));

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn validate_file(path: &Path) -> Result<()> {
        let config = Self::from_file(path)?;
        config.validate()
    }
}
