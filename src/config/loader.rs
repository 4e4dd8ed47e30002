//! Lock-free config access via `ArcSwap`.
//!
//! The teacher's loader paired `arc-swap` with a `notify`-based file
//! watcher for hot-reload. This gateway loads configuration once at
//! startup (see `Config::discover_and_load`) and does not watch the
//! filesystem for changes, so only the `ArcSwap` half survives here;
//! reloading means restarting the process.

use crate::config::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub struct ConfigLoader {
    config: Arc<arc_swap::ArcSwap<Config>>,
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Self {
        if let Some(path) = &config_path {
            info!(path = %path.display(), "configuration loaded");
        } else {
            info!("configuration loaded from defaults");
        }
        ConfigLoader {
            config: Arc::new(arc_swap::ArcSwap::from_pointee(config)),
            config_path,
        }
    }

    pub fn get(&self) -> Arc<Config> {
        self.config.load_full()
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_loaded_config() {
        let loader = ConfigLoader::new(Config::default(), None);
        assert_eq!(loader.get().server.port, 8080);
    }
}
