//! Configuration validation logic

use crate::config::Config;
use crate::error::{Error, Result};

impl Config {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("server.port must be non-zero".to_string()));
        }

        if self.cache.l1_max_entries == 0 {
            return Err(Error::Config("cache.l1_max_entries must be non-zero".to_string()));
        }

        if self.cache.l2_enabled && self.cache.l2_endpoint.is_none() {
            return Err(Error::Config(
                "cache.l2_enabled is true but cache.l2_endpoint is not set".to_string(),
            ));
        }

        if self.classifier.simple_threshold >= self.classifier.complex_threshold {
            return Err(Error::Config(
                "classifier.simple_threshold must be less than classifier.complex_threshold".to_string(),
            ));
        }

        if self.dispatch.min_timeout_ms == 0 {
            return Err(Error::Config("dispatch.min_timeout_ms must be non-zero".to_string()));
        }

        if self.dispatch.min_timeout_ms > self.dispatch.max_timeout_ms {
            return Err(Error::Config(
                "dispatch.min_timeout_ms cannot be greater than dispatch.max_timeout_ms".to_string(),
            ));
        }

        if self.dispatch.default_timeout_ms == 0 {
            return Err(Error::Config("dispatch.default_timeout_ms must be non-zero".to_string()));
        }

        if self.dispatch.hybrid_overfetch_factor == 0 {
            return Err(Error::Config(
                "dispatch.hybrid_overfetch_factor must be non-zero".to_string(),
            ));
        }

        if self.engines.simple.endpoint.is_empty() {
            return Err(Error::Config("engines.simple.endpoint must not be empty".to_string()));
        }

        if self.engines.complex.endpoint.is_empty() {
            return Err(Error::Config("engines.complex.endpoint must not be empty".to_string()));
        }

        if self.health.probe_interval_ms == 0 {
            return Err(Error::Config("health.probe_interval_ms must be non-zero".to_string()));
        }

        if self.tenants.dedicated.is_empty() {
            tracing::warn!("no dedicated tenants configured; all tenants route to the shared index");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.observability.logging.level.as_str()) {
            return Err(Error::Config(format!(
                "invalid observability.logging.level: {}. Valid options: {:?}",
                self.observability.logging.level, valid_levels
            )));
        }

        let valid_formats = ["json", "pretty", "compact"];
        if !valid_formats.contains(&self.observability.logging.format.as_str()) {
            return Err(Error::Config(format!(
                "invalid observability.logging.format: {}. Valid options: {:?}",
                self.observability.logging.format, valid_formats
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn l2_enabled_without_endpoint_is_rejected() {
        let mut config = Config::default();
        config.cache.l2_enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_classifier_thresholds_are_rejected() {
        let mut config = Config::default();
        config.classifier.simple_threshold = 9.0;
        config.classifier.complex_threshold = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_timeout_bounds_are_rejected() {
        let mut config = Config::default();
        config.dispatch.min_timeout_ms = 5000;
        config.dispatch.max_timeout_ms = 100;
        assert!(config.validate().is_err());
    }
}
