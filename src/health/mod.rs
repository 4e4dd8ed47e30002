//! Background adapter health probing and aggregation to
//! `{healthy, degraded, unhealthy}`.

use crate::engines::SearchEngine;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

pub struct HealthSnapshot {
    pub status: AggregateStatus,
    pub simple: bool,
    pub complex: bool,
}

struct AdapterHealth {
    healthy: AtomicBool,
}

impl Default for AdapterHealth {
    fn default() -> Self {
        AdapterHealth {
            healthy: AtomicBool::new(true),
        }
    }
}

pub struct HealthMonitor {
    simple: Arc<AdapterHealth>,
    complex: Arc<AdapterHealth>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        HealthMonitor {
            simple: Arc::new(AdapterHealth::default()),
            complex: Arc::new(AdapterHealth::default()),
        }
    }

    /// Spawn the background probe loop. Returns immediately; the loop runs
    /// for the lifetime of the process.
    pub fn spawn_probes(
        &self,
        simple_engine: Arc<dyn SearchEngine>,
        complex_engine: Arc<dyn SearchEngine>,
        interval: Duration,
    ) {
        let simple_state = self.simple.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let healthy = simple_engine.health().await;
                if simple_state.healthy.swap(healthy, Ordering::Relaxed) != healthy {
                    if healthy {
                        info!(adapter = "simple", "adapter recovered");
                    } else {
                        warn!(adapter = "simple", "adapter probe failed");
                    }
                }
            }
        });

        let complex_state = self.complex.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let healthy = complex_engine.health().await;
                if complex_state.healthy.swap(healthy, Ordering::Relaxed) != healthy {
                    if healthy {
                        info!(adapter = "complex", "adapter recovered");
                    } else {
                        warn!(adapter = "complex", "adapter probe failed");
                    }
                }
            }
        });
    }

    pub async fn snapshot(&self) -> HealthSnapshot {
        let simple = self.simple.healthy.load(Ordering::Relaxed);
        let complex = self.complex.healthy.load(Ordering::Relaxed);
        let status = match (simple, complex) {
            (true, true) => AggregateStatus::Healthy,
            (false, false) => AggregateStatus::Unhealthy,
            _ => AggregateStatus::Degraded,
        };
        HealthSnapshot { status, simple, complex }
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn both_healthy_aggregates_healthy() {
        let monitor = HealthMonitor::new();
        let snapshot = monitor.snapshot().await;
        assert_eq!(snapshot.status, AggregateStatus::Healthy);
    }

    #[tokio::test]
    async fn one_unhealthy_aggregates_degraded_not_unhealthy() {
        let monitor = HealthMonitor::new();
        monitor.simple.healthy.store(false, Ordering::Relaxed);
        let snapshot = monitor.snapshot().await;
        assert_eq!(snapshot.status, AggregateStatus::Degraded);
    }

    #[tokio::test]
    async fn both_unhealthy_aggregates_unhealthy() {
        let monitor = HealthMonitor::new();
        monitor.simple.healthy.store(false, Ordering::Relaxed);
        monitor.complex.healthy.store(false, Ordering::Relaxed);
        let snapshot = monitor.snapshot().await;
        assert_eq!(snapshot.status, AggregateStatus::Unhealthy);
    }
}
