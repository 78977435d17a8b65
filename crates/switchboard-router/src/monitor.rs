//! Health monitor: periodic probe cycles against every provider.
//!
//! Drives [`Router::refresh_health`] on a fixed interval until
//! [`HealthMonitor::stop`] is called. An optional callback sees the
//! snapshot after each cycle (the CLI `watch` command prints it).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::health::HealthSnapshot;
use crate::router::Router;

/// Callback invoked with the fresh snapshot after each probe cycle.
pub type OnCycleFn = Arc<dyn Fn(&HealthSnapshot) + Send + Sync>;

pub struct HealthMonitor {
    router: Router,
    interval: Duration,
    on_cycle: Option<OnCycleFn>,
    shutdown: Arc<Notify>,
}

impl HealthMonitor {
    pub fn new(router: Router, interval: Duration) -> Self {
        Self {
            router,
            interval,
            on_cycle: None,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Interval taken from the router settings.
    pub fn from_secs(router: Router, interval_secs: u64) -> Self {
        Self::new(router, Duration::from_secs(interval_secs.max(1)))
    }

    pub fn with_on_cycle(mut self, callback: OnCycleFn) -> Self {
        self.on_cycle = Some(callback);
        self
    }

    /// Run probe cycles until `stop()` is called.
    pub async fn start(&self) -> anyhow::Result<()> {
        info!(interval_s = self.interval.as_secs(), "health monitor started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    self.cycle().await;
                }
                _ = self.shutdown.notified() => {
                    info!("health monitor shutting down");
                    return Ok(());
                }
            }
        }
    }

    /// Stop the loop. A stop issued before `start()` is awaited still counts.
    pub fn stop(&self) {
        info!("stopping health monitor");
        self.shutdown.notify_one();
    }

    /// Run one probe cycle right away.
    pub async fn trigger_now(&self) -> HealthSnapshot {
        self.cycle().await
    }

    async fn cycle(&self) -> HealthSnapshot {
        let outcomes = self.router.refresh_health().await;
        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        if failed > 0 {
            warn!(failed, probed = outcomes.len(), "health check: some providers failing");
        } else {
            debug!(probed = outcomes.len(), "health check: all providers ok");
        }

        let snapshot = self.router.health_snapshot();
        if let Some(ref callback) = self.on_cycle {
            callback(&snapshot);
        }
        snapshot
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::RouterOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use switchboard_core::config::{ProvidersConfig, TransportConfig};
    use switchboard_providers::{ProviderCatalog, StaticSecrets, Transport};

    fn offline_router() -> Router {
        let catalog = ProviderCatalog::from_config(&ProvidersConfig::default(), &StaticSecrets::new());
        let transport = Transport::new(&TransportConfig::default()).unwrap();
        Router::new(catalog, transport, RouterOptions::default())
    }

    fn counting_callback() -> (OnCycleFn, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let callback: OnCycleFn = Arc::new(move |snapshot: &HealthSnapshot| {
            assert_eq!(snapshot.providers.len(), 4);
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (callback, count)
    }

    #[tokio::test]
    async fn test_trigger_now_invokes_callback() {
        let (callback, count) = counting_callback();
        let monitor = HealthMonitor::new(offline_router(), Duration::from_secs(60))
            .with_on_cycle(callback);

        let snapshot = monitor.trigger_now().await;
        assert_eq!(snapshot.providers.len(), 4);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_runs_cycles_until_stopped() {
        let (callback, count) = counting_callback();
        let monitor = Arc::new(
            HealthMonitor::new(offline_router(), Duration::from_millis(20)).with_on_cycle(callback),
        );

        let m = monitor.clone();
        let handle = tokio::spawn(async move { m.start().await });

        tokio::time::sleep(Duration::from_millis(150)).await;
        monitor.stop();

        let result = handle.await.unwrap();
        assert!(result.is_ok());
        assert!(count.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_stop_before_start_exits() {
        let monitor = HealthMonitor::new(offline_router(), Duration::from_secs(60));
        monitor.stop();
        let result = tokio::time::timeout(Duration::from_secs(1), monitor.start()).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[test]
    fn test_from_secs_floors_interval() {
        let monitor = HealthMonitor::from_secs(offline_router(), 0);
        assert_eq!(monitor.interval, Duration::from_secs(1));
    }
}
