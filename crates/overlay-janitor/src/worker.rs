//! Background worker for continuous Janitor operation

use crate::{Janitor, JanitorError, JanitorMetrics};
use crate::probe::HealthProbe;
use overlay_domain::RecordStore;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Background worker that runs Janitor sweeps on a schedule
///
/// Sweeps run one at a time on the worker's task; a sweep that outlasts the
/// interval delays the next tick rather than overlapping it.
///
/// # Examples
///
/// ```no_run
/// use overlay_janitor::{Janitor, JanitorConfig, JanitorWorker};
/// use overlay_store::SqliteRecordStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = SqliteRecordStore::new("overlay.db")?;
///     let config = JanitorConfig::default();
///     let interval = config.sweep_interval();
///     let janitor = Janitor::with_http_probe(store, config)?;
///
///     // Run until Ctrl+C
///     JanitorWorker::new(janitor, interval).run().await?;
///     Ok(())
/// }
/// ```
pub struct JanitorWorker<S, P> {
    janitor: Janitor<S, P>,
    interval: Duration,
    metrics: JanitorMetrics,
}

impl<S: RecordStore, P: HealthProbe> JanitorWorker<S, P> {
    /// Create a new background worker around a Janitor
    pub fn new(janitor: Janitor<S, P>, interval: Duration) -> Self {
        Self {
            janitor,
            interval,
            metrics: JanitorMetrics::new(),
        }
    }

    /// Create a worker using the Janitor's configured sweep interval
    pub fn from_config(janitor: Janitor<S, P>) -> Self {
        let interval = janitor.config().sweep_interval();
        Self::new(janitor, interval)
    }

    /// Run the worker until Ctrl+C
    ///
    /// The first sweep starts immediately. Failed sweeps are logged and retried
    /// on the next tick.
    pub async fn run(&mut self) -> Result<(), JanitorError> {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Janitor worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping janitor");
                    break;
                }
            }
        }

        tracing::info!("Janitor stopped. Final metrics:\n{}", self.metrics.summary());

        Ok(())
    }

    /// Run for a specific number of cycles
    ///
    /// Unlike [`run`](Self::run), a failed sweep stops the worker and is returned.
    pub async fn run_cycles(&mut self, cycles: usize) -> Result<(), JanitorError> {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Janitor worker started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;

            tracing::debug!("Starting sweep cycle {}/{}", cycle + 1, cycles);

            match self.janitor.run().await {
                Ok(report) => {
                    self.metrics.record(&report);
                    tracing::info!(
                        "Sweep {}/{} completed: {} evicted",
                        cycle + 1,
                        cycles,
                        report.total_evicted()
                    );
                }
                Err(e) => {
                    self.metrics.record_failure();
                    tracing::error!("Sweep {}/{} failed: {}", cycle + 1, cycles, e);
                    return Err(e);
                }
            }
        }

        tracing::info!(
            "Janitor finished {} cycles. Final metrics:\n{}",
            cycles,
            self.metrics.summary()
        );

        Ok(())
    }

    async fn sweep_once(&mut self) {
        tracing::debug!("Starting sweep cycle");

        match self.janitor.run().await {
            Ok(report) => {
                self.metrics.record(&report);
                tracing::info!("{}", report.summary());
            }
            Err(e) => {
                self.metrics.record_failure();
                tracing::error!("Sweep failed: {}", e);
            }
        }
    }

    /// Get the wrapped Janitor
    pub fn janitor(&self) -> &Janitor<S, P> {
        &self.janitor
    }

    /// Get the metrics accumulated so far
    pub fn metrics(&self) -> &JanitorMetrics {
        &self.metrics
    }

    /// Reset the metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeOutcome;
    use crate::JanitorConfig;
    use async_trait::async_trait;
    use overlay_domain::{Collection, PeerRecord};
    use overlay_store::MemoryRecordStore;
    use url::Url;

    struct AlwaysDown;

    #[async_trait]
    impl HealthProbe for AlwaysDown {
        async fn check(&self, _url: &Url) -> ProbeOutcome {
            ProbeOutcome::Unhealthy(crate::probe::ProbeFailure::HttpStatus(502))
        }
    }

    fn worker(store: MemoryRecordStore) -> JanitorWorker<MemoryRecordStore, AlwaysDown> {
        let janitor = Janitor::new(store, AlwaysDown, JanitorConfig::default()).unwrap();
        JanitorWorker::new(janitor, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_worker_creation() {
        let worker = worker(MemoryRecordStore::new());
        assert_eq!(worker.metrics().sweep_count, 0);
    }

    #[tokio::test]
    async fn test_from_config_uses_sweep_interval() {
        let config = JanitorConfig {
            sweep_interval_secs: 42,
            ..Default::default()
        };
        let janitor = Janitor::new(MemoryRecordStore::new(), AlwaysDown, config).unwrap();
        let worker = JanitorWorker::from_config(janitor);
        assert_eq!(worker.interval, Duration::from_secs(42));
    }

    #[tokio::test]
    async fn test_run_cycles_evicts_after_revoke_score() {
        let store = MemoryRecordStore::new();
        let record = PeerRecord::with_domain("", "gone.example.com");
        let id = store.insert(Collection::Ship, record);
        let mut worker = worker(store);

        worker.run_cycles(2).await.unwrap();
        let record = worker.janitor().store().get(Collection::Ship, &id);
        assert_eq!(record.map(|r| r.down), Some(2));

        worker.run_cycles(1).await.unwrap();
        let record = worker.janitor().store().get(Collection::Ship, &id);
        assert!(record.is_none());

        assert_eq!(worker.metrics().sweep_count, 3);
        assert_eq!(worker.metrics().incremented, 2);
        assert_eq!(worker.metrics().total_evicted(), 1);
    }

    #[tokio::test]
    async fn test_reset_metrics() {
        let mut worker = worker(MemoryRecordStore::new());

        worker.run_cycles(1).await.unwrap();
        assert_eq!(worker.metrics().sweep_count, 1);

        worker.reset_metrics();
        assert_eq!(worker.metrics().sweep_count, 0);
    }
}
