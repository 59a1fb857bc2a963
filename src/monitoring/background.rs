//! Periodic sampling and health-check tasks
//!
//! Each task holds a clone of the coordinator and exits as soon as the
//! active flag drops, so `stop()` never has to join them.

use super::sampling;
use super::system::{MonitoringSystem, SCHEDULER_DELAY_METRIC};
use std::time::{Duration, Instant};

impl MonitoringSystem {
    pub(super) fn spawn_background_tasks(&self) {
        self.spawn_sampling_task();
        self.spawn_health_task();
    }

    fn spawn_sampling_task(&self) {
        let system = self.clone();
        let period = Duration::from_secs(system.config.metrics.sample_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !system.is_active() {
                    break;
                }
                system.sample_process_metrics();
            }
        });
    }

    fn spawn_health_task(&self) {
        let system = self.clone();
        let period = Duration::from_secs(system.config.health.check_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !system.is_active() {
                    break;
                }
                system.check_health();
            }
        });
    }

    /// Record one round of process gauges and probe the scheduler delay
    ///
    /// The delay probe measures how long a freshly spawned task waits
    /// before it runs, which tracks executor backlog.
    pub fn sample_process_metrics(&self) {
        let (used, total) = sampling::sample_memory();
        self.metrics.gauge("memory_used_bytes", used as f64, &[]);
        self.metrics.gauge("memory_total_bytes", total as f64, &[]);
        self.metrics
            .gauge("cpu_usage_percent", sampling::sample_cpu_usage(), &[]);
        self.metrics.gauge(
            "process_rss_bytes",
            sampling::sample_process_rss() as f64,
            &[],
        );
        self.metrics.gauge(
            "host_process_count",
            sampling::sample_process_count() as f64,
            &[],
        );

        let metrics = self.metrics.clone();
        let spawned = Instant::now();
        tokio::spawn(async move {
            let delay_ms = spawned.elapsed().as_secs_f64() * 1000.0;
            metrics.histogram(SCHEDULER_DELAY_METRIC, delay_ms, &[]);
        });
    }
}
