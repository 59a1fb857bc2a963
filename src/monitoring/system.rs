//! Monitoring coordinator
//!
//! Owns the logger, the metrics registry, and the audit tracker, runs the
//! periodic sampling and health-check cycles, and classifies overall health.
//! Components are injected everywhere they are consumed; the process-wide
//! handle in [`init_global`] is an opt-in convenience, not a requirement.

use super::types::{Alert, AlertSeverity, CurrentMetrics, HealthStatus, MonitorEvent, SystemReport};
use crate::audit::{AuditContext, AuditTracker};
use crate::config::ObservabilityConfig;
use crate::error::Result;
use crate::events::EventBus;
use crate::fields::Fields;
use crate::logger::Logger;
use crate::metrics::MetricsRegistry;
use crate::sanitize;
use chrono::Utc;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use uuid::Uuid;

/// Alerts retained in memory before the oldest are evicted
pub const MAX_ALERT_HISTORY: usize = 100;

/// Default page size for [`MonitoringSystem::alerts`]
pub const DEFAULT_ALERT_LIMIT: usize = 50;

/// Histogram series fed by the scheduler delay probe
pub(super) const SCHEDULER_DELAY_METRIC: &str = "scheduler_delay";

static GLOBAL: OnceCell<MonitoringSystem> = OnceCell::new();

/// Coordinator over the logger, metrics registry, and audit tracker
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct MonitoringSystem {
    pub(super) config: Arc<ObservabilityConfig>,
    pub(super) logger: Logger,
    pub(super) metrics: Arc<MetricsRegistry>,
    pub(super) audit: AuditTracker,
    pub(super) health: Arc<RwLock<HealthStatus>>,
    pub(super) alerts: Arc<RwLock<VecDeque<Alert>>>,
    pub(super) events: Arc<EventBus<MonitorEvent>>,
    pub(super) active: Arc<AtomicBool>,
    pub(super) started: Instant,
}

impl MonitoringSystem {
    /// Build a coordinator from a validated configuration
    ///
    /// Creates the log directory (degrading the logger to console-only on
    /// failure) but starts no background tasks; call [`start`](Self::start)
    /// for those.
    pub async fn new(config: ObservabilityConfig) -> Result<Self> {
        config.validate()?;

        let logger = Logger::new(config.logger.clone()).await?;
        let audit = AuditTracker::new(config.audit.clone(), logger.clone())?;
        let events = Arc::new(EventBus::new(config.metrics.event_channel_capacity));

        Ok(Self {
            config: Arc::new(config),
            logger,
            metrics: Arc::new(MetricsRegistry::new()),
            audit,
            health: Arc::new(RwLock::new(HealthStatus::Healthy)),
            alerts: Arc::new(RwLock::new(VecDeque::new())),
            events,
            active: Arc::new(AtomicBool::new(false)),
            started: Instant::now(),
        })
    }

    /// Start the periodic sampling, health-check, flush, and cleanup tasks
    ///
    /// Idempotent; a second call while running is a no-op.
    pub fn start(&self) {
        if self.active.swap(true, Ordering::AcqRel) {
            return;
        }
        self.logger.start();
        self.audit.start();
        self.spawn_background_tasks();
        self.logger.info(
            "monitoring started",
            crate::fields! {
                "sample_interval_secs" => self.config.metrics.sample_interval_secs,
                "check_interval_secs" => self.config.health.check_interval_secs,
            },
        );
    }

    /// Whether background tasks should keep running
    pub(super) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// The shared logger
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// The shared metrics registry
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// The shared audit tracker
    pub fn audit_tracker(&self) -> &AuditTracker {
        &self.audit
    }

    /// Current classified health without running a check cycle
    pub fn health(&self) -> HealthStatus {
        *self.health.read()
    }

    /// Milliseconds since the coordinator was created
    pub fn uptime_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Subscribe to health transitions and raised alerts
    pub fn subscribe(&self) -> tokio::sync::mpsc::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    /// Record an audit event through the shared tracker
    pub fn audit(&self, action: &str, details: Fields, context: AuditContext) {
        self.audit.audit(action, details, context);
    }

    /// Begin timing a named operation
    ///
    /// Increments `operations_started`, logs the start with the caller's
    /// context, and returns a timer id to hand back to
    /// [`end_operation`](Self::end_operation).
    pub fn start_operation(&self, name: &str, context: Fields) -> String {
        self.metrics
            .increment("operations_started", 1, &[("operation", name)]);
        let id = self.metrics.start_timer(name, &[("operation", name)]);
        self.logger
            .debug(&format!("operation {name} started"), context);
        id
    }

    /// Finish a timed operation and return the elapsed milliseconds
    ///
    /// Records completion counters, the duration histogram, and a
    /// performance log entry whose result payload has long strings
    /// summarized away. An id that matches no running timer records
    /// nothing and returns 0.
    pub fn end_operation(&self, id: &str, success: bool, result: Fields) -> u64 {
        let Some(elapsed_ms) = self.metrics.try_stop_timer(id) else {
            self.logger.warn(
                "end_operation called with unknown operation id",
                crate::fields! { "id" => id },
            );
            return 0;
        };
        let name = operation_name(id);

        self.metrics.increment(
            "operations_completed",
            1,
            &[
                ("operation", name),
                ("success", if success { "true" } else { "false" }),
            ],
        );
        if !success {
            self.metrics
                .increment("operations_failed", 1, &[("operation", name)]);
        }

        let mut details = sanitize::summarize(&result, sanitize::MAX_RESULT_STRING_LEN);
        details.insert("operation".to_string(), name.into());
        details.insert("success".to_string(), success.into());
        self.logger
            .performance(&format!("operation {name} finished"), elapsed_ms, details);

        elapsed_ms
    }

    /// Run one health check cycle and return the resulting status
    ///
    /// Error rate over threshold is critical and takes precedence; memory
    /// pressure or scheduler delay over threshold is a warning. A
    /// [`MonitorEvent::HealthChanged`] is published only on transition,
    /// while an alert is raised on every cycle with at least one issue.
    pub fn check_health(&self) -> HealthStatus {
        let thresholds = &self.config.health;
        let logger_metrics = self.logger.metrics();
        let snapshot = self.metrics.snapshot();

        let mut issues = Vec::new();
        let mut critical = false;

        let error_rate = logger_metrics.error_rate();
        if error_rate > thresholds.error_rate_threshold {
            critical = true;
            issues.push(format!(
                "error rate {:.1}% exceeds {:.1}%",
                error_rate * 100.0,
                thresholds.error_rate_threshold * 100.0
            ));
        }

        // Process memory against host capacity, from the latest sampled
        // gauges; no gauges recorded yet means no memory signal.
        let memory_ratio = match (
            snapshot.gauge("process_rss_bytes"),
            snapshot.gauge("memory_total_bytes"),
        ) {
            (Some(rss), Some(total)) if total > 0.0 => rss / total,
            _ => 0.0,
        };
        if memory_ratio > thresholds.memory_ratio_threshold {
            issues.push(format!(
                "process memory {:.1}% of system exceeds {:.1}%",
                memory_ratio * 100.0,
                thresholds.memory_ratio_threshold * 100.0
            ));
        }

        if let Some(delay) = snapshot.histogram(SCHEDULER_DELAY_METRIC) {
            if delay.p95 > thresholds.scheduler_delay_ms_threshold {
                issues.push(format!(
                    "scheduler delay p95 {:.1}ms exceeds {:.1}ms",
                    delay.p95, thresholds.scheduler_delay_ms_threshold
                ));
            }
        }

        let current = if critical {
            HealthStatus::Critical
        } else if issues.is_empty() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Warning
        };

        let previous = {
            let mut health = self.health.write();
            std::mem::replace(&mut *health, current)
        };

        if previous != current {
            self.logger.info(
                "health status changed",
                crate::fields! {
                    "previous" => previous.to_string(),
                    "current" => current.to_string(),
                    "issues" => issues.join("; "),
                },
            );
            self.events.publish(&MonitorEvent::HealthChanged {
                previous,
                current,
                issues: issues.clone(),
            });
        }

        if !issues.is_empty() {
            self.raise_alert(current, &issues, &snapshot);
        }

        current
    }

    fn raise_alert(
        &self,
        status: HealthStatus,
        issues: &[String],
        snapshot: &crate::metrics::MetricsSnapshot,
    ) {
        let severity = if status == HealthStatus::Critical {
            AlertSeverity::Critical
        } else {
            AlertSeverity::Warning
        };
        let alert = Alert {
            id: Uuid::new_v4().to_string(),
            severity,
            message: issues.join("; "),
            timestamp: Utc::now(),
            metrics: serde_json::to_value(snapshot).unwrap_or(serde_json::Value::Null),
        };

        {
            let mut alerts = self.alerts.write();
            if alerts.len() >= MAX_ALERT_HISTORY {
                alerts.pop_front();
            }
            alerts.push_back(alert.clone());
        }

        let details = crate::fields! {
            "alert_id" => alert.id.clone(),
            "severity" => severity.to_string(),
            "issues" => alert.message.clone(),
        };
        match severity {
            AlertSeverity::Critical => self.logger.error("health alert raised", details),
            AlertSeverity::Warning => self.logger.warn("health alert raised", details),
        }

        self.events.publish(&MonitorEvent::AlertRaised(alert));
    }

    /// Most recent alerts, newest first, up to `limit` (default 50)
    pub fn alerts(&self, limit: Option<usize>) -> Vec<Alert> {
        let limit = limit.unwrap_or(DEFAULT_ALERT_LIMIT);
        self.alerts
            .read()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Drop the retained alert history
    pub fn clear_alerts(&self) {
        self.alerts.write().clear();
    }

    /// Aggregated report across all components
    pub fn report(&self) -> SystemReport {
        SystemReport {
            generated_at: Utc::now(),
            uptime_ms: self.uptime_ms(),
            health: self.health(),
            logger: self.logger.report(),
            metrics: self.metrics.snapshot(),
            audit: self.audit.report(),
            alert_count: self.alerts.read().len(),
        }
    }

    /// Lightweight view for dashboards and health endpoints
    pub fn current_metrics(&self) -> CurrentMetrics {
        CurrentMetrics {
            health: self.health(),
            metrics: self.metrics.snapshot(),
            logger: self.logger.metrics(),
        }
    }

    /// Stop background tasks and drain buffered state in order
    ///
    /// Flushes the audit buffer first, then waits for the log queue to
    /// drain. Idempotent.
    pub async fn stop(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        self.logger.info(
            "monitoring stopping",
            crate::fields! { "uptime_ms" => self.uptime_ms() },
        );
        self.audit.stop().await;
        self.logger.close().await;
        self.events.clear();
    }
}

/// Recover the operation name from a timer id of the form
/// `<name>_<millis>_<nonce>`; names may themselves contain underscores
fn operation_name(id: &str) -> &str {
    let mut it = id.rsplitn(3, '_');
    it.next();
    it.next();
    it.next().unwrap_or(id)
}

/// Install a process-wide coordinator, for callers that cannot thread a
/// handle through; fails if one is already installed
pub fn init_global(system: MonitoringSystem) -> Result<()> {
    GLOBAL.set(system).map_err(|_| {
        crate::error::MonitorError::Config("global monitoring already initialized".to_string())
    })
}

/// The process-wide coordinator, if one was installed
pub fn global() -> Option<&'static MonitoringSystem> {
    GLOBAL.get()
}
