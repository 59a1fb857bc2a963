//! Type definitions for health status, alerts, and monitoring events

use crate::audit::AuditReport;
use crate::logger::{LogReport, LoggerMetrics};
use crate::metrics::MetricsSnapshot;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Classified system health, re-evaluated each check cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// No thresholds breached
    Healthy,
    /// Resource pressure (memory or scheduler delay) over threshold
    Warning,
    /// Error rate over threshold; takes precedence over warning conditions
    Critical,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Warning => write!(f, "warning"),
            HealthStatus::Critical => write!(f, "critical"),
        }
    }
}

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertSeverity {
    /// Degraded but operating
    Warning,
    /// Requires attention
    Critical,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Warning => write!(f, "WARNING"),
            AlertSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// One raised alert with the metric snapshot that triggered it
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    /// Alert ID
    pub id: String,
    /// Severity at the time of the breach
    pub severity: AlertSeverity,
    /// Joined description of the triggering issues
    pub message: String,
    /// Raise time
    pub timestamp: DateTime<Utc>,
    /// Metrics snapshot captured when the alert fired
    pub metrics: serde_json::Value,
}

/// Lifecycle events published by the monitoring coordinator
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// Health status transitioned; fires once per transition
    HealthChanged {
        /// Status before the check cycle
        previous: HealthStatus,
        /// Status after the check cycle
        current: HealthStatus,
        /// Threshold breaches observed this cycle
        issues: Vec<String>,
    },
    /// An alert was appended; fires every cycle with a non-empty issue list
    AlertRaised(Alert),
}

/// Aggregated point-in-time view of the whole pipeline
#[derive(Debug, Clone, Serialize)]
pub struct SystemReport {
    /// Report generation time
    pub generated_at: DateTime<Utc>,
    /// Milliseconds since the coordinator was created
    pub uptime_ms: u64,
    /// Current classified health
    pub health: HealthStatus,
    /// Logger report with scored health assessment
    pub logger: LogReport,
    /// Metrics snapshot with histogram statistics
    pub metrics: MetricsSnapshot,
    /// Audit buffer summary and risk assessment
    pub audit: AuditReport,
    /// Alerts raised since the last clear
    pub alert_count: usize,
}

/// Lightweight metrics view for dashboards and health endpoints
#[derive(Debug, Clone, Serialize)]
pub struct CurrentMetrics {
    /// Current classified health
    pub health: HealthStatus,
    /// Metrics snapshot
    pub metrics: MetricsSnapshot,
    /// Logger counters
    pub logger: LoggerMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_display() {
        assert_eq!(HealthStatus::Healthy.to_string(), "healthy");
        assert_eq!(HealthStatus::Warning.to_string(), "warning");
        assert_eq!(HealthStatus::Critical.to_string(), "critical");
    }

    #[test]
    fn test_alert_severity_display() {
        assert_eq!(AlertSeverity::Warning.to_string(), "WARNING");
        assert_eq!(AlertSeverity::Critical.to_string(), "CRITICAL");
    }

    #[test]
    fn test_health_status_serializes_lowercase() {
        let json = serde_json::to_string(&HealthStatus::Critical).unwrap();
        assert_eq!(json, r#""critical""#);
    }
}
