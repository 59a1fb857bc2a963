//! Configuration for the observability pipeline
//!
//! Every recognized option is an explicit struct field with a documented
//! default; ranges are validated at construction time.

use crate::error::{MonitorError, Result};
use crate::logger::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObservabilityConfig {
    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerConfig,
    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Audit configuration
    #[serde(default)]
    pub audit: AuditConfig,
    /// Health check configuration
    #[serde(default)]
    pub health: HealthConfig,
}

impl ObservabilityConfig {
    /// Validate all sections
    pub fn validate(&self) -> Result<()> {
        self.logger.validate()?;
        self.metrics.validate()?;
        self.audit.validate()?;
        self.health.validate()?;
        Ok(())
    }
}

/// Logger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Minimum severity retained (entries less severe are dropped)
    #[serde(default)]
    pub level: LogLevel,
    /// Enable the console sink
    #[serde(default = "default_true")]
    pub console: bool,
    /// Enable the file sink
    #[serde(default = "default_true")]
    pub file: bool,
    /// Directory for rotated log files
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
    /// Filename prefix for rotated log files
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    /// Rotate once the current file exceeds this many bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Number of rotated files retained by cleanup
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Write JSON lines when true, human-readable lines when false
    #[serde(default = "default_true")]
    pub structured: bool,
    /// Seconds between retention cleanup passes
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            console: true,
            file: true,
            directory: default_log_directory(),
            file_prefix: default_file_prefix(),
            max_file_size: default_max_file_size(),
            max_files: default_max_files(),
            structured: true,
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

impl LoggerConfig {
    /// Validate option ranges
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size == 0 {
            return Err(MonitorError::Config(
                "logger.max_file_size must be positive".to_string(),
            ));
        }
        if self.max_files == 0 {
            return Err(MonitorError::Config(
                "logger.max_files must be at least 1".to_string(),
            ));
        }
        if self.file_prefix.is_empty() || self.file_prefix.contains(['/', '\\']) {
            return Err(MonitorError::Config(
                "logger.file_prefix must be a non-empty bare name".to_string(),
            ));
        }
        if self.cleanup_interval_secs == 0 {
            return Err(MonitorError::Config(
                "logger.cleanup_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between process metric sampling ticks
    #[serde(default = "default_sample_interval")]
    pub sample_interval_secs: u64,
    /// Capacity of each subscriber's event channel
    #[serde(default = "default_event_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: default_sample_interval(),
            event_channel_capacity: default_event_capacity(),
        }
    }
}

impl MetricsConfig {
    /// Validate option ranges
    pub fn validate(&self) -> Result<()> {
        if self.sample_interval_secs == 0 {
            return Err(MonitorError::Config(
                "metrics.sample_interval_secs must be positive".to_string(),
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err(MonitorError::Config(
                "metrics.event_channel_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Audit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Directory for persisted audit snapshots
    #[serde(default = "default_audit_directory")]
    pub directory: PathBuf,
    /// Buffer size that triggers a synchronous flush
    #[serde(default = "default_audit_buffer")]
    pub max_buffer_size: usize,
    /// Seconds between timer-driven flushes
    #[serde(default = "default_flush_interval")]
    pub flush_interval_secs: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            directory: default_audit_directory(),
            max_buffer_size: default_audit_buffer(),
            flush_interval_secs: default_flush_interval(),
        }
    }
}

impl AuditConfig {
    /// Validate option ranges
    pub fn validate(&self) -> Result<()> {
        if self.max_buffer_size == 0 {
            return Err(MonitorError::Config(
                "audit.max_buffer_size must be positive".to_string(),
            ));
        }
        if self.flush_interval_secs == 0 {
            return Err(MonitorError::Config(
                "audit.flush_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Health check thresholds and cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Seconds between health check cycles
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    /// Error rate (0..=1) above which the system is critical
    #[serde(default = "default_error_rate")]
    pub error_rate_threshold: f64,
    /// Memory usage ratio (0..=1) above which the system is degraded
    #[serde(default = "default_memory_ratio")]
    pub memory_ratio_threshold: f64,
    /// p95 scheduler delay in milliseconds above which the system is degraded
    #[serde(default = "default_delay_threshold")]
    pub scheduler_delay_ms_threshold: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval(),
            error_rate_threshold: default_error_rate(),
            memory_ratio_threshold: default_memory_ratio(),
            scheduler_delay_ms_threshold: default_delay_threshold(),
        }
    }
}

impl HealthConfig {
    /// Validate option ranges
    pub fn validate(&self) -> Result<()> {
        if self.check_interval_secs == 0 {
            return Err(MonitorError::Config(
                "health.check_interval_secs must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("health.error_rate_threshold", self.error_rate_threshold),
            ("health.memory_ratio_threshold", self.memory_ratio_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(MonitorError::Config(format!(
                    "{name} must be within 0.0..=1.0"
                )));
            }
        }
        if self.scheduler_delay_ms_threshold <= 0.0 {
            return Err(MonitorError::Config(
                "health.scheduler_delay_ms_threshold must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_file_prefix() -> String {
    "taskmon".to_string()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_max_files() -> usize {
    5
}

fn default_cleanup_interval() -> u64 {
    3600
}

fn default_sample_interval() -> u64 {
    30
}

fn default_event_capacity() -> usize {
    256
}

fn default_audit_directory() -> PathBuf {
    PathBuf::from("audit")
}

fn default_audit_buffer() -> usize {
    1000
}

fn default_flush_interval() -> u64 {
    30
}

fn default_check_interval() -> u64 {
    30
}

fn default_error_rate() -> f64 {
    0.10
}

fn default_memory_ratio() -> f64 {
    0.85
}

fn default_delay_threshold() -> f64 {
    100.0
}
