//! Type definitions for structured log entries, queries, and reports

use crate::error::{MonitorError, Result};
use crate::fields::Fields;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Log severity, ordinal 0-4 (lower is more severe)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Unrecoverable or unexpected failures
    Error = 0,
    /// Degraded but recoverable conditions
    Warn = 1,
    /// Routine operational events
    #[default]
    Info = 2,
    /// Developer diagnostics
    Debug = 3,
    /// High-volume tracing
    Trace = 4,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Trace => write!(f, "TRACE"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "ERROR" => Ok(LogLevel::Error),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "INFO" => Ok(LogLevel::Info),
            "DEBUG" => Ok(LogLevel::Debug),
            "TRACE" => Ok(LogLevel::Trace),
            _ => Err(MonitorError::Parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Event family a log entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    /// Internal system events
    #[default]
    System,
    /// User-initiated actions
    User,
    /// Security-relevant events
    Security,
    /// Audit trail entries
    Audit,
    /// Timing and throughput entries
    Performance,
    /// Domain-level business events
    Business,
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogKind::System => "system",
            LogKind::User => "user",
            LogKind::Security => "security",
            LogKind::Audit => "audit",
            LogKind::Performance => "performance",
            LogKind::Business => "business",
        };
        write!(f, "{}", s)
    }
}

/// Optional per-entry attributes supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Structured event payload
    pub details: Fields,
    /// Ambient request/session context
    pub context: Fields,
    /// Free-form metadata
    pub metadata: Fields,
    /// Acting user (defaults to "system")
    pub user_id: Option<String>,
    /// Session identifier
    pub session_id: Option<String>,
    /// Request identifier
    pub request_id: Option<String>,
    /// Elapsed time for timed entries
    pub duration_ms: Option<u64>,
    /// Error description, when the entry records a failure
    pub error: Option<String>,
    /// Captured stack trace
    pub stack_trace: Option<String>,
    /// Emitting component (defaults to "application")
    pub source: Option<String>,
}

/// Immutable structured record of one log event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Event timestamp
    pub timestamp: DateTime<Utc>,
    /// Severity
    pub level: LogLevel,
    /// Event family
    pub kind: LogKind,
    /// Free-form category within the family
    pub category: String,
    /// Human-readable message
    pub message: String,
    /// Structured event payload
    #[serde(default, skip_serializing_if = "Fields::is_empty")]
    pub details: Fields,
    /// Ambient request/session context
    #[serde(default, skip_serializing_if = "Fields::is_empty")]
    pub context: Fields,
    /// Acting user
    pub user_id: String,
    /// Session identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Request identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Elapsed time for timed entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Error description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Captured stack trace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    /// Emitting component
    pub source: String,
    /// Free-form metadata
    #[serde(default, skip_serializing_if = "Fields::is_empty")]
    pub metadata: Fields,
}

impl LogEntry {
    /// Build an entry from caller options, applying the documented defaults
    pub fn new(
        level: LogLevel,
        kind: LogKind,
        category: &str,
        message: &str,
        options: LogOptions,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            kind,
            category: category.to_string(),
            message: message.to_string(),
            details: options.details,
            context: options.context,
            user_id: options.user_id.unwrap_or_else(|| "system".to_string()),
            session_id: options.session_id,
            request_id: options.request_id,
            duration_ms: options.duration_ms,
            error: options.error,
            stack_trace: options.stack_trace,
            source: options.source.unwrap_or_else(|| "application".to_string()),
            metadata: options.metadata,
        }
    }

    /// Render as one JSON line
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Render as one human-readable line
    pub fn to_readable(&self) -> String {
        let mut line = format!(
            "[{}] [{}] [{}/{}] {}",
            self.timestamp.to_rfc3339(),
            self.level,
            self.kind,
            self.category,
            self.message
        );
        if !self.details.is_empty() {
            if let Ok(details) = serde_json::to_string(&self.details) {
                line.push_str(" | details=");
                line.push_str(&details);
            }
        }
        if let Some(error) = &self.error {
            line.push_str(" | error=");
            line.push_str(error);
        }
        if let Some(duration) = self.duration_ms {
            line.push_str(&format!(" | duration_ms={}", duration));
        }
        line
    }
}

/// Cumulative counters maintained by the logger
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoggerMetrics {
    /// Entries accepted past the level filter
    pub total_logs: u64,
    /// Accepted entries by level label
    pub logs_by_level: HashMap<String, u64>,
    /// Accepted entries by kind label
    pub logs_by_kind: HashMap<String, u64>,
    /// Accepted error entries
    pub errors: u64,
    /// Accepted warning entries
    pub warnings: u64,
}

impl LoggerMetrics {
    /// Errors as a fraction of accepted entries
    pub fn error_rate(&self) -> f64 {
        if self.total_logs == 0 {
            0.0
        } else {
            self.errors as f64 / self.total_logs as f64
        }
    }

    /// Warnings as a fraction of accepted entries
    pub fn warning_rate(&self) -> f64 {
        if self.total_logs == 0 {
            0.0
        } else {
            self.warnings as f64 / self.total_logs as f64
        }
    }
}

/// Filter predicates for historical log queries
#[derive(Debug, Clone)]
pub struct LogQuery {
    /// Match this exact level
    pub level: Option<LogLevel>,
    /// Match this kind
    pub kind: Option<LogKind>,
    /// Match this exact category
    pub category: Option<String>,
    /// Match this user
    pub user_id: Option<String>,
    /// Match this session
    pub session_id: Option<String>,
    /// Substring match on the message
    pub message_contains: Option<String>,
    /// Inclusive lower time bound
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper time bound
    pub until: Option<DateTime<Utc>>,
    /// Stop after this many matches
    pub limit: usize,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            level: None,
            kind: None,
            category: None,
            user_id: None,
            session_id: None,
            message_contains: None,
            since: None,
            until: None,
            limit: 1000,
        }
    }
}

impl LogQuery {
    /// Whether the entry satisfies every configured predicate
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(level) = self.level {
            if entry.level != level {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if entry.kind != kind {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &entry.category != category {
                return false;
            }
        }
        if let Some(user_id) = &self.user_id {
            if &entry.user_id != user_id {
                return false;
            }
        }
        if let Some(session_id) = &self.session_id {
            if entry.session_id.as_deref() != Some(session_id.as_str()) {
                return false;
            }
        }
        if let Some(needle) = &self.message_contains {
            if !entry.message.contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if entry.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if entry.timestamp > until {
                return false;
            }
        }
        true
    }
}

/// Health assessment derived from the logger's cumulative metrics
#[derive(Debug, Clone, Serialize)]
pub struct LogHealth {
    /// 0-100, higher is healthier
    pub score: u32,
    /// healthy / warning / critical label
    pub status: String,
    /// Human-readable threshold breaches
    pub issues: Vec<String>,
}

/// Snapshot report over the logger's state
#[derive(Debug, Clone, Serialize)]
pub struct LogReport {
    /// Report generation time
    pub generated_at: DateTime<Utc>,
    /// Cumulative counters
    pub metrics: LoggerMetrics,
    /// Scored health assessment
    pub health: LogHealth,
    /// Suggested operator actions
    pub recommendations: Vec<String>,
    /// Active threshold breaches
    pub alerts: Vec<String>,
}
