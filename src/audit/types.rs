//! Type definitions for audit entries and reports

use crate::fields::Fields;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Caller context attached to an audit event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditContext {
    /// Acting user
    pub user_id: String,
    /// Session identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Caller IP address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Caller user agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Emitting component
    pub source: String,
}

impl Default for AuditContext {
    fn default() -> Self {
        Self {
            user_id: "system".to_string(),
            session_id: None,
            ip: None,
            user_agent: None,
            source: "application".to_string(),
        }
    }
}

impl AuditContext {
    /// Context for a named user
    pub fn for_user(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Default::default()
        }
    }
}

/// One buffered audit event; details are sanitized before construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Event time
    pub timestamp: DateTime<Utc>,
    /// Action name
    pub action: String,
    /// Sanitized structured payload
    #[serde(default, skip_serializing_if = "Fields::is_empty")]
    pub details: Fields,
    /// Caller context
    pub context: AuditContext,
    /// Outcome label, "success" by default
    pub result: String,
    /// Elapsed time for timed actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Persisted audit snapshot document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSnapshot {
    /// Flush time
    pub flush_time: DateTime<Utc>,
    /// Entries flushed in this batch
    pub entries: Vec<AuditEntry>,
}

/// Filter predicates over the in-memory audit buffer
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Match this exact action
    pub action: Option<String>,
    /// Match this user
    pub user_id: Option<String>,
    /// Match this outcome label
    pub result: Option<String>,
    /// Inclusive lower time bound
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper time bound
    pub until: Option<DateTime<Utc>>,
}

impl AuditQuery {
    /// Whether the entry satisfies every configured predicate
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(action) = &self.action {
            if &entry.action != action {
                return false;
            }
        }
        if let Some(user_id) = &self.user_id {
            if &entry.context.user_id != user_id {
                return false;
            }
        }
        if let Some(result) = &self.result {
            if &entry.result != result {
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

/// Risk classification for an audit report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Score below 25
    Low,
    /// Score 25..50
    Medium,
    /// Score 50 and above
    High,
}

impl RiskLevel {
    /// Classify a risk score
    pub fn from_score(score: u32) -> Self {
        if score >= 50 {
            RiskLevel::High
        } else if score >= 25 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Summary section of an audit report
#[derive(Debug, Clone, Serialize)]
pub struct AuditSummary {
    /// Buffered entries covered
    pub total_entries: usize,
    /// Entries by action name
    pub by_action: HashMap<String, usize>,
    /// Entries by acting user
    pub by_user: HashMap<String, usize>,
    /// Entries by outcome label
    pub by_result: HashMap<String, usize>,
    /// Oldest covered entry
    pub earliest: Option<DateTime<Utc>>,
    /// Newest covered entry
    pub latest: Option<DateTime<Utc>>,
}

/// Risk assessment section of an audit report
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    /// Accumulated risk score
    pub score: u32,
    /// Classified level
    pub level: RiskLevel,
    /// Contributing factors
    pub factors: Vec<String>,
}

/// Report over the current audit buffer
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    /// Report generation time
    pub generated_at: DateTime<Utc>,
    /// Volume summary
    pub summary: AuditSummary,
    /// Risk assessment
    pub risk: RiskAssessment,
    /// Suggested operator actions
    pub recommendations: Vec<String>,
}
