//! Audit event buffering, sanitization, and snapshot persistence

use super::types::{
    AuditContext, AuditEntry, AuditQuery, AuditReport, AuditSnapshot, AuditSummary, RiskAssessment,
    RiskLevel,
};
use crate::config::AuditConfig;
use crate::error::Result;
use crate::fields::{FieldValue, Fields};
use crate::logger::Logger;
use crate::sanitize;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error};

/// Audit tracker
///
/// Buffers sanitized audit events, mirrors them into the logger, and flushes
/// them to timestamped JSON snapshots either periodically or synchronously
/// when the buffer reaches capacity. Persistence failures are logged and the
/// affected entries dropped; audit loss is preferred over crashing or
/// unbounded buffer growth.
#[derive(Clone)]
pub struct AuditTracker {
    config: AuditConfig,
    buffer: Arc<Mutex<Vec<AuditEntry>>>,
    logger: Logger,
    /// Guards the periodic flush task
    active: Arc<AtomicBool>,
}

impl AuditTracker {
    /// Create a tracker writing snapshots under `config.directory`
    pub fn new(config: AuditConfig, logger: Logger) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            logger,
            active: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Start the periodic flush task
    pub fn start(&self) {
        if self.active.swap(true, Ordering::AcqRel) {
            return;
        }
        let tracker = self.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(tracker.config.flush_interval_secs));
            // The first tick fires immediately; skip it so a fresh tracker
            // does not flush an empty buffer.
            interval.tick().await;
            loop {
                interval.tick().await;
                if !tracker.active.load(Ordering::Acquire) {
                    break;
                }
                tracker.flush().await;
            }
        });
    }

    /// Record a successful audit event
    pub fn audit(&self, action: &str, details: Fields, context: AuditContext) {
        self.record(action, details, context, "success", None);
    }

    /// Record an audit event with an explicit outcome and duration
    ///
    /// Details are redacted and truncated before they reach the buffer, the
    /// logger, or disk. Reaching the buffer cap triggers a flush whose
    /// buffer detach happens synchronously, before this call returns.
    pub fn record(
        &self,
        action: &str,
        details: Fields,
        context: AuditContext,
        result: &str,
        duration_ms: Option<u64>,
    ) {
        let sanitized = sanitize::redact(&details);
        let entry = AuditEntry {
            timestamp: Utc::now(),
            action: action.to_string(),
            details: sanitized.clone(),
            context: context.clone(),
            result: result.to_string(),
            duration_ms,
        };

        self.logger
            .audit(action, sanitized, context_fields(&context));

        let full = {
            let mut buffer = self.buffer.lock();
            buffer.push(entry);
            if buffer.len() >= self.config.max_buffer_size {
                Some(std::mem::take(&mut *buffer))
            } else {
                None
            }
        };

        if let Some(entries) = full {
            debug!(count = entries.len(), "audit buffer full, flushing");
            let tracker = self.clone();
            tokio::spawn(async move {
                tracker.persist(entries).await;
            });
        }
    }

    /// Flush the current buffer to a snapshot file
    ///
    /// The buffer is snapshot-and-cleared synchronously, before the returned
    /// future does any persistence work; entries recorded during the write
    /// land in the next snapshot.
    pub fn flush(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let entries = std::mem::take(&mut *self.buffer.lock());
        let tracker = self.clone();
        async move { tracker.persist(entries).await }
    }

    /// Entries currently buffered (not yet flushed)
    pub fn buffer_len(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Filter the in-memory buffer
    ///
    /// Flushed history is intentionally out of scope; snapshots on disk are
    /// an export format, not a query index.
    pub fn query(&self, query: &AuditQuery) -> Vec<AuditEntry> {
        self.buffer
            .lock()
            .iter()
            .filter(|entry| query.matches(entry))
            .cloned()
            .collect()
    }

    /// Summarize the buffer and assess its risk profile
    pub fn report(&self) -> AuditReport {
        let entries = self.buffer.lock().clone();

        let mut by_action: HashMap<String, usize> = HashMap::new();
        let mut by_user: HashMap<String, usize> = HashMap::new();
        let mut by_result: HashMap<String, usize> = HashMap::new();
        for entry in &entries {
            *by_action.entry(entry.action.clone()).or_insert(0) += 1;
            *by_user.entry(entry.context.user_id.clone()).or_insert(0) += 1;
            *by_result.entry(entry.result.clone()).or_insert(0) += 1;
        }

        let total = entries.len();
        let mut score = 0u32;
        let mut factors = Vec::new();

        if total > 0 {
            let failures = total - by_result.get("success").copied().unwrap_or(0);
            let failure_rate = failures as f64 / total as f64;
            if failure_rate > 0.10 {
                score += 30;
                factors.push(format!(
                    "failure rate {:.1}% exceeds 10%",
                    failure_rate * 100.0
                ));
            }

            if let Some((action, count)) = by_action.iter().max_by_key(|(_, c)| **c) {
                let share = *count as f64 / total as f64;
                if share > 0.30 {
                    score += 25;
                    factors.push(format!(
                        "action '{}' accounts for {:.1}% of volume",
                        action,
                        share * 100.0
                    ));
                }
            }
        }

        let level = RiskLevel::from_score(score);
        let recommendations = match level {
            RiskLevel::High => vec![
                "Review failing audit actions immediately".to_string(),
                "Check whether a single caller is flooding one action".to_string(),
            ],
            RiskLevel::Medium => vec!["Monitor audit failure and volume trends".to_string()],
            RiskLevel::Low => Vec::new(),
        };

        AuditReport {
            generated_at: Utc::now(),
            summary: AuditSummary {
                total_entries: total,
                by_action,
                by_user,
                by_result,
                earliest: entries.iter().map(|e| e.timestamp).min(),
                latest: entries.iter().map(|e| e.timestamp).max(),
            },
            risk: RiskAssessment {
                score,
                level,
                factors,
            },
            recommendations,
        }
    }

    /// Cancel the periodic flush task and perform one final flush
    pub async fn stop(&self) {
        self.active.store(false, Ordering::Release);
        self.flush().await;
    }

    async fn persist(&self, entries: Vec<AuditEntry>) {
        if entries.is_empty() {
            return;
        }
        let count = entries.len();
        match self.write_snapshot(entries).await {
            Ok(path) => debug!(count, path = %path, "audit snapshot persisted"),
            Err(e) => {
                // Entries are already detached and will not be retried.
                error!(count, "audit snapshot persistence failed: {}", e);
                self.logger.error(
                    "audit snapshot persistence failed",
                    crate::fields! { "count" => count as i64, "error" => e.to_string() },
                );
            }
        }
    }

    async fn write_snapshot(&self, entries: Vec<AuditEntry>) -> Result<String> {
        tokio::fs::create_dir_all(&self.config.directory).await?;

        let snapshot = AuditSnapshot {
            flush_time: Utc::now(),
            entries,
        };
        let millis = Utc::now().timestamp_millis();
        let mut path = self.config.directory.join(format!("audit-{millis}.json"));
        // Two flushes inside the same millisecond must not overwrite each
        // other; tiebreak with a sequence suffix.
        let mut seq = 1;
        while tokio::fs::try_exists(&path).await? {
            path = self
                .config
                .directory
                .join(format!("audit-{millis}-{seq}.json"));
            seq += 1;
        }
        let body = serde_json::to_vec_pretty(&snapshot)?;
        tokio::fs::write(&path, body).await?;
        Ok(path.display().to_string())
    }
}

fn context_fields(context: &AuditContext) -> Fields {
    let mut fields = Fields::new();
    fields.insert(
        "user_id".to_string(),
        FieldValue::Str(context.user_id.clone()),
    );
    fields.insert(
        "source".to_string(),
        FieldValue::Str(context.source.clone()),
    );
    if let Some(session_id) = &context.session_id {
        fields.insert(
            "session_id".to_string(),
            FieldValue::Str(session_id.clone()),
        );
    }
    if let Some(ip) = &context.ip {
        fields.insert("ip".to_string(), FieldValue::Str(ip.clone()));
    }
    if let Some(user_agent) = &context.user_agent {
        fields.insert(
            "user_agent".to_string(),
            FieldValue::Str(user_agent.clone()),
        );
    }
    fields
}
