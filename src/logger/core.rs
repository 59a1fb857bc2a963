//! Structured logger with console and rotating-file sinks

use super::files;
use super::types::{
    LogEntry, LogHealth, LogKind, LogLevel, LogOptions, LogQuery, LogReport, LoggerMetrics,
};
use crate::config::LoggerConfig;
use crate::error::{MonitorError, Result};
use crate::events::EventBus;
use crate::fields::Fields;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, error, info, trace, warn};

/// Capacity of each log-subscriber channel
const SUBSCRIBER_CAPACITY: usize = 256;

/// Install the global console subscriber backing the logger's console sink
///
/// `RUST_LOG` takes precedence over `level`; `structured` switches the
/// console to JSON output. Fails if a global subscriber is already
/// installed, so hosts that configure their own tracing can skip this.
pub fn init_tracing(level: LogLevel, structured: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string().to_lowercase()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let result = if structured {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| MonitorError::Config(format!("tracing init failed: {e}")))
}

/// Structured logger
///
/// Cheap to clone; all clones share the same queue, sinks, and counters.
/// The file sink requires a tokio runtime. Entries are written strictly in
/// arrival order by a single drain task; a failed write re-queues the entry
/// at the head and the next accepted log call resumes the drain.
#[derive(Clone)]
pub struct Logger {
    config: LoggerConfig,
    /// Cleared when the log directory cannot be created (console-only mode)
    file_enabled: Arc<AtomicBool>,
    /// Reassigned only by the drain task, on rotation
    current_file: Arc<RwLock<PathBuf>>,
    queue: Arc<Mutex<VecDeque<LogEntry>>>,
    /// Single-writer claim for the drain task
    writing: Arc<AtomicBool>,
    /// Signalled whenever the drain task goes idle
    drained: Arc<Notify>,
    /// Guards the periodic cleanup task
    active: Arc<AtomicBool>,
    metrics: Arc<RwLock<LoggerMetrics>>,
    subscribers: Arc<EventBus<LogEntry>>,
}

impl Logger {
    /// Create a logger, initializing its log directory
    ///
    /// A directory that cannot be created degrades the logger to console-only
    /// operation instead of failing construction.
    pub async fn new(config: LoggerConfig) -> Result<Self> {
        config.validate()?;

        let mut file_enabled = config.file;
        if file_enabled {
            if let Err(e) = tokio::fs::create_dir_all(&config.directory).await {
                error!(
                    directory = %config.directory.display(),
                    "log directory unavailable, falling back to console only: {}", e
                );
                file_enabled = false;
            }
        }

        let current_file = config
            .directory
            .join(files::rotation_file_name(&config.file_prefix, Utc::now()));

        Ok(Self {
            config,
            file_enabled: Arc::new(AtomicBool::new(file_enabled)),
            current_file: Arc::new(RwLock::new(current_file)),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            writing: Arc::new(AtomicBool::new(false)),
            drained: Arc::new(Notify::new()),
            active: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(RwLock::new(LoggerMetrics::default())),
            subscribers: Arc::new(EventBus::new(SUBSCRIBER_CAPACITY)),
        })
    }

    /// Start the periodic retention cleanup task
    pub fn start(&self) {
        if self.active.swap(true, Ordering::AcqRel) {
            return;
        }
        if !self.file_enabled.load(Ordering::Acquire) {
            return;
        }

        let logger = self.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(logger.config.cleanup_interval_secs));
            loop {
                interval.tick().await;
                if !logger.active.load(Ordering::Acquire) {
                    break;
                }
                if let Err(e) = files::cleanup_old_files(
                    &logger.config.directory,
                    &logger.config.file_prefix,
                    logger.config.max_files,
                )
                .await
                {
                    warn!("log retention cleanup failed: {}", e);
                }
            }
        });
    }

    /// Record one log event
    ///
    /// Entries less severe than the configured threshold are dropped before
    /// any state changes. Sink failures never reach the caller.
    pub fn log(
        &self,
        level: LogLevel,
        kind: LogKind,
        category: &str,
        message: &str,
        options: LogOptions,
    ) {
        if level > self.config.level {
            return;
        }

        let entry = LogEntry::new(level, kind, category, message, options);

        {
            let mut metrics = self.metrics.write();
            metrics.total_logs += 1;
            *metrics
                .logs_by_level
                .entry(entry.level.to_string())
                .or_insert(0) += 1;
            *metrics
                .logs_by_kind
                .entry(entry.kind.to_string())
                .or_insert(0) += 1;
            match entry.level {
                LogLevel::Error => metrics.errors += 1,
                LogLevel::Warn => metrics.warnings += 1,
                _ => {}
            }
        }

        self.subscribers.publish(&entry);

        if self.config.console {
            self.emit_console(&entry);
        }

        if self.config.file && self.file_enabled.load(Ordering::Acquire) {
            self.enqueue(entry);
        }
    }

    /// Subscribe to the stream of accepted entries
    pub fn subscribe(&self) -> mpsc::Receiver<LogEntry> {
        self.subscribers.subscribe()
    }

    /// Snapshot of the cumulative counters
    pub fn metrics(&self) -> LoggerMetrics {
        self.metrics.read().clone()
    }

    /// Path the drain task is currently appending to
    pub fn current_file(&self) -> PathBuf {
        self.current_file.read().clone()
    }

    // Level helpers fixing level/kind/category

    /// Log an error-level system entry
    pub fn error(&self, message: &str, details: Fields) {
        self.log(
            LogLevel::Error,
            LogKind::System,
            "error",
            message,
            LogOptions {
                details,
                ..Default::default()
            },
        );
    }

    /// Log a warn-level system entry
    pub fn warn(&self, message: &str, details: Fields) {
        self.log(
            LogLevel::Warn,
            LogKind::System,
            "warning",
            message,
            LogOptions {
                details,
                ..Default::default()
            },
        );
    }

    /// Log an info-level system entry
    pub fn info(&self, message: &str, details: Fields) {
        self.log(
            LogLevel::Info,
            LogKind::System,
            "general",
            message,
            LogOptions {
                details,
                ..Default::default()
            },
        );
    }

    /// Log a debug-level system entry
    pub fn debug(&self, message: &str, details: Fields) {
        self.log(
            LogLevel::Debug,
            LogKind::System,
            "debug",
            message,
            LogOptions {
                details,
                ..Default::default()
            },
        );
    }

    /// Log a trace-level system entry
    pub fn trace(&self, message: &str, details: Fields) {
        self.log(
            LogLevel::Trace,
            LogKind::System,
            "trace",
            message,
            LogOptions {
                details,
                ..Default::default()
            },
        );
    }

    /// Log an audit entry mirrored from the audit tracker
    pub fn audit(&self, message: &str, details: Fields, context: Fields) {
        self.log(
            LogLevel::Info,
            LogKind::Audit,
            "audit",
            message,
            LogOptions {
                details,
                context,
                ..Default::default()
            },
        );
    }

    /// Log a security event
    pub fn security(&self, message: &str, details: Fields) {
        self.log(
            LogLevel::Warn,
            LogKind::Security,
            "security",
            message,
            LogOptions {
                details,
                ..Default::default()
            },
        );
    }

    /// Log a timed performance entry
    pub fn performance(&self, message: &str, duration_ms: u64, details: Fields) {
        self.log(
            LogLevel::Info,
            LogKind::Performance,
            "performance",
            message,
            LogOptions {
                details,
                duration_ms: Some(duration_ms),
                ..Default::default()
            },
        );
    }

    /// Log a business event
    pub fn business(&self, message: &str, details: Fields) {
        self.log(
            LogLevel::Info,
            LogKind::Business,
            "business",
            message,
            LogOptions {
                details,
                ..Default::default()
            },
        );
    }

    /// Scan log files newest-first for entries matching the query
    ///
    /// Corrupt lines are skipped; the scan stops at `query.limit` matches.
    pub async fn query(&self, query: LogQuery) -> Result<Vec<LogEntry>> {
        let mut matches = Vec::new();
        let log_files =
            files::list_log_files(&self.config.directory, &self.config.file_prefix).await?;

        'files: for (path, _) in log_files {
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %path.display(), "skipping unreadable log file: {}", e);
                    continue;
                }
            };
            for line in content.lines().rev() {
                let Some(entry) = files::parse_line(line, self.config.structured) else {
                    continue;
                };
                if query.matches(&entry) {
                    matches.push(entry);
                    if matches.len() >= query.limit {
                        break 'files;
                    }
                }
            }
        }

        Ok(matches)
    }

    /// Build a health-scored report over the cumulative counters
    pub fn report(&self) -> LogReport {
        let metrics = self.metrics();
        let error_rate = metrics.error_rate();
        let warning_rate = metrics.warning_rate();

        let mut score: u32 = 100;
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        if error_rate > 0.10 {
            score -= 50;
            issues.push(format!("error rate {:.1}% exceeds 10%", error_rate * 100.0));
            recommendations
                .push("Investigate recent error entries; failure rate is critical".to_string());
        } else if error_rate > 0.05 {
            score -= 25;
            issues.push(format!("error rate {:.1}% exceeds 5%", error_rate * 100.0));
            recommendations.push("Review error trends before they become critical".to_string());
        }

        if warning_rate > 0.20 {
            score -= 10;
            issues.push(format!(
                "warning rate {:.1}% exceeds 20%",
                warning_rate * 100.0
            ));
            recommendations.push("Reduce recurring warning conditions".to_string());
        }

        let status = if error_rate > 0.10 {
            "critical"
        } else if error_rate > 0.05 || warning_rate > 0.20 {
            "warning"
        } else {
            "healthy"
        };

        LogReport {
            generated_at: Utc::now(),
            metrics,
            health: LogHealth {
                score,
                status: status.to_string(),
                issues: issues.clone(),
            },
            recommendations,
            alerts: issues,
        }
    }

    /// Drain pending writes and release resources
    ///
    /// Stops the cleanup task, waits until the write queue is empty and the
    /// drain task idle, then closes subscriber channels.
    pub async fn close(&self) {
        self.active.store(false, Ordering::Release);

        loop {
            let notified = self.drained.notified();
            if !self.writing.load(Ordering::Acquire) && self.queue.lock().is_empty() {
                break;
            }
            notified.await;
        }

        self.subscribers.clear();
    }

    fn emit_console(&self, entry: &LogEntry) {
        match entry.level {
            LogLevel::Error => error!(
                kind = %entry.kind,
                category = %entry.category,
                user_id = %entry.user_id,
                "{}",
                entry.message
            ),
            LogLevel::Warn => warn!(
                kind = %entry.kind,
                category = %entry.category,
                user_id = %entry.user_id,
                "{}",
                entry.message
            ),
            LogLevel::Info => info!(
                kind = %entry.kind,
                category = %entry.category,
                user_id = %entry.user_id,
                "{}",
                entry.message
            ),
            LogLevel::Debug => debug!(
                kind = %entry.kind,
                category = %entry.category,
                user_id = %entry.user_id,
                "{}",
                entry.message
            ),
            LogLevel::Trace => trace!(
                kind = %entry.kind,
                category = %entry.category,
                user_id = %entry.user_id,
                "{}",
                entry.message
            ),
        }
    }

    fn enqueue(&self, entry: LogEntry) {
        self.queue.lock().push_back(entry);
        if self
            .writing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let logger = self.clone();
            tokio::spawn(async move {
                logger.drain().await;
            });
        }
    }

    /// Single-writer drain loop: strictly FIFO, one entry per write
    async fn drain(&self) {
        loop {
            let next = self.queue.lock().pop_front();
            match next {
                Some(entry) => {
                    if let Err(e) = self.write_entry(&entry).await {
                        error!("log file write failed, will retry on next log call: {}", e);
                        // Head re-queue keeps at-least-once delivery and FIFO
                        // order without a tight retry spin.
                        self.queue.lock().push_front(entry);
                        self.writing.store(false, Ordering::Release);
                        self.drained.notify_waiters();
                        return;
                    }
                }
                None => {
                    self.writing.store(false, Ordering::Release);
                    self.drained.notify_waiters();
                    // A producer may have enqueued between the empty pop and
                    // the flag release; pick that work up instead of leaving
                    // it for the next log call.
                    if !self.queue.lock().is_empty()
                        && self
                            .writing
                            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                            .is_ok()
                    {
                        continue;
                    }
                    return;
                }
            }
        }
    }

    async fn write_entry(&self, entry: &LogEntry) -> Result<()> {
        let mut path = self.current_file.read().clone();

        // Rotation: over-limit files are left in place and a fresh
        // timestamped name takes over for subsequent writes.
        if let Ok(meta) = tokio::fs::metadata(&path).await {
            if meta.len() >= self.config.max_file_size {
                let next = self
                    .config
                    .directory
                    .join(files::rotation_file_name(&self.config.file_prefix, Utc::now()));
                if next != path {
                    debug!(from = %path.display(), to = %next.display(), "rotating log file");
                    *self.current_file.write() = next.clone();
                    path = next;
                }
            }
        }

        let line = if self.config.structured {
            entry.to_json_line()?
        } else {
            entry.to_readable()
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        Ok(())
    }
}
