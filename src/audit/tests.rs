//! Behavioral tests for the audit tracker

use super::*;
use crate::config::{AuditConfig, LoggerConfig};
use crate::fields;
use crate::logger::{LogKind, LogLevel, Logger};
use crate::sanitize::REDACTED;
use std::path::Path;
use std::time::Duration;

async fn quiet_logger() -> Logger {
    Logger::new(LoggerConfig {
        console: false,
        file: false,
        ..Default::default()
    })
    .await
    .unwrap()
}

fn config(dir: &Path) -> AuditConfig {
    AuditConfig {
        directory: dir.to_path_buf(),
        ..Default::default()
    }
}

async fn read_snapshots(dir: &Path) -> Vec<AuditSnapshot> {
    let mut snapshots = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await.unwrap();
    while let Some(entry) = entries.next_entry().await.unwrap() {
        let content = tokio::fs::read_to_string(entry.path()).await.unwrap();
        snapshots.push(serde_json::from_str(&content).unwrap());
    }
    snapshots
}

// ==================== Redaction ====================

#[tokio::test]
async fn test_details_redacted_before_buffering() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = AuditTracker::new(config(dir.path()), quiet_logger().await).unwrap();

    tracker.audit(
        "login",
        fields! { "password" => "abc", "nested" => fields! { "token" => "t" } },
        AuditContext::for_user("u1"),
    );

    let buffered = tracker.query(&AuditQuery::default());
    assert_eq!(buffered.len(), 1);
    assert_eq!(
        buffered[0].details.get("password").unwrap().as_str(),
        Some(REDACTED)
    );
    let nested = buffered[0].details.get("nested").unwrap().as_map().unwrap();
    assert_eq!(nested.get("token").unwrap().as_str(), Some(REDACTED));
}

#[tokio::test]
async fn test_redacted_details_reach_persisted_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = AuditTracker::new(config(dir.path()), quiet_logger().await).unwrap();

    tracker.audit(
        "login",
        fields! { "password" => "hunter2", "who" => "u1" },
        AuditContext::default(),
    );
    tracker.flush().await;

    let snapshots = read_snapshots(dir.path()).await;
    assert_eq!(snapshots.len(), 1);
    let entry = &snapshots[0].entries[0];
    assert_eq!(entry.details.get("password").unwrap().as_str(), Some(REDACTED));
    assert_eq!(entry.details.get("who").unwrap().as_str(), Some("u1"));
}

#[tokio::test]
async fn test_mirrored_into_logger_as_audit_entry() {
    let logger = quiet_logger().await;
    let mut rx = logger.subscribe();
    let dir = tempfile::tempdir().unwrap();
    let tracker = AuditTracker::new(config(dir.path()), logger).unwrap();

    tracker.audit("task.delete", fields! { "secret" => "s" }, AuditContext::default());

    let mirrored = rx.recv().await.unwrap();
    assert_eq!(mirrored.kind, LogKind::Audit);
    assert_eq!(mirrored.level, LogLevel::Info);
    assert_eq!(mirrored.message, "task.delete");
    assert_eq!(mirrored.details.get("secret").unwrap().as_str(), Some(REDACTED));
}

// ==================== Flushing ====================

#[tokio::test]
async fn test_buffer_full_flushes_synchronously() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = AuditTracker::new(
        AuditConfig {
            directory: dir.path().to_path_buf(),
            max_buffer_size: 10,
            ..Default::default()
        },
        quiet_logger().await,
    )
    .unwrap();

    for i in 0..10 {
        tracker.audit(&format!("a{}", i), fields! {}, AuditContext::default());
    }

    // The detach happens inside the triggering call, before any await.
    assert_eq!(tracker.buffer_len(), 0);

    // Persistence itself is spawned; give it a moment.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let snapshots = read_snapshots(dir.path()).await;
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].entries.len(), 10);
}

#[tokio::test]
async fn test_flush_empty_buffer_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = AuditTracker::new(config(dir.path()), quiet_logger().await).unwrap();
    tracker.flush().await;
    // Directory may not even exist without entries to persist.
    assert!(read_snapshots_or_empty(dir.path()).await.is_empty());
}

async fn read_snapshots_or_empty(dir: &Path) -> Vec<AuditSnapshot> {
    if tokio::fs::metadata(dir).await.is_err() {
        return Vec::new();
    }
    read_snapshots(dir).await
}

#[tokio::test]
async fn test_entries_recorded_during_flush_survive() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = AuditTracker::new(config(dir.path()), quiet_logger().await).unwrap();

    tracker.audit("first", fields! {}, AuditContext::default());
    let flush = tracker.flush();
    tracker.audit("second", fields! {}, AuditContext::default());
    flush.await;

    // "second" landed after the synchronous detach, so it is still buffered.
    let buffered = tracker.query(&AuditQuery::default());
    assert_eq!(buffered.len(), 1);
    assert_eq!(buffered[0].action, "second");
}

#[tokio::test]
async fn test_rapid_flushes_never_overwrite_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = AuditTracker::new(config(dir.path()), quiet_logger().await).unwrap();

    // Back-to-back flushes land in the same millisecond; the second batch
    // must not replace the first on disk.
    tracker.audit("one", fields! {}, AuditContext::default());
    tracker.flush().await;
    tracker.audit("two", fields! {}, AuditContext::default());
    tracker.flush().await;

    let snapshots = read_snapshots(dir.path()).await;
    assert_eq!(snapshots.len(), 2);
    let total: usize = snapshots.iter().map(|s| s.entries.len()).sum();
    assert_eq!(total, 2);
}

#[tokio::test]
async fn test_stop_performs_final_flush() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = AuditTracker::new(config(dir.path()), quiet_logger().await).unwrap();
    tracker.start();

    tracker.audit("closing", fields! {}, AuditContext::default());
    tracker.stop().await;

    assert_eq!(tracker.buffer_len(), 0);
    let snapshots = read_snapshots(dir.path()).await;
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].entries[0].action, "closing");
}

#[tokio::test]
async fn test_persistence_failure_is_swallowed() {
    let tracker = AuditTracker::new(
        AuditConfig {
            directory: "/proc/definitely/not/writable".into(),
            ..Default::default()
        },
        quiet_logger().await,
    )
    .unwrap();

    tracker.audit("x", fields! {}, AuditContext::default());
    // Must not panic or surface the error; entries are dropped.
    tracker.flush().await;
    assert_eq!(tracker.buffer_len(), 0);
}

// ==================== Queries and reports ====================

#[tokio::test]
async fn test_query_filters_buffer_only() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = AuditTracker::new(config(dir.path()), quiet_logger().await).unwrap();

    tracker.audit("task.create", fields! {}, AuditContext::for_user("u1"));
    tracker.audit("task.delete", fields! {}, AuditContext::for_user("u2"));
    tracker.flush().await;
    tracker.audit("task.create", fields! {}, AuditContext::for_user("u1"));

    // Flushed history is not queryable; only the post-flush entry matches.
    let results = tracker.query(&AuditQuery {
        action: Some("task.create".to_string()),
        ..Default::default()
    });
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_report_low_risk() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = AuditTracker::new(config(dir.path()), quiet_logger().await).unwrap();

    for i in 0..10 {
        tracker.audit(&format!("action{}", i % 5), fields! {}, AuditContext::default());
    }

    let report = tracker.report();
    assert_eq!(report.summary.total_entries, 10);
    assert_eq!(report.risk.level, RiskLevel::Low);
    assert!(report.recommendations.is_empty());
}

#[tokio::test]
async fn test_report_high_risk_on_failures_and_concentration() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = AuditTracker::new(config(dir.path()), quiet_logger().await).unwrap();

    // 40% failures, all on the same action: both risk factors fire.
    for i in 0..10 {
        let result = if i < 4 { "failure" } else { "success" };
        tracker.record("login", fields! {}, AuditContext::default(), result, None);
    }

    let report = tracker.report();
    assert_eq!(report.risk.score, 55);
    assert_eq!(report.risk.level, RiskLevel::High);
    assert_eq!(report.risk.factors.len(), 2);
    assert!(!report.recommendations.is_empty());
}

#[tokio::test]
async fn test_report_medium_risk_on_concentration_alone() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = AuditTracker::new(config(dir.path()), quiet_logger().await).unwrap();

    for _ in 0..8 {
        tracker.audit("hot.action", fields! {}, AuditContext::default());
    }
    for i in 0..2 {
        tracker.audit(&format!("cold{}", i), fields! {}, AuditContext::default());
    }

    let report = tracker.report();
    assert_eq!(report.risk.score, 25);
    assert_eq!(report.risk.level, RiskLevel::Medium);
}

#[tokio::test]
async fn test_report_tracks_users_and_time_range() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = AuditTracker::new(config(dir.path()), quiet_logger().await).unwrap();

    tracker.audit("a", fields! {}, AuditContext::for_user("alice"));
    tracker.audit("b", fields! {}, AuditContext::for_user("bob"));

    let report = tracker.report();
    assert_eq!(report.summary.by_user.len(), 2);
    assert!(report.summary.earliest.is_some());
    assert!(report.summary.earliest <= report.summary.latest);
}
