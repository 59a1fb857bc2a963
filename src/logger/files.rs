//! Log file naming, retention, and line parsing

use super::types::{LogEntry, LogKind, LogLevel, LogOptions};
use crate::error::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

static READABLE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[([^\]]+)\] \[([A-Z]+)\] \[([a-z]+)/([^\]]+)\] (.*)$")
        .expect("readable line pattern is valid")
});

/// Build a timestamped rotation filename, e.g. `taskmon-2026-08-29-14-03-59.log`
pub(super) fn rotation_file_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}.log", prefix, at.format(FILE_TIMESTAMP_FORMAT))
}

/// Parse the timestamp embedded in a rotation filename
///
/// Names that do not carry a parseable timestamp return `None` and are never
/// considered for deletion.
pub(super) fn parse_file_timestamp(prefix: &str, name: &str) -> Option<DateTime<Utc>> {
    let stem = name
        .strip_prefix(prefix)?
        .strip_prefix('-')?
        .strip_suffix(".log")?;
    NaiveDateTime::parse_from_str(stem, FILE_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// List rotated log files for `prefix`, newest first
pub(super) async fn list_log_files(
    dir: &Path,
    prefix: &str,
) -> Result<Vec<(PathBuf, DateTime<Utc>)>> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(timestamp) = parse_file_timestamp(prefix, name) {
            files.push((entry.path(), timestamp));
        }
    }
    files.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(files)
}

/// Delete rotated files beyond the `max_files` newest
pub(super) async fn cleanup_old_files(dir: &Path, prefix: &str, max_files: usize) -> Result<usize> {
    let files = list_log_files(dir, prefix).await?;
    let mut removed = 0;
    for (path, _) in files.iter().skip(max_files) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "removed expired log file");
                removed += 1;
            }
            Err(e) => warn!(path = %path.display(), "failed to remove log file: {}", e),
        }
    }
    Ok(removed)
}

/// Parse one persisted line back into an entry; corrupt lines yield `None`
pub(super) fn parse_line(line: &str, structured: bool) -> Option<LogEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if structured {
        serde_json::from_str(line).ok()
    } else {
        parse_readable_line(line)
    }
}

fn parse_kind(s: &str) -> Option<LogKind> {
    match s {
        "system" => Some(LogKind::System),
        "user" => Some(LogKind::User),
        "security" => Some(LogKind::Security),
        "audit" => Some(LogKind::Audit),
        "performance" => Some(LogKind::Performance),
        "business" => Some(LogKind::Business),
        _ => None,
    }
}

/// Parse a human-readable line; the key=value tail beyond the message is
/// dropped, only the header fields are recovered
fn parse_readable_line(line: &str) -> Option<LogEntry> {
    let caps = READABLE_LINE.captures(line)?;
    let timestamp = DateTime::parse_from_rfc3339(caps.get(1)?.as_str())
        .ok()?
        .with_timezone(&Utc);
    let level: LogLevel = caps.get(2)?.as_str().parse().ok()?;
    let kind = parse_kind(caps.get(3)?.as_str())?;
    let category = caps.get(4)?.as_str();
    let rest = caps.get(5)?.as_str();
    let message = rest.split(" | ").next().unwrap_or(rest);

    let mut entry = LogEntry::new(level, kind, category, message, LogOptions::default());
    entry.timestamp = timestamp;
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rotation_file_name() {
        let at = Utc.with_ymd_and_hms(2026, 8, 29, 14, 3, 59).unwrap();
        assert_eq!(
            rotation_file_name("taskmon", at),
            "taskmon-2026-08-29-14-03-59.log"
        );
    }

    #[test]
    fn test_parse_file_timestamp_roundtrip() {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let name = rotation_file_name("app", at);
        assert_eq!(parse_file_timestamp("app", &name), Some(at));
    }

    #[test]
    fn test_parse_file_timestamp_rejects_foreign_names() {
        assert!(parse_file_timestamp("app", "other-2025-01-02-03-04-05.log").is_none());
        assert!(parse_file_timestamp("app", "app-notes.log").is_none());
        assert!(parse_file_timestamp("app", "app-2025-99-99-00-00-00.log").is_none());
    }

    #[test]
    fn test_parse_structured_line() {
        let entry = LogEntry::new(
            LogLevel::Info,
            LogKind::User,
            "tasks",
            "created",
            LogOptions::default(),
        );
        let line = entry.to_json_line().unwrap();
        let parsed = parse_line(&line, true).unwrap();
        assert_eq!(parsed.message, "created");
        assert_eq!(parsed.kind, LogKind::User);
    }

    #[test]
    fn test_parse_corrupt_line_skipped() {
        assert!(parse_line("{not json", true).is_none());
        assert!(parse_line("garbage without brackets", false).is_none());
        assert!(parse_line("", true).is_none());
    }

    #[test]
    fn test_parse_readable_line() {
        let entry = LogEntry::new(
            LogLevel::Warn,
            LogKind::Performance,
            "query",
            "slow lookup",
            LogOptions {
                duration_ms: Some(42),
                ..Default::default()
            },
        );
        let parsed = parse_line(&entry.to_readable(), false).unwrap();
        assert_eq!(parsed.level, LogLevel::Warn);
        assert_eq!(parsed.kind, LogKind::Performance);
        assert_eq!(parsed.category, "query");
        assert_eq!(parsed.message, "slow lookup");
        assert_eq!(parsed.timestamp, entry.timestamp);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_newest_and_unparseable() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        for i in 0..4 {
            let name = rotation_file_name("app", base + chrono::Duration::minutes(i));
            tokio::fs::write(dir.path().join(name), "x").await.unwrap();
        }
        tokio::fs::write(dir.path().join("app-keep.log"), "x")
            .await
            .unwrap();

        let removed = cleanup_old_files(dir.path(), "app", 2).await.unwrap();
        assert_eq!(removed, 2);

        let remaining = list_log_files(dir.path(), "app").await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert_eq!(
            remaining[0].1,
            base + chrono::Duration::minutes(3),
            "newest file survives"
        );
        assert!(
            dir.path().join("app-keep.log").exists(),
            "unparseable names are never deleted"
        );
    }
}
