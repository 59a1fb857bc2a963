//! Sanitization of structured payloads before they are logged or persisted

use crate::fields::{FieldValue, Fields};

/// Marker substituted for secret values
pub const REDACTED: &str = "***REDACTED***";

/// Maximum string length kept in audit details before truncation
pub const MAX_AUDIT_STRING_LEN: usize = 500;

/// Maximum string length kept when logging operation results
pub const MAX_RESULT_STRING_LEN: usize = 100;

const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "token",
    "secret",
    "key",
    "api_key",
    "apikey",
    "private_key",
    "privatekey",
    "credential",
    "auth",
];

const SENSITIVE_SUFFIXES: &[&str] = &["_key", "_token", "_secret", "_password"];

fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_KEYS.contains(&lower.as_str())
        || SENSITIVE_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

/// Truncate a string to `max` characters, appending an ellipsis marker
fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max).collect();
    out.push_str("...");
    out
}

/// Redact secret-looking entries and truncate oversized strings, recursively
///
/// Values under keys that name a secret (password, token, key, ...) are
/// replaced with [`REDACTED`]. Any remaining string longer than
/// [`MAX_AUDIT_STRING_LEN`] characters is truncated with an ellipsis marker.
pub fn redact(fields: &Fields) -> Fields {
    fields
        .iter()
        .map(|(key, value)| {
            let sanitized = if is_sensitive_key(key) {
                FieldValue::Str(REDACTED.to_string())
            } else {
                match value {
                    FieldValue::Str(s) => FieldValue::Str(truncate(s, MAX_AUDIT_STRING_LEN)),
                    FieldValue::Map(inner) => FieldValue::Map(redact(inner)),
                    other => other.clone(),
                }
            };
            (key.clone(), sanitized)
        })
        .collect()
}

/// Replace long string values with a `[N chars]` length marker, recursively
///
/// Used when logging operation results: the payload shape survives but large
/// blobs never reach the log files.
pub fn summarize(fields: &Fields, max_len: usize) -> Fields {
    fields
        .iter()
        .map(|(key, value)| {
            let summarized = match value {
                FieldValue::Str(s) if s.chars().count() > max_len => {
                    FieldValue::Str(format!("[{} chars]", s.chars().count()))
                }
                FieldValue::Map(inner) => FieldValue::Map(summarize(inner, max_len)),
                other => other.clone(),
            };
            (key.clone(), summarized)
        })
        .collect()
}
