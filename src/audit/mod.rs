//! Audit-event buffering with redaction and snapshot persistence

mod tracker;
mod types;

#[cfg(test)]
mod tests;

pub use tracker::AuditTracker;
pub use types::{
    AuditContext, AuditEntry, AuditQuery, AuditReport, AuditSnapshot, AuditSummary,
    RiskAssessment, RiskLevel,
};
