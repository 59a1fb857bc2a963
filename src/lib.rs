//! # taskmon
//!
//! Embeddable observability pipeline: structured logging with rotating file
//! sinks, an in-memory metrics engine, buffered audit trails with automatic
//! redaction, and a monitoring coordinator that classifies system health and
//! raises alerts.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use taskmon::config::ObservabilityConfig;
//! use taskmon::monitoring::MonitoringSystem;
//! use taskmon::{fields, audit::AuditContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let system = MonitoringSystem::new(ObservabilityConfig::default()).await?;
//!     system.start();
//!
//!     system.logger().info("service ready", fields! { "port" => 8080 });
//!
//!     let op = system.start_operation("sync_users", fields! {});
//!     // ... do the work ...
//!     system.end_operation(&op, true, fields! { "rows" => 42 });
//!
//!     system.audit(
//!         "user.login",
//!         fields! { "method" => "oauth" },
//!         AuditContext::for_user("alice"),
//!     );
//!
//!     system.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Components
//!
//! - [`logger`]: leveled, kinded structured logging to console and rotating
//!   JSON-line files, with querying over persisted entries
//! - [`metrics`]: counters, gauges, capped histograms with nearest-rank
//!   percentiles, and named timers
//! - [`audit`]: buffered audit trail with sensitive-key redaction and
//!   timestamped JSON snapshots
//! - [`monitoring`]: the coordinator tying them together with periodic
//!   sampling, health classification, and alerting
//!
//! Every component takes its dependencies explicitly; nothing requires a
//! process-wide singleton.

pub mod audit;
pub mod config;
pub mod error;
pub mod events;
pub mod fields;
pub mod logger;
pub mod metrics;
pub mod monitoring;
pub mod sanitize;

pub use audit::{AuditContext, AuditTracker};
pub use config::ObservabilityConfig;
pub use error::{MonitorError, Result};
pub use fields::{FieldValue, Fields};
pub use logger::{LogKind, LogLevel, Logger, init_tracing};
pub use metrics::MetricsRegistry;
pub use monitoring::{HealthStatus, MonitoringSystem};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
