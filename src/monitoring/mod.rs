//! Monitoring coordinator: health classification, alerts, and periodic
//! process sampling over the shared logger, metrics, and audit components

mod background;
mod sampling;
mod system;
mod types;


pub use system::{
    DEFAULT_ALERT_LIMIT, MAX_ALERT_HISTORY, MonitoringSystem, global, init_global,
};
pub use types::{Alert, AlertSeverity, CurrentMetrics, HealthStatus, MonitorEvent, SystemReport};
