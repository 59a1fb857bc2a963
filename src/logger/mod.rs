//! Structured logging with durable, rotating file sinks

mod core;
mod files;
mod types;

#[cfg(test)]
mod tests;

pub use core::{Logger, init_tracing};
pub use types::{
    LogEntry, LogHealth, LogKind, LogLevel, LogOptions, LogQuery, LogReport, LoggerMetrics,
};
