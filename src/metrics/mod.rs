//! Metrics engine: counters, gauges, sliding-window histograms, named timers

mod registry;
mod types;


pub use registry::MetricsRegistry;
pub use types::{
    GaugePoint, HistogramSample, HistogramStats, MAX_HISTOGRAM_SAMPLES, MetricsSnapshot, metric_key,
};
