//! Type definitions for the metrics engine

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Maximum samples retained per histogram series (FIFO eviction)
pub const MAX_HISTOGRAM_SAMPLES: usize = 1000;

/// Canonical series key: `name` or `name{k1=v1,k2=v2}` with tag keys sorted
///
/// Tag insertion order never affects the key.
pub fn metric_key(name: &str, tags: &[(&str, &str)]) -> String {
    if tags.is_empty() {
        return name.to_string();
    }
    let mut sorted: Vec<&(&str, &str)> = tags.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);
    let rendered: Vec<String> = sorted.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{}{{{}}}", name, rendered.join(","))
}

/// Last-observed gauge value with its observation time
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaugePoint {
    /// Observed value
    pub value: f64,
    /// Observation time
    pub timestamp: DateTime<Utc>,
}

/// One histogram observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramSample {
    /// Observed value
    pub value: f64,
    /// Observation time
    pub timestamp: DateTime<Utc>,
}

/// Distribution statistics over one histogram window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramStats {
    /// Samples in the window
    pub count: usize,
    /// Sum of sample values
    pub sum: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Nearest-rank median
    pub median: f64,
    /// Minimum sample
    pub min: f64,
    /// Maximum sample
    pub max: f64,
    /// Nearest-rank 95th percentile
    pub p95: f64,
    /// Nearest-rank 99th percentile
    pub p99: f64,
}

impl HistogramStats {
    /// Compute stats over a sample window
    ///
    /// Percentiles use nearest-rank on a value-sorted copy with
    /// `index = min(floor(count * p), count - 1)` and no interpolation;
    /// deterministic but discontinuous at small sample counts.
    pub fn from_samples(samples: &[HistogramSample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut values: Vec<f64> = samples.iter().map(|s| s.value).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let count = values.len();
        let sum: f64 = values.iter().sum();

        Some(Self {
            count,
            sum,
            mean: sum / count as f64,
            median: nearest_rank(&values, 0.5),
            min: values[0],
            max: values[count - 1],
            p95: nearest_rank(&values, 0.95),
            p99: nearest_rank(&values, 0.99),
        })
    }
}

/// Nearest-rank percentile over ascending-sorted values
fn nearest_rank(sorted: &[f64], percentile: f64) -> f64 {
    let index = (sorted.len() as f64 * percentile).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Point-in-time copy of every metric series
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Snapshot time
    pub timestamp: DateTime<Utc>,
    /// Milliseconds since registry construction or last reset
    pub uptime_ms: u64,
    /// Counter values by canonical key
    pub counters: HashMap<String, u64>,
    /// Gauge values by canonical key
    pub gauges: HashMap<String, GaugePoint>,
    /// Histogram statistics by canonical key
    pub histograms: HashMap<String, HistogramStats>,
}

impl MetricsSnapshot {
    /// Statistics for one histogram series, if it has samples
    pub fn histogram(&self, key: &str) -> Option<&HistogramStats> {
        self.histograms.get(key)
    }

    /// Counter value, zero when absent
    pub fn counter(&self, key: &str) -> u64 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    /// Latest gauge value, if observed
    pub fn gauge(&self, key: &str) -> Option<f64> {
        self.gauges.get(key).map(|g| g.value)
    }
}
